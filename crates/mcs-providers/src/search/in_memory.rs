//! In-memory search service
//!
//! A self-contained implementation of the search client port for local
//! development and tests: token-overlap lexical scoring, cosine vector
//! scoring and a small subset of the filter DSL (`field eq 'value'`,
//! `id gt 'value'`, `field lt <timestamp>`, `search.ismatch(...)` clauses
//! joined with `and`).

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use mcs_domain::error::{Error, Result};
use mcs_domain::ports::{
    BatchResult, DataSource, DocumentAction, DocumentBatch, IndexStats, IndexerRunState,
    IndexerStatus, SearchHit, SearchRequest, SearchResults, SearchServiceClient, Skillset,
};
use mcs_domain::value_objects::IndexSchema;

#[derive(Default)]
struct StoredIndex {
    schema: IndexSchema,
    documents: HashMap<String, Value>,
}

/// In-memory implementation of the search service contract
#[derive(Default)]
pub struct InMemorySearchService {
    indexes: RwLock<HashMap<String, StoredIndex>>,
    datasources: RwLock<HashMap<String, DataSource>>,
    skillsets: RwLock<HashMap<String, Skillset>>,
    indexers: RwLock<HashMap<String, IndexerStatus>>,
}

impl InMemorySearchService {
    /// Create an empty service
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in an index (tests and dev diagnostics)
    pub async fn document_count(&self, index: &str) -> usize {
        self.indexes
            .read()
            .await
            .get(index)
            .map_or(0, |i| i.documents.len())
    }

    fn score_lexical(query: &str, document: &Value) -> f64 {
        let haystack = ["content", "function_name", "class_name", "docstring", "file_path"]
            .iter()
            .filter_map(|f| document.get(*f).and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        query
            .to_lowercase()
            .split_whitespace()
            .filter(|token| haystack.contains(token))
            .count() as f64
    }

    fn cosine(a: &[f32], b: &[f32]) -> f64 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            0.0
        } else {
            (dot / (norm_a * norm_b)) as f64
        }
    }

    /// Evaluate the supported filter subset against a document
    fn matches_filter(filter: &str, document: &Value) -> bool {
        filter.split(" and ").all(|clause| {
            let clause = clause.trim();
            if let Some(rest) = clause.strip_prefix("search.ismatch(") {
                // search.ismatch('"term"', 'fields')
                let term = rest
                    .split('\'')
                    .nth(1)
                    .unwrap_or_default()
                    .trim_matches('"')
                    .to_lowercase();
                let content = document
                    .get("content")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_lowercase();
                let function = document
                    .get("function_name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_lowercase();
                return content.contains(&term) || function.contains(&term);
            }
            let mut parts = clause.splitn(3, ' ');
            let (Some(field), Some(op), Some(raw)) = (parts.next(), parts.next(), parts.next())
            else {
                return true;
            };
            let literal = raw.trim().trim_matches('\'').replace("''", "'");
            let actual = document.get(field);
            match op {
                "eq" => actual.and_then(Value::as_str) == Some(literal.as_str()),
                "gt" => actual
                    .and_then(Value::as_str)
                    .is_some_and(|v| v > literal.as_str()),
                "lt" => actual
                    .and_then(Value::as_str)
                    .is_some_and(|v| v < literal.as_str()),
                _ => true,
            }
        })
    }
}

#[async_trait]
impl SearchServiceClient for InMemorySearchService {
    async fn list_indexes(&self) -> Result<Vec<IndexSchema>> {
        Ok(self
            .indexes
            .read()
            .await
            .values()
            .map(|i| i.schema.clone())
            .collect())
    }

    async fn get_index(&self, name: &str) -> Result<IndexSchema> {
        self.indexes
            .read()
            .await
            .get(name)
            .map(|i| i.schema.clone())
            .ok_or_else(|| Error::not_found(format!("index {name}")))
    }

    async fn create_or_update_index(&self, schema: &IndexSchema) -> Result<()> {
        let mut indexes = self.indexes.write().await;
        let entry = indexes.entry(schema.name.clone()).or_default();
        entry.schema = schema.clone();
        Ok(())
    }

    async fn delete_index(&self, name: &str) -> Result<()> {
        self.indexes
            .write()
            .await
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("index {name}")))
    }

    async fn get_index_stats(&self, name: &str) -> Result<IndexStats> {
        let indexes = self.indexes.read().await;
        let index = indexes
            .get(name)
            .ok_or_else(|| Error::not_found(format!("index {name}")))?;
        let storage: usize = index
            .documents
            .values()
            .map(|d| d.to_string().len())
            .sum();
        Ok(IndexStats {
            document_count: index.documents.len() as u64,
            storage_size_bytes: storage as u64,
        })
    }

    async fn search(&self, index: &str, request: &SearchRequest) -> Result<SearchResults> {
        let indexes = self.indexes.read().await;
        let stored = indexes
            .get(index)
            .ok_or_else(|| Error::not_found(format!("index {index}")))?;

        let mut scored: Vec<(f64, &Value)> = stored
            .documents
            .values()
            .filter(|doc| {
                request
                    .filter
                    .as_deref()
                    .map_or(true, |f| Self::matches_filter(f, doc))
            })
            .filter_map(|doc| {
                let score = match (&request.search_text, &request.vector) {
                    (_, Some(vector_query)) => {
                        let stored_vector: Vec<f32> = doc
                            .get("content_vector")?
                            .as_array()?
                            .iter()
                            .filter_map(|v| v.as_f64().map(|f| f as f32))
                            .collect();
                        Self::cosine(&vector_query.vector, &stored_vector)
                    }
                    (Some(text), None) => {
                        let score = Self::score_lexical(text, doc);
                        if score == 0.0 {
                            return None;
                        }
                        score
                    }
                    (None, None) => 1.0,
                };
                Some((score, doc))
            })
            .collect();

        if request.orderby.as_deref() == Some("id asc") {
            scored.sort_by(|a, b| {
                let id = |d: &Value| {
                    d.get("id")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string()
                };
                id(a.1).cmp(&id(b.1))
            });
        } else {
            scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        }

        let total = scored.len() as u64;
        let hits: Vec<SearchHit> = scored
            .into_iter()
            .skip(request.skip)
            .take(request.top)
            .map(|(score, doc)| SearchHit {
                document: doc.clone(),
                score,
                reranker_score: request.semantic_configuration.as_ref().map(|_| score * 1.1),
                highlights: HashMap::new(),
                captions: Vec::new(),
            })
            .collect();

        Ok(SearchResults {
            hits,
            total: request.include_total_count.then_some(total),
        })
    }

    async fn index_documents(&self, index: &str, batch: &DocumentBatch) -> Result<BatchResult> {
        let mut indexes = self.indexes.write().await;
        let stored = indexes
            .get_mut(index)
            .ok_or_else(|| Error::not_found(format!("index {index}")))?;

        let mut result = BatchResult::default();
        for (action, document) in &batch.actions {
            let Some(id) = document.get("id").and_then(Value::as_str).map(str::to_string) else {
                result.failed += 1;
                result.errors.push("?: missing id".to_string());
                continue;
            };
            match action {
                DocumentAction::Delete => {
                    stored.documents.remove(&id);
                    result.succeeded += 1;
                }
                DocumentAction::Upload => {
                    stored.documents.insert(id, document.clone());
                    result.succeeded += 1;
                }
                DocumentAction::Merge | DocumentAction::MergeOrUpload => {
                    match stored.documents.get_mut(&id) {
                        Some(existing) => {
                            if let (Some(target), Some(source)) =
                                (existing.as_object_mut(), document.as_object())
                            {
                                for (key, value) in source {
                                    target.insert(key.clone(), value.clone());
                                }
                            }
                            result.succeeded += 1;
                        }
                        None if *action == DocumentAction::MergeOrUpload => {
                            stored.documents.insert(id, document.clone());
                            result.succeeded += 1;
                        }
                        None => {
                            result.failed += 1;
                            result.errors.push(format!("{id}: not found for merge"));
                        }
                    }
                }
            }
        }
        Ok(result)
    }

    async fn delete_documents(&self, index: &str, keys: &[String]) -> Result<BatchResult> {
        let mut indexes = self.indexes.write().await;
        let stored = indexes
            .get_mut(index)
            .ok_or_else(|| Error::not_found(format!("index {index}")))?;
        let mut result = BatchResult::default();
        for key in keys {
            if stored.documents.remove(key).is_some() {
                result.succeeded += 1;
            } else {
                result.failed += 1;
            }
        }
        Ok(result)
    }

    async fn list_indexers(&self) -> Result<Vec<String>> {
        Ok(self.indexers.read().await.keys().cloned().collect())
    }

    async fn get_indexer_status(&self, name: &str) -> Result<IndexerStatus> {
        self.indexers
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("indexer {name}")))
    }

    async fn run_indexer(&self, name: &str) -> Result<()> {
        let mut indexers = self.indexers.write().await;
        let status = indexers
            .get_mut(name)
            .ok_or_else(|| Error::not_found(format!("indexer {name}")))?;
        status.state = IndexerRunState::Success;
        Ok(())
    }

    async fn reset_indexer(&self, name: &str) -> Result<()> {
        let mut indexers = self.indexers.write().await;
        let status = indexers
            .get_mut(name)
            .ok_or_else(|| Error::not_found(format!("indexer {name}")))?;
        status.state = IndexerRunState::Idle;
        Ok(())
    }

    async fn create_or_update_indexer(&self, definition: &Value) -> Result<()> {
        let name = definition
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::validation_field("name", "indexer definition needs a name"))?;
        self.indexers.write().await.insert(
            name.to_string(),
            IndexerStatus {
                name: name.to_string(),
                state: IndexerRunState::Idle,
                last_run_start: None,
                items_processed: 0,
                items_failed: 0,
                error_message: None,
            },
        );
        Ok(())
    }

    async fn delete_indexer(&self, name: &str) -> Result<()> {
        self.indexers
            .write()
            .await
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("indexer {name}")))
    }

    async fn create_or_update_datasource(&self, datasource: &DataSource) -> Result<()> {
        self.datasources
            .write()
            .await
            .insert(datasource.name.clone(), datasource.clone());
        Ok(())
    }

    async fn get_datasource(&self, name: &str) -> Result<DataSource> {
        self.datasources
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("datasource {name}")))
    }

    async fn create_or_update_skillset(&self, skillset: &Skillset) -> Result<()> {
        self.skillsets
            .write()
            .await
            .insert(skillset.name.clone(), skillset.clone());
        Ok(())
    }

    fn provider_name(&self) -> &str {
        "in_memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(name: &str) -> IndexSchema {
        IndexSchema {
            name: name.to_string(),
            fields: Vec::new(),
            vector_search: None,
            semantic_configurations: Vec::new(),
            scoring_profiles: Vec::new(),
        }
    }

    fn doc(id: &str, repository: &str, content: &str) -> Value {
        json!({
            "id": id,
            "repository": repository,
            "file_path": format!("src/{id}.rs"),
            "language": "rust",
            "start_line": 1,
            "end_line": 10,
            "content": content,
        })
    }

    async fn seeded() -> InMemorySearchService {
        let service = InMemorySearchService::new();
        service.create_or_update_index(&schema("idx")).await.unwrap();
        let batch = DocumentBatch::upload(vec![
            doc("a", "repo1", "fn authenticate(user) performs auth"),
            doc("b", "repo1", "fn connect_pool() database pool"),
            doc("c", "repo2", "fn render_page() template engine"),
        ]);
        service.index_documents("idx", &batch).await.unwrap();
        service
    }

    #[tokio::test]
    async fn lexical_search_matches_and_counts() {
        let service = seeded().await;
        let request = SearchRequest {
            search_text: Some("auth".to_string()),
            top: 10,
            include_total_count: true,
            ..SearchRequest::default()
        };
        let results = service.search("idx", &request).await.unwrap();
        assert_eq!(results.total, Some(1));
        assert_eq!(results.hits[0].document["id"], "a");
    }

    #[tokio::test]
    async fn eq_filters_restrict_results() {
        let service = seeded().await;
        let request = SearchRequest {
            search_text: Some("fn".to_string()),
            filter: Some("repository eq 'repo1'".to_string()),
            top: 10,
            include_total_count: true,
            ..SearchRequest::default()
        };
        let results = service.search("idx", &request).await.unwrap();
        assert_eq!(results.total, Some(2));
    }

    #[tokio::test]
    async fn ismatch_clauses_check_content() {
        let service = seeded().await;
        let request = SearchRequest {
            search_text: Some("fn".to_string()),
            filter: Some("search.ismatch('\"pool\"', 'content,function_name,class_name')".to_string()),
            top: 10,
            include_total_count: true,
            ..SearchRequest::default()
        };
        let results = service.search("idx", &request).await.unwrap();
        assert_eq!(results.total, Some(1));
        assert_eq!(results.hits[0].document["id"], "b");
    }

    #[tokio::test]
    async fn merge_or_upload_round_trips() {
        let service = seeded().await;
        let merge = DocumentBatch {
            actions: vec![(
                DocumentAction::Merge,
                json!({"id": "a", "content_vector": [0.1, 0.2]}),
            )],
        };
        let result = service.index_documents("idx", &merge).await.unwrap();
        assert_eq!(result.succeeded, 1);

        let request = SearchRequest {
            search_text: Some("auth".to_string()),
            top: 10,
            ..SearchRequest::default()
        };
        let results = service.search("idx", &request).await.unwrap();
        assert!(results.hits[0].document["content_vector"].is_array());
        // Merge kept the original fields.
        assert_eq!(results.hits[0].document["repository"], "repo1");
    }

    #[tokio::test]
    async fn datasource_round_trip() {
        let service = InMemorySearchService::new();
        let ds = DataSource {
            name: "github".to_string(),
            source_type: "git".to_string(),
            connection_string: "https://github.example/org".to_string(),
            container: "main".to_string(),
            description: None,
        };
        service.create_or_update_datasource(&ds).await.unwrap();
        assert_eq!(service.get_datasource("github").await.unwrap(), ds);
    }

    #[tokio::test]
    async fn missing_index_is_not_found() {
        let service = InMemorySearchService::new();
        let err = service.get_index("nope").await.unwrap_err();
        assert_eq!(err.code().as_str(), "not_found");
    }
}
