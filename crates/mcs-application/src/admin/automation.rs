//! Index lifecycle automation
//!
//! Idempotent create/update/rebuild, embedding backfill with a resumable
//! cursor, schema and embedding validation, and aged-document cleanup.
//! Re-executing any operation with identical inputs converges to the same
//! state without error.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{info, warn};

use mcs_domain::error::{Error, Result};
use mcs_domain::ports::{
    DocumentAction, DocumentBatch, EmbeddingProvider, SearchRequest, SearchServiceClient,
};
use mcs_domain::value_objects::IndexSchema;

/// Fields every code index must declare
const REQUIRED_FIELDS: &[&str] = &[
    "id",
    "repository",
    "file_path",
    "language",
    "start_line",
    "end_line",
    "content",
    "last_modified",
];

/// Page size used when streaming documents by id cursor
const SCAN_PAGE: usize = 500;

/// Outcome of `ensure_index`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnsureReport {
    /// The index was created by this call
    pub created: bool,
    /// The index existed and was updated by this call
    pub updated: bool,
    /// The live schema differed but updating was not requested
    pub differs: bool,
}

/// Outcome of `recreate_index`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecreateReport {
    /// Documents exported before the drop, when backup was requested
    pub backed_up: Option<usize>,
    /// Where the backup landed
    pub backup_path: Option<String>,
}

/// Outcome of `validate_index_schema`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaValidationReport {
    /// Whether the index exists at all
    pub exists: bool,
    /// Required fields absent from the live schema
    pub missing_fields: Vec<String>,
    /// Whether a vector field with a profile is declared
    pub has_vector_config: bool,
    /// Whether a semantic configuration is declared
    pub has_semantic_config: bool,
    /// Names of declared scoring profiles
    pub scoring_profiles: Vec<String>,
    /// Overall verdict
    pub valid: bool,
}

/// Outcome of `backfill_embeddings`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackfillReport {
    /// Documents examined
    pub scanned: usize,
    /// Documents that received a vector
    pub updated: usize,
    /// Documents whose embedding or merge failed
    pub failed: usize,
    /// Resume cursor: last processed document id
    pub cursor: Option<String>,
    /// Whether the scan reached the end of the index
    pub complete: bool,
    /// Whether this was a dry run (no merges issued)
    pub dry_run: bool,
}

/// Outcome of `validate_embeddings`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingValidationReport {
    /// Documents sampled
    pub sampled: usize,
    /// Sampled documents carrying a vector
    pub with_vector: usize,
    /// Sampled documents whose vector has the expected dimension
    pub valid_dimension: usize,
    /// `with_vector / sampled`
    pub coverage: f64,
}

/// Outcome of `cleanup_old_documents` and `clear_repository_documents`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupReport {
    /// Documents matching the filter
    pub matched: usize,
    /// Documents actually deleted
    pub deleted: usize,
    /// Whether this was a dry run
    pub dry_run: bool,
}

/// Index lifecycle automation service
pub struct IndexAutomation {
    client: Arc<dyn SearchServiceClient>,
    embedder: Arc<dyn EmbeddingProvider>,
    backup_dir: PathBuf,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl IndexAutomation {
    /// Create the automation service
    pub fn new(
        client: Arc<dyn SearchServiceClient>,
        embedder: Arc<dyn EmbeddingProvider>,
        backup_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            embedder,
            backup_dir: backup_dir.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Per-index mutation lock; schema updates never race uploads
    async fn lock_for(&self, index: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        Arc::clone(locks.entry(index.to_string()).or_default())
    }

    /// Create the index if absent; update when present and different
    pub async fn ensure_index(
        &self,
        schema: &IndexSchema,
        update_if_different: bool,
    ) -> Result<EnsureReport> {
        let lock = self.lock_for(&schema.name).await;
        let _guard = lock.lock().await;

        match self.client.get_index(&schema.name).await {
            Ok(existing) => {
                if existing.matches(schema) {
                    Ok(EnsureReport {
                        created: false,
                        updated: false,
                        differs: false,
                    })
                } else if update_if_different {
                    self.client.create_or_update_index(schema).await?;
                    info!(index = %schema.name, "index schema updated");
                    Ok(EnsureReport {
                        created: false,
                        updated: true,
                        differs: true,
                    })
                } else {
                    Ok(EnsureReport {
                        created: false,
                        updated: false,
                        differs: true,
                    })
                }
            }
            Err(Error::NotFound { .. }) => {
                self.client.create_or_update_index(schema).await?;
                info!(index = %schema.name, "index created");
                Ok(EnsureReport {
                    created: true,
                    updated: false,
                    differs: false,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Drop and recreate the index, optionally exporting documents first
    pub async fn recreate_index(
        &self,
        schema: &IndexSchema,
        backup: bool,
    ) -> Result<RecreateReport> {
        let lock = self.lock_for(&schema.name).await;
        let _guard = lock.lock().await;

        let mut report = RecreateReport {
            backed_up: None,
            backup_path: None,
        };

        let exists = match self.client.get_index(&schema.name).await {
            Ok(_) => true,
            Err(Error::NotFound { .. }) => false,
            Err(e) => return Err(e),
        };

        if backup && exists {
            let (count, path) = self.export_documents(&schema.name).await?;
            report.backed_up = Some(count);
            report.backup_path = Some(path);
        }

        if exists {
            self.client.delete_index(&schema.name).await?;
        }
        self.client.create_or_update_index(schema).await?;
        info!(index = %schema.name, backed_up = ?report.backed_up, "index recreated");
        Ok(report)
    }

    /// Export every document to a JSON-lines staging file
    async fn export_documents(&self, index: &str) -> Result<(usize, String)> {
        tokio::fs::create_dir_all(&self.backup_dir)
            .await
            .map_err(|e| Error::io_with_source("creating backup directory", e))?;
        let path = self
            .backup_dir
            .join(format!("{index}-{}.jsonl", Utc::now().format("%Y%m%dT%H%M%SZ")));

        let mut lines = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self.scan_page(index, cursor.as_deref(), None).await?;
            if page.is_empty() {
                break;
            }
            cursor = page
                .last()
                .and_then(|d| d.get("id"))
                .and_then(Value::as_str)
                .map(str::to_string);
            for document in &page {
                lines.push(serde_json::to_string(document)?);
            }
            if page.len() < SCAN_PAGE {
                break;
            }
        }

        let count = lines.len();
        tokio::fs::write(&path, lines.join("\n"))
            .await
            .map_err(|e| Error::io_with_source("writing backup file", e))?;
        Ok((count, path.display().to_string()))
    }

    /// One id-ordered page of documents after `cursor`
    async fn scan_page(
        &self,
        index: &str,
        cursor: Option<&str>,
        extra_filter: Option<&str>,
    ) -> Result<Vec<Value>> {
        let cursor_clause = cursor.map(|c| format!("id gt '{}'", c.replace('\'', "''")));
        let filter = match (cursor_clause, extra_filter) {
            (Some(c), Some(f)) => Some(format!("{f} and {c}")),
            (Some(c), None) => Some(c),
            (None, Some(f)) => Some(f.to_string()),
            (None, None) => None,
        };
        let request = SearchRequest {
            search_text: None,
            filter,
            top: SCAN_PAGE,
            skip: 0,
            orderby: Some("id asc".to_string()),
            include_total_count: false,
            ..SearchRequest::default()
        };
        let results = self.client.search(index, &request).await?;
        Ok(results.hits.into_iter().map(|h| h.document).collect())
    }

    /// Check required fields, vector and semantic configuration presence
    pub async fn validate_index_schema(
        &self,
        name: &str,
        expected: Option<&IndexSchema>,
    ) -> Result<SchemaValidationReport> {
        let live = match self.client.get_index(name).await {
            Ok(schema) => schema,
            Err(Error::NotFound { .. }) => {
                return Ok(SchemaValidationReport {
                    exists: false,
                    missing_fields: REQUIRED_FIELDS.iter().map(|f| f.to_string()).collect(),
                    has_vector_config: false,
                    has_semantic_config: false,
                    scoring_profiles: Vec::new(),
                    valid: false,
                });
            }
            Err(e) => return Err(e),
        };

        let required: Vec<String> = match expected {
            Some(schema) => schema.fields.iter().map(|f| f.name.clone()).collect(),
            None => REQUIRED_FIELDS.iter().map(|f| f.to_string()).collect(),
        };
        let missing_fields: Vec<String> = required
            .into_iter()
            .filter(|f| live.field(f).is_none())
            .collect();

        let has_vector_config = live.vector_field().is_some();
        let has_semantic_config = !live.semantic_configurations.is_empty();
        let report = SchemaValidationReport {
            valid: missing_fields.is_empty(),
            exists: true,
            missing_fields,
            has_vector_config,
            has_semantic_config,
            scoring_profiles: live.scoring_profiles.iter().map(|p| p.name.clone()).collect(),
        };
        Ok(report)
    }

    /// Stream documents lacking a vector and merge embeddings in batches.
    ///
    /// Resumable: pass the returned `cursor` to continue a partial run.
    /// Already-updated documents stay valid when a later batch fails.
    pub async fn backfill_embeddings(
        &self,
        index: &str,
        batch_size: usize,
        include_context: bool,
        max_docs: Option<usize>,
        dry_run: bool,
        cursor: Option<String>,
    ) -> Result<BackfillReport> {
        let lock = self.lock_for(index).await;
        let _guard = lock.lock().await;

        let batch_size = batch_size.clamp(1, 256);
        let mut report = BackfillReport {
            scanned: 0,
            updated: 0,
            failed: 0,
            cursor,
            complete: false,
            dry_run,
        };

        loop {
            if max_docs.is_some_and(|m| report.scanned >= m) {
                return Ok(report);
            }
            let page = self.scan_page(index, report.cursor.as_deref(), None).await?;
            if page.is_empty() {
                report.complete = true;
                return Ok(report);
            }
            let exhausted = page.len() < SCAN_PAGE;
            report.cursor = page
                .last()
                .and_then(|d| d.get("id"))
                .and_then(Value::as_str)
                .map(str::to_string);

            let missing: Vec<&Value> = page
                .iter()
                .filter(|d| {
                    d.get("content_vector")
                        .map_or(true, |v| v.is_null() || v.as_array().is_none_or(Vec::is_empty))
                })
                .collect();
            report.scanned += page.len();

            for chunk in missing.chunks(batch_size) {
                if dry_run {
                    report.updated += chunk.len();
                    continue;
                }
                let texts: Vec<String> = chunk
                    .iter()
                    .map(|d| embedding_text(d, include_context))
                    .collect();
                let embeddings = self.embedder.embed_batch(&texts).await?;
                if embeddings.is_empty() {
                    // Provider disabled: nothing more can be done here.
                    return Err(Error::dependency("embedding", "embedding provider disabled"));
                }

                let mut updates = Vec::new();
                for (document, embedding) in chunk.iter().zip(embeddings) {
                    match embedding {
                        Some(embedding) => {
                            if let Some(id) = document.get("id").and_then(Value::as_str) {
                                updates.push(serde_json::json!({
                                    "id": id,
                                    "content_vector": embedding.vector,
                                }));
                            }
                        }
                        None => report.failed += 1,
                    }
                }
                if !updates.is_empty() {
                    let batch = DocumentBatch {
                        actions: updates
                            .into_iter()
                            .map(|u| (DocumentAction::Merge, u))
                            .collect(),
                    };
                    let result = self.client.index_documents(index, &batch).await?;
                    report.updated += result.succeeded;
                    report.failed += result.failed;
                }
            }

            if exhausted {
                report.complete = true;
                return Ok(report);
            }
        }
    }

    /// Sample documents and assert vector presence and dimensionality
    pub async fn validate_embeddings(
        &self,
        index: &str,
        sample_size: usize,
        expected_dim: usize,
    ) -> Result<EmbeddingValidationReport> {
        let request = SearchRequest {
            search_text: None,
            top: sample_size.clamp(1, 1000),
            skip: 0,
            include_total_count: false,
            ..SearchRequest::default()
        };
        let results = self.client.search(index, &request).await?;

        let mut with_vector = 0;
        let mut valid_dimension = 0;
        let sampled = results.hits.len();
        for hit in &results.hits {
            if let Some(vector) = hit.document.get("content_vector").and_then(Value::as_array) {
                if !vector.is_empty() {
                    with_vector += 1;
                    if vector.len() == expected_dim {
                        valid_dimension += 1;
                    }
                }
            }
        }

        Ok(EmbeddingValidationReport {
            sampled,
            with_vector,
            valid_dimension,
            coverage: if sampled == 0 {
                0.0
            } else {
                with_vector as f64 / sampled as f64
            },
        })
    }

    /// Delete documents older than `days_old` on a date field
    pub async fn cleanup_old_documents(
        &self,
        index: &str,
        date_field: &str,
        days_old: u32,
        dry_run: bool,
    ) -> Result<CleanupReport> {
        if !date_field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::validation_field("date_field", "not a field name"));
        }
        let cutoff = Utc::now() - chrono::Duration::days(days_old as i64);
        let filter = format!("{date_field} lt {}", cutoff.to_rfc3339());
        self.delete_by_filter(index, &filter, dry_run).await
    }

    /// Delete every document of one repository
    pub async fn clear_repository_documents(
        &self,
        index: &str,
        repository: &str,
        dry_run: bool,
    ) -> Result<CleanupReport> {
        let filter = format!("repository eq '{}'", repository.replace('\'', "''"));
        self.delete_by_filter(index, &filter, dry_run).await
    }

    async fn delete_by_filter(
        &self,
        index: &str,
        filter: &str,
        dry_run: bool,
    ) -> Result<CleanupReport> {
        let lock = self.lock_for(index).await;
        let _guard = lock.lock().await;

        let mut report = CleanupReport {
            matched: 0,
            deleted: 0,
            dry_run,
        };
        let mut cursor: Option<String> = None;
        loop {
            let page = self.scan_page(index, cursor.as_deref(), Some(filter)).await?;
            if page.is_empty() {
                break;
            }
            let exhausted = page.len() < SCAN_PAGE;
            cursor = page
                .last()
                .and_then(|d| d.get("id"))
                .and_then(Value::as_str)
                .map(str::to_string);
            let keys: Vec<String> = page
                .iter()
                .filter_map(|d| d.get("id").and_then(Value::as_str))
                .map(str::to_string)
                .collect();
            report.matched += keys.len();

            if !dry_run && !keys.is_empty() {
                match self.client.delete_documents(index, &keys).await {
                    Ok(result) => report.deleted += result.succeeded,
                    Err(e) => {
                        warn!(error = %e, "delete batch failed");
                    }
                }
            }
            if exhausted {
                break;
            }
        }
        Ok(report)
    }

    /// Write the live schema to a timestamped JSON file
    pub async fn backup_index_schema(&self, index: &str) -> Result<String> {
        let schema = self.client.get_index(index).await?;
        tokio::fs::create_dir_all(&self.backup_dir)
            .await
            .map_err(|e| Error::io_with_source("creating backup directory", e))?;
        let path = self
            .backup_dir
            .join(format!("{index}-schema-{}.json", Utc::now().format("%Y%m%dT%H%M%SZ")));
        tokio::fs::write(&path, serde_json::to_string_pretty(&schema)?)
            .await
            .map_err(|e| Error::io_with_source("writing schema backup", e))?;
        Ok(path.display().to_string())
    }
}

/// Text embedded for one document; optionally prefixed with repository and
/// path so the vector carries location context
fn embedding_text(document: &Value, include_context: bool) -> String {
    let content = document
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if include_context {
        let repository = document
            .get("repository")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let file_path = document
            .get("file_path")
            .and_then(Value::as_str)
            .unwrap_or_default();
        format!("{repository} {file_path}\n{content}")
    } else {
        content.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_text_prefixes_context_when_asked() {
        let doc = serde_json::json!({
            "repository": "backend",
            "file_path": "src/auth.rs",
            "content": "fn verify() {}",
        });
        assert_eq!(embedding_text(&doc, false), "fn verify() {}");
        assert_eq!(
            embedding_text(&doc, true),
            "backend src/auth.rs\nfn verify() {}"
        );
    }

}
