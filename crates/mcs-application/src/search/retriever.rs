//! Hybrid retriever
//!
//! Orchestrates one search request: cache lookup, parallel BM25 / vector /
//! semantic sub-queries, reciprocal-rank fusion, de-duplication, contextual
//! re-ranking and pagination.
//!
//! Failure semantics: the vector and semantic stages downgrade silently
//! (`backend: "basic"`, `semantic_used: false`); a BM25 failure fails the
//! request. Partial results are returned only when BM25 succeeded.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::time::timeout;
use tracing::{debug, warn};
use uuid::Uuid;

use mcs_domain::constants::RRF_K;
use mcs_domain::error::{Error, Result};
use mcs_domain::ports::{
    CacheProvider, EmbeddingProvider, SearchHit, SearchRequest, SearchServiceClient, VectorQuery,
};
use mcs_domain::value_objects::{
    RankedResult, RankingFactor, SearchBackend, SearchPage, SearchQuery, SearchTimings,
};

use crate::query::validation::sanitize_html;
use crate::query::ShapedQuery;

use super::ranker::ContextualRanker;

/// Caller-supplied context for ranking boosts and cache control
#[derive(Debug, Clone, Default)]
pub struct SearchContext {
    /// File the caller is editing, when known
    pub current_file: Option<String>,
    /// Workspace root of the caller, when known
    pub workspace_root: Option<String>,
    /// Imports of the current file, for neighbour boosts
    pub current_imports: Vec<String>,
    /// Bypass the result cache for this request
    pub disable_cache: bool,
}

/// Retriever wiring and tuning
#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    /// Index searched by every sub-query
    pub index_name: String,
    /// Vector field for k-NN sub-queries
    pub vector_field: String,
    /// Semantic configuration name; `None` disables the semantic stage
    pub semantic_configuration: Option<String>,
    /// Per-request deadline
    pub timeout: Duration,
    /// Whether pages are memoized in the cache
    pub cache_enabled: bool,
    /// Emit per-stage timing logs
    pub debug_timings: bool,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            index_name: "code-index".to_string(),
            vector_field: "content_vector".to_string(),
            semantic_configuration: None,
            timeout: Duration::from_secs(30),
            cache_enabled: true,
            debug_timings: false,
        }
    }
}

/// Hybrid BM25 + vector + semantic retriever
pub struct HybridRetriever {
    client: Arc<dyn SearchServiceClient>,
    embedder: Arc<dyn EmbeddingProvider>,
    cache: Arc<dyn CacheProvider>,
    ranker: ContextualRanker,
    config: RetrieverConfig,
}

impl HybridRetriever {
    /// Create a retriever
    pub fn new(
        client: Arc<dyn SearchServiceClient>,
        embedder: Arc<dyn EmbeddingProvider>,
        cache: Arc<dyn CacheProvider>,
        ranker: ContextualRanker,
        config: RetrieverConfig,
    ) -> Self {
        Self {
            client,
            embedder,
            cache,
            ranker,
            config,
        }
    }

    /// Execute one search request
    pub async fn search(
        &self,
        query: &SearchQuery,
        shaped: &ShapedQuery,
        context: &SearchContext,
    ) -> Result<SearchPage> {
        let query = query.clone().clamp_limits();
        let started = Instant::now();

        let cache_key = self.cache_key(&query, shaped);
        if self.config.cache_enabled && !context.disable_cache {
            if let Ok(Some(value)) = self.cache.get(&cache_key).await {
                if let Ok(mut page) = serde_json::from_value::<SearchPage>(value) {
                    page.from_cache = true;
                    debug!(key = %cache_key, "search cache hit");
                    return Ok(page);
                }
            }
        }

        // Fetch enough depth to fuse, dedupe and still fill the page.
        let fetch_depth = query.skip + query.max_results;
        let run_vector = !query.bm25_only && self.embedder.is_enabled();
        let run_semantic = !query.bm25_only && self.config.semantic_configuration.is_some();

        let bm25_fut = self.bm25_query(&query, shaped, fetch_depth);
        let vector_fut = self.vector_query(shaped, fetch_depth, run_vector);
        let semantic_fut = self.semantic_query(&query, shaped, fetch_depth, run_semantic);

        let deadline = self.config.timeout;
        let (bm25, vector, semantic) = tokio::join!(
            timeout(deadline, bm25_fut),
            timeout(deadline, vector_fut),
            timeout(deadline, semantic_fut),
        );

        let mut timings = SearchTimings::default();

        // BM25 is the backbone: its failure is the request's failure.
        let (bm25_hits, total, bm25_ms) = match bm25 {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(Error::timeout("search.bm25", deadline.as_millis() as u64));
            }
        };
        timings.bm25_ms = bm25_ms;

        let (vector_hits, vector_ms) = match vector {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                warn!(error = %e, "vector stage degraded to BM25-only");
                (None, 0)
            }
            Err(_) => {
                warn!("vector stage timed out; degraded to BM25-only");
                (None, 0)
            }
        };
        timings.vector_ms = vector_ms;

        let (semantic_hits, semantic_ms) = match semantic {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                debug!(error = %e, "semantic stage unavailable");
                (None, 0)
            }
            Err(_) => (None, 0),
        };
        timings.semantic_ms = semantic_ms;

        let vector_used = vector_hits.is_some();
        let semantic_used = semantic_hits.is_some();
        let query_id = Uuid::new_v4().to_string();

        let ranking_started = Instant::now();
        let fused = Self::fuse(
            [
                ("bm25", Some(bm25_hits)),
                ("vector", vector_hits),
                ("semantic", semantic_hits),
            ],
            &query_id,
        );

        let mut results = Self::dedupe(fused);
        self.ranker.rank(&mut results, shaped, context);
        Self::sort_results(&mut results);
        let fused_count = results.len() as u64;

        // Pagination over the fused, ranked stream.
        let items: Vec<RankedResult> = results
            .into_iter()
            .skip(query.skip)
            .take(query.max_results)
            .enumerate()
            .map(|(i, mut r)| {
                r.rank = i + 1;
                r
            })
            .collect();
        timings.ranking_ms = ranking_started.elapsed().as_millis() as u64;
        timings.total_ms = started.elapsed().as_millis() as u64;

        if self.config.debug_timings {
            debug!(?timings, query = %shaped.text, "search stage timings");
        }

        let backend = if vector_used || semantic_used {
            SearchBackend::Enhanced
        } else {
            SearchBackend::Basic
        };

        let page = SearchPage {
            items,
            total: total.unwrap_or(fused_count).max(fused_count),
            query_id,
            backend,
            semantic_used,
            applied_exact_terms: shaped.applies_exact_terms(),
            exact_terms: shaped.exact_terms.clone(),
            from_cache: false,
            timings,
        };

        if self.config.cache_enabled && !context.disable_cache {
            if let Ok(value) = serde_json::to_value(&page) {
                let _ = self.cache.set(&cache_key, value).await;
            }
        }
        Ok(page)
    }

    /// Cache key: hash of normalized text, filter and paging options under
    /// the `search:` scope
    fn cache_key(&self, query: &SearchQuery, shaped: &ShapedQuery) -> String {
        let mut hasher = Sha256::new();
        hasher.update(shaped.text.to_lowercase().as_bytes());
        hasher.update(b"|");
        hasher.update(shaped.filter.as_deref().unwrap_or("").as_bytes());
        hasher.update(b"|");
        hasher.update(
            format!(
                "{}:{}:{}:{}:{}",
                query.max_results,
                query.skip,
                query.orderby.as_deref().unwrap_or(""),
                query.bm25_only,
                self.config.index_name,
            )
            .as_bytes(),
        );
        format!("search:{}", hex::encode(&hasher.finalize()[..16]))
    }

    async fn bm25_query(
        &self,
        query: &SearchQuery,
        shaped: &ShapedQuery,
        fetch_depth: usize,
    ) -> Result<(Vec<SearchHit>, Option<u64>, u64)> {
        let started = Instant::now();
        let request = SearchRequest {
            search_text: Some(shaped.text.clone()),
            filter: shaped.filter.clone(),
            top: fetch_depth,
            skip: 0,
            orderby: query.orderby.clone(),
            highlight_fields: Some("content".to_string()),
            include_total_count: true,
            ..SearchRequest::default()
        };
        let results = self.client.search(&self.config.index_name, &request).await?;
        Ok((
            results.hits,
            results.total,
            started.elapsed().as_millis() as u64,
        ))
    }

    /// Embed the query (and its strongest rewrite) and run k-NN.
    ///
    /// Returns `None` hits when vectors are disabled or every embedding
    /// slot failed; the caller treats that as a silent downgrade.
    async fn vector_query(
        &self,
        shaped: &ShapedQuery,
        fetch_depth: usize,
        enabled: bool,
    ) -> Result<(Option<Vec<SearchHit>>, u64)> {
        if !enabled {
            return Ok((None, 0));
        }
        let started = Instant::now();

        let texts: Vec<String> = shaped.rewrites.iter().take(2).cloned().collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        let Some(embedding) = embeddings.into_iter().flatten().next() else {
            return Ok((None, 0));
        };

        // k-NN depth is bounded: deep pagination is BM25's job.
        let k = fetch_depth.min(100);
        let request = SearchRequest {
            filter: shaped.filter.clone(),
            top: k,
            skip: 0,
            vector: Some(VectorQuery {
                vector: embedding.vector,
                k,
                fields: self.config.vector_field.clone(),
            }),
            include_total_count: false,
            ..SearchRequest::default()
        };
        let results = self.client.search(&self.config.index_name, &request).await?;
        Ok((
            Some(results.hits),
            started.elapsed().as_millis() as u64,
        ))
    }

    async fn semantic_query(
        &self,
        query: &SearchQuery,
        shaped: &ShapedQuery,
        fetch_depth: usize,
        enabled: bool,
    ) -> Result<(Option<Vec<SearchHit>>, u64)> {
        if !enabled {
            return Ok((None, 0));
        }
        let started = Instant::now();
        let request = SearchRequest {
            search_text: Some(shaped.text.clone()),
            filter: shaped.filter.clone(),
            top: fetch_depth.min(query.max_results.max(10)),
            skip: 0,
            semantic_configuration: self.config.semantic_configuration.clone(),
            include_total_count: false,
            ..SearchRequest::default()
        };
        let results = self.client.search(&self.config.index_name, &request).await?;
        Ok((
            Some(results.hits),
            started.elapsed().as_millis() as u64,
        ))
    }

    /// Reciprocal-rank fusion across sub-query result lists.
    ///
    /// `score = Σ 1 / (k + rank)`; ties broken by the best individual
    /// sub-query score. Scores are normalized to `[0, 1]` by the maximum
    /// fused score.
    fn fuse(
        lists: [(&'static str, Option<Vec<SearchHit>>); 3],
        query_id: &str,
    ) -> Vec<RankedResult> {
        struct Fused {
            result: RankedResult,
            rrf: f64,
            best_individual: f64,
        }

        let mut merged: HashMap<String, Fused> = HashMap::new();
        for (stage, hits) in lists {
            let Some(hits) = hits else { continue };
            for (position, hit) in hits.into_iter().enumerate() {
                let Some(mut result) = Self::result_from_hit(&hit, query_id) else {
                    continue;
                };
                let contribution = 1.0 / (RRF_K + position as f64 + 1.0);
                let individual = hit.reranker_score.unwrap_or(hit.score);
                result.factors.push(RankingFactor::new(
                    stage,
                    contribution,
                    format!("rank {} in the {} stage", position + 1, stage),
                ));
                if stage == "semantic" && !hit.captions.is_empty() {
                    let captions = hit
                        .captions
                        .iter()
                        .map(|c| sanitize_html(c).chars().take(200).collect::<String>())
                        .filter(|c| !c.is_empty())
                        .collect();
                    result.highlights.insert("captions".to_string(), captions);
                }
                match merged.get_mut(&result.id) {
                    Some(existing) => {
                        existing.rrf += contribution;
                        existing.best_individual = existing.best_individual.max(individual);
                        existing.result.factors.extend(result.factors);
                        // Prefer the richer highlight set.
                        if existing.result.highlights.is_empty() {
                            existing.result.highlights = result.highlights;
                        }
                    }
                    None => {
                        merged.insert(
                            result.id.clone(),
                            Fused {
                                result,
                                rrf: contribution,
                                best_individual: individual,
                            },
                        );
                    }
                }
            }
        }

        let mut fused: Vec<Fused> = merged.into_values().collect();
        fused.sort_by(|a, b| {
            b.rrf
                .partial_cmp(&a.rrf)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(
                    b.best_individual
                        .partial_cmp(&a.best_individual)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
        });

        let max_rrf = fused.first().map_or(1.0, |f| f.rrf).max(f64::EPSILON);
        fused
            .into_iter()
            .map(|f| {
                let mut result = f.result;
                result.relevance = f.rrf / max_rrf;
                result
            })
            .collect()
    }

    /// Collapse results sharing `(file, start_line)`, keeping max relevance
    fn dedupe(results: Vec<RankedResult>) -> Vec<RankedResult> {
        let mut by_location: HashMap<(String, u32), RankedResult> = HashMap::new();
        for result in results {
            let key = result.location_key();
            match by_location.get(&key) {
                Some(existing) if existing.relevance >= result.relevance => {}
                _ => {
                    by_location.insert(key, result);
                }
            }
        }
        by_location.into_values().collect()
    }

    /// Descending relevance, deterministic tie-break on id
    fn sort_results(results: &mut [RankedResult]) {
        results.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
    }

    /// Map a service hit into a ranked result; hits without an id are
    /// dropped
    fn result_from_hit(hit: &SearchHit, query_id: &str) -> Option<RankedResult> {
        let doc = hit.document.as_object()?;
        let str_field = |name: &str| {
            doc.get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let opt_field = |name: &str| {
            doc.get(name)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let id = str_field("id");
        if id.is_empty() {
            return None;
        }

        let highlights = hit
            .highlights
            .iter()
            .map(|(field, snippets)| {
                let cleaned = snippets
                    .iter()
                    .map(|s| sanitize_html(s).chars().take(200).collect::<String>())
                    .filter(|s| !s.is_empty())
                    .collect();
                (field.clone(), cleaned)
            })
            .collect();

        let dependencies = doc
            .get("called_functions")
            .and_then(Value::as_array)
            .map(|calls| {
                calls
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Some(RankedResult {
            id,
            repository: str_field("repository"),
            file_path: str_field("file_path"),
            language: str_field("language"),
            start_line: doc
                .get("start_line")
                .and_then(Value::as_u64)
                .unwrap_or(1)
                .max(1) as u32,
            end_line: doc.get("end_line").and_then(Value::as_u64).unwrap_or(1) as u32,
            content: str_field("content"),
            function_name: opt_field("function_name"),
            class_name: opt_field("class_name"),
            relevance: 0.0,
            highlights,
            dependencies,
            factors: Vec::new(),
            query_id: query_id.to_string(),
            rank: 0,
            last_modified: doc
                .get("last_modified")
                .and_then(Value::as_str)
                .and_then(|s| s.parse().ok()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hit(id: &str, file: &str, line: u64, score: f64) -> SearchHit {
        SearchHit {
            document: json!({
                "id": id,
                "repository": "repo",
                "file_path": file,
                "language": "rust",
                "start_line": line,
                "end_line": line + 10,
                "content": format!("fn body_of_{id}() {{}}"),
            }),
            score,
            reranker_score: None,
            highlights: HashMap::new(),
            captions: Vec::new(),
        }
    }

    #[test]
    fn fusion_merges_by_document_id() {
        let bm25 = vec![hit("a", "a.rs", 1, 3.0), hit("b", "b.rs", 1, 2.0)];
        let vector = vec![hit("b", "b.rs", 1, 0.9), hit("c", "c.rs", 1, 0.8)];
        let fused = HybridRetriever::fuse(
            [
                ("bm25", Some(bm25)),
                ("vector", Some(vector)),
                ("semantic", None),
            ],
            "q1",
        );
        // "b" appears in both lists and should fuse to the top.
        assert_eq!(fused[0].id, "b");
        assert_eq!(fused[0].relevance, 1.0);
        assert_eq!(fused.len(), 3);
        let b_factors: Vec<_> = fused[0].factors.iter().map(|f| f.factor.as_str()).collect();
        assert!(b_factors.contains(&"bm25"));
        assert!(b_factors.contains(&"vector"));
    }

    #[test]
    fn fusion_normalizes_into_unit_interval() {
        let fused = HybridRetriever::fuse(
            [
                ("bm25", Some(vec![hit("a", "a.rs", 1, 1.0)])),
                ("vector", None),
                ("semantic", None),
            ],
            "q1",
        );
        assert_eq!(fused[0].relevance, 1.0);
    }

    #[test]
    fn dedupe_keeps_highest_relevance_per_location() {
        let mut a = HybridRetriever::result_from_hit(&hit("a", "same.rs", 5, 1.0), "q").unwrap();
        a.relevance = 0.9;
        let mut b = HybridRetriever::result_from_hit(&hit("b", "same.rs", 5, 1.0), "q").unwrap();
        b.relevance = 0.4;
        let deduped = HybridRetriever::dedupe(vec![a, b]);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].id, "a");
    }

    #[test]
    fn sort_breaks_ties_on_id() {
        let mut results: Vec<RankedResult> = ["b", "a", "c"]
            .iter()
            .map(|id| {
                let mut r = HybridRetriever::result_from_hit(&hit(id, &format!("{id}.rs"), 1, 1.0), "q")
                    .unwrap();
                r.relevance = 0.5;
                r
            })
            .collect();
        HybridRetriever::sort_results(&mut results);
        let ids: Vec<_> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn hits_without_ids_are_dropped() {
        let hit = SearchHit {
            document: json!({"file_path": "x.rs"}),
            score: 1.0,
            reranker_score: None,
            highlights: HashMap::new(),
            captions: Vec::new(),
        };
        assert!(HybridRetriever::result_from_hit(&hit, "q").is_none());
    }

    #[test]
    fn highlights_are_html_sanitized() {
        let mut highlights = HashMap::new();
        highlights.insert(
            "content".to_string(),
            vec!["<em>auth</em> middleware".to_string()],
        );
        let hit = SearchHit {
            document: json!({"id": "a", "file_path": "a.rs", "start_line": 1}),
            score: 1.0,
            reranker_score: None,
            highlights,
            captions: Vec::new(),
        };
        let result = HybridRetriever::result_from_hit(&hit, "q").unwrap();
        assert_eq!(result.highlights["content"][0], "auth middleware");
    }
}
