//! Search result value objects
//!
//! The response half of the retrieval pipeline: ranked hits with their
//! explanation factors, plus the page-level bookkeeping the tool surface
//! exposes (`total`, `has_more`, backend markers, stage timings).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One contribution to a result's final score.
///
/// The explainer turns these into the per-result rationale; contributions
/// sum (monotonically, not necessarily linearly) to the final relevance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankingFactor {
    /// Factor name, e.g. `bm25`, `vector`, `intent_boost`, `freshness`
    pub factor: String,
    /// Signed contribution to the final score
    pub contribution: f64,
    /// Human-readable detail
    pub detail: String,
}

impl RankingFactor {
    /// Create a factor
    pub fn new(factor: impl Into<String>, contribution: f64, detail: impl Into<String>) -> Self {
        Self {
            factor: factor.into(),
            contribution,
            detail: detail.into(),
        }
    }
}

/// Value Object: Ranked Search Result
///
/// One hit of a search response. Within a response, `rank` is strictly
/// increasing and matches descending `relevance`, ties broken by `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedResult {
    /// Document id of the matched chunk
    pub id: String,
    /// Repository of the matched chunk
    pub repository: String,
    /// Path to the source file
    pub file_path: String,
    /// Programming language of the matched code ("" when unknown)
    pub language: String,
    /// Starting line number (1-based)
    pub start_line: u32,
    /// Ending line number (inclusive)
    pub end_line: u32,
    /// The matched code content
    pub content: String,
    /// Function name, when the chunk is a function
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    /// Class name, when the chunk is (inside) a class
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    /// Final relevance in `[0, 1]`
    pub relevance: f64,
    /// Server-provided highlights per field, HTML-sanitized
    #[serde(default)]
    pub highlights: HashMap<String, Vec<String>>,
    /// Functions this chunk calls; surfaced when dependencies are requested
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    /// Contributing ranking factors, in application order
    #[serde(default)]
    pub factors: Vec<RankingFactor>,
    /// Query correlation id this result belongs to
    pub query_id: String,
    /// 1-based position in the response
    pub rank: usize,
    /// Last modification time of the source, when indexed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

impl RankedResult {
    /// Dedup key: two results for the same `(file, start_line)` collapse
    pub fn location_key(&self) -> (String, u32) {
        (self.file_path.clone(), self.start_line)
    }
}

/// Which retrieval backend produced a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchBackend {
    /// Full pipeline: BM25 + vector (+ semantic) with re-ranking
    Enhanced,
    /// BM25 only, after a downgrade or `bm25_only` request
    Basic,
}

impl SearchBackend {
    /// Wire marker for the response
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enhanced => "enhanced",
            Self::Basic => "basic",
        }
    }
}

/// Per-stage wall-clock timings for a search request
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchTimings {
    /// Lexical sub-query duration
    pub bm25_ms: u64,
    /// Vector sub-query duration (embedding + k-NN)
    pub vector_ms: u64,
    /// Semantic rerank duration
    pub semantic_ms: u64,
    /// Fusion + re-ranking duration
    pub ranking_ms: u64,
    /// End-to-end duration
    pub total_ms: u64,
}

/// Value Object: Search Page
///
/// The retriever's output for one request, before tool-level shaping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPage {
    /// Ranked hits for this page
    pub items: Vec<RankedResult>,
    /// Total matching documents across all pages
    pub total: u64,
    /// Query correlation id
    pub query_id: String,
    /// Backend marker
    pub backend: SearchBackend,
    /// Whether the semantic ranker contributed to this page
    pub semantic_used: bool,
    /// Whether exact-term filtering was applied
    pub applied_exact_terms: bool,
    /// The exact terms applied, in order
    pub exact_terms: Vec<String>,
    /// Whether this page came from the cache
    pub from_cache: bool,
    /// Stage timings
    pub timings: SearchTimings,
}

impl SearchPage {
    /// `has_more ⇔ skip + returned < total`
    pub fn has_more(&self, skip: usize) -> bool {
        ((skip + self.items.len()) as u64) < self.total
    }

    /// Pagination cursor for the next page, when one exists.
    ///
    /// An empty page never yields a cursor, so iterating
    /// `skip = 0, next_skip, …` always terminates.
    pub fn next_skip(&self, skip: usize) -> Option<usize> {
        if !self.items.is_empty() && self.has_more(skip) {
            Some(skip + self.items.len())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: &str, file: &str, line: u32, relevance: f64) -> RankedResult {
        RankedResult {
            id: id.to_string(),
            repository: "repo".to_string(),
            file_path: file.to_string(),
            language: "rust".to_string(),
            start_line: line,
            end_line: line + 10,
            content: String::new(),
            function_name: None,
            class_name: None,
            relevance,
            highlights: HashMap::new(),
            dependencies: Vec::new(),
            factors: Vec::new(),
            query_id: "q1".to_string(),
            rank: 1,
            last_modified: None,
        }
    }

    fn page(items: Vec<RankedResult>, total: u64) -> SearchPage {
        SearchPage {
            items,
            total,
            query_id: "q1".to_string(),
            backend: SearchBackend::Enhanced,
            semantic_used: false,
            applied_exact_terms: false,
            exact_terms: Vec::new(),
            from_cache: false,
            timings: SearchTimings::default(),
        }
    }

    #[test]
    fn next_skip_advances_until_exhausted() {
        let p = page(vec![result("a", "a.rs", 1, 0.9), result("b", "b.rs", 1, 0.8)], 5);
        assert_eq!(p.next_skip(0), Some(2));
        assert_eq!(p.next_skip(2), Some(4));
        let last = page(vec![result("e", "e.rs", 1, 0.1)], 5);
        assert_eq!(last.next_skip(4), None);
    }

    #[test]
    fn location_key_collapses_same_file_and_line() {
        let a = result("a", "src/lib.rs", 10, 0.9);
        let b = result("b", "src/lib.rs", 10, 0.5);
        assert_eq!(a.location_key(), b.location_key());
    }

    #[test]
    fn backend_markers() {
        assert_eq!(SearchBackend::Enhanced.as_str(), "enhanced");
        assert_eq!(SearchBackend::Basic.as_str(), "basic");
    }
}
