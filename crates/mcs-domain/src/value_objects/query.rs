//! Search query value objects
//!
//! The validated request half of the retrieval pipeline. Raw tool arguments
//! are normalized into a [`SearchQuery`] before any backend is contacted.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::constants::{DEFAULT_MAX_RESULTS, MAX_RESULTS_LIMIT, MAX_SKIP};
use crate::error::{Error, Result};

/// The user's task class; guides rewriting and ranking weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SearchIntent {
    /// Writing new functionality
    Implement,
    /// Hunting down a defect
    Debug,
    /// Reading to build a mental model
    Understand,
    /// Restructuring existing code
    Refactor,
    /// Writing or fixing tests
    Test,
    /// Writing documentation
    Document,
}

impl SearchIntent {
    /// Wire name of the intent
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Implement => "implement",
            Self::Debug => "debug",
            Self::Understand => "understand",
            Self::Refactor => "refactor",
            Self::Test => "test",
            Self::Document => "document",
        }
    }

    /// All intents, in declaration order
    pub fn all() -> &'static [SearchIntent] {
        &[
            Self::Implement,
            Self::Debug,
            Self::Understand,
            Self::Refactor,
            Self::Test,
            Self::Document,
        ]
    }
}

impl FromStr for SearchIntent {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "implement" => Ok(Self::Implement),
            "debug" => Ok(Self::Debug),
            "understand" => Ok(Self::Understand),
            "refactor" => Ok(Self::Refactor),
            "test" => Ok(Self::Test),
            "document" => Ok(Self::Document),
            other => Err(Error::validation_field(
                "intent",
                format!("unknown intent '{other}'"),
            )),
        }
    }
}

impl std::fmt::Display for SearchIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result verbosity requested by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    /// Rich objects with full code snippets
    #[default]
    Full,
    /// One small object per result
    Compact,
    /// Single-line strings optimised for chat UIs
    Ultra,
}

impl FromStr for DetailLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "compact" => Ok(Self::Compact),
            "ultra" => Ok(Self::Ultra),
            _ => Err(Error::validation_field(
                "detail_level",
                "detail_level must be one of 'full', 'compact', or 'ultra'",
            )),
        }
    }
}

/// Value Object: Search Query
///
/// Carries the invariants of the search contract:
/// - `text` non-empty after trim, at most 1000 chars / 100 words
/// - `max_results ∈ [1, 30]`, `skip ∈ [0, 10_000]`
///
/// Construction goes through [`SearchQuery::new`] which clamps the numeric
/// parameters; text sanitization lives in the query shaper.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchQuery {
    /// Free-text query
    pub text: String,
    /// Caller-supplied intent; overrides classification when present
    pub intent: Option<SearchIntent>,
    /// Restrict to one language
    pub language: Option<String>,
    /// Restrict to one repository
    pub repository: Option<String>,
    /// Terms that must match exactly (quoted phrases, literals, call names)
    pub exact_terms: Vec<String>,
    /// Page size
    pub max_results: usize,
    /// Pagination offset
    pub skip: usize,
    /// Server-side order expression
    pub orderby: Option<String>,
    /// Requested result verbosity
    pub detail_level: DetailLevel,
    /// Skip vector and semantic stages
    pub bm25_only: bool,
    /// Pull in dependency chunks for each hit
    pub include_dependencies: bool,
    /// Snippet truncation; 0 disables
    pub snippet_lines: usize,
}

impl SearchQuery {
    /// Create a query with clamped numeric parameters
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            intent: None,
            language: None,
            repository: None,
            exact_terms: Vec::new(),
            max_results: DEFAULT_MAX_RESULTS,
            skip: 0,
            orderby: None,
            detail_level: DetailLevel::Full,
            bm25_only: false,
            include_dependencies: false,
            snippet_lines: 0,
        }
    }

    /// Clamp `max_results` and `skip` into their allowed ranges
    pub fn clamp_limits(mut self) -> Self {
        self.max_results = self.max_results.clamp(1, MAX_RESULTS_LIMIT);
        self.skip = self.skip.min(MAX_SKIP);
        self
    }
}
