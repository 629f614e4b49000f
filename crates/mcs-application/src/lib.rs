//! MCP Code Search - Application Layer
//!
//! The retrieval pipeline and its supporting services: query shaping,
//! hybrid retrieval, contextual ranking, explanation, feedback aggregation,
//! index automation and the repository indexing worker.

pub mod admin;
pub mod analysis;
pub mod feedback;
pub mod generation;
pub mod query;
pub mod search;

pub use query::{QueryShaper, ShapedQuery};
pub use search::{ContextualRanker, HybridRetriever, ResultExplainer, SearchContext};
