//! Search orchestration
//!
//! The hybrid retriever fans out lexical, vector and semantic sub-queries,
//! fuses and de-duplicates the results, re-ranks them with the contextual
//! ranker and explains the outcome on request.

mod explainer;
mod ranker;
mod retriever;

pub use explainer::{ExplainMode, Explanation, ResultExplainer};
pub use ranker::ContextualRanker;
pub use retriever::{HybridRetriever, RetrieverConfig, SearchContext};
