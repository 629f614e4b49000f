//! Domain Entities
//!
//! Objects with identity and a lifecycle. [`CodeChunk`] is persisted in the
//! external search index and owned by the indexing worker;
//! [`FeedbackEvent`] is appended to the feedback log and owned by the
//! feedback store.

mod code_chunk;
mod feedback;

pub use code_chunk::CodeChunk;
pub use feedback::{FeedbackEvent, FeedbackKind, SearchOutcome};
