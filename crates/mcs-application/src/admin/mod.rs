//! Index administration
//!
//! Idempotent index lifecycle automation and the repository indexing
//! worker. All mutations of one index are serialized behind a per-index
//! lock so schema updates never race document uploads.

mod automation;
mod indexer;

pub use automation::{
    BackfillReport, CleanupReport, EmbeddingValidationReport, EnsureReport, IndexAutomation,
    RecreateReport, SchemaValidationReport,
};
pub use indexer::{IndexingReport, IndexingWorker};
