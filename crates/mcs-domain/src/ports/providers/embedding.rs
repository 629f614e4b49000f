//! Embedding provider port

use async_trait::async_trait;

use crate::error::Result;
use crate::value_objects::Embedding;

/// Port: Embedding Provider
///
/// Produces fixed-dimension vectors for input texts in batches that preserve
/// input order: slot `i` of the result corresponds to text `i`.
///
/// Lifecycle: `uninitialized → enabled | disabled`. A provider moves to
/// `disabled` at first call when its configuration is incomplete, and
/// `disabled` is terminal within a process. Disabled providers return an
/// empty vec rather than an error, so callers degrade to lexical-only
/// retrieval.
///
/// A failed batch yields `None` slots instead of failing the whole request;
/// callers record the gaps and proceed.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, preserving input order.
    ///
    /// Returns an empty vec when the provider is disabled; otherwise one
    /// slot per input, `None` where the batch containing that text failed.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Option<Embedding>>>;

    /// Dimensionality of produced vectors
    fn dimensions(&self) -> usize;

    /// Whether the provider is (still) able to produce vectors
    fn is_enabled(&self) -> bool;

    /// Identifier of this provider implementation
    fn provider_name(&self) -> &str;
}
