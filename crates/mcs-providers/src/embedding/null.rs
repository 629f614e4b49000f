//! Null embedding provider
//!
//! Permanently disabled provider used when vector generation is not
//! configured. Returns the deterministic empty result so callers fall back
//! to lexical-only retrieval.

use async_trait::async_trait;

use mcs_domain::error::Result;
use mcs_domain::ports::EmbeddingProvider;
use mcs_domain::value_objects::Embedding;

/// Disabled embedding provider
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEmbeddingProvider;

impl NullEmbeddingProvider {
    /// Create a null provider
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmbeddingProvider for NullEmbeddingProvider {
    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Option<Embedding>>> {
        Ok(Vec::new())
    }

    fn dimensions(&self) -> usize {
        0
    }

    fn is_enabled(&self) -> bool {
        false
    }

    fn provider_name(&self) -> &str {
        "null"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_returns_empty() {
        let provider = NullEmbeddingProvider::new();
        let result = provider
            .embed_batch(&["hello".to_string()])
            .await
            .unwrap();
        assert!(result.is_empty());
        assert!(!provider.is_enabled());
    }
}
