//! Lazy embedding provider lifecycle
//!
//! Enforces the provider state machine:
//! `uninitialized → enabled | disabled`. The decision happens at the first
//! call: incomplete configuration transitions to `disabled`, which is
//! terminal for the life of the process. Disabled providers return the
//! deterministic empty result, never an error.

use std::sync::Arc;

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::info;

use mcs_domain::error::Result;
use mcs_domain::ports::EmbeddingProvider;
use mcs_domain::value_objects::Embedding;
use mcs_infrastructure::config::EmbeddingConfig;

use super::OpenAiEmbeddingProvider;

/// Embedding provider with lazy initialization and terminal degradation
pub struct LazyEmbeddingProvider {
    config: EmbeddingConfig,
    inner: OnceCell<Option<Arc<dyn EmbeddingProvider>>>,
}

impl LazyEmbeddingProvider {
    /// Create an uninitialized provider from configuration
    pub fn new(config: EmbeddingConfig) -> Self {
        Self {
            config,
            inner: OnceCell::new(),
        }
    }

    /// Whether the configuration is complete enough to enable vectors
    fn config_complete(&self) -> bool {
        self.config.provider == "openai"
            && self.config.api_key.as_deref().is_some_and(|k| !k.is_empty())
            && self.config.dimensions > 0
    }

    async fn provider(&self) -> Option<&Arc<dyn EmbeddingProvider>> {
        self.inner
            .get_or_init(|| async {
                if !self.config_complete() {
                    info!(
                        provider = %self.config.provider,
                        "embedding configuration incomplete; provider disabled"
                    );
                    return None;
                }
                let provider: Arc<dyn EmbeddingProvider> = Arc::new(OpenAiEmbeddingProvider::new(
                    self.config.api_key.clone().unwrap_or_default(),
                    self.config.endpoint.clone(),
                    self.config.model.clone(),
                    self.config.dimensions,
                    self.config.batch_size,
                    Duration::from_secs(self.config.timeout_secs),
                ));
                info!(provider = provider.provider_name(), "embedding provider enabled");
                Some(provider)
            })
            .await
            .as_ref()
    }
}

#[async_trait]
impl EmbeddingProvider for LazyEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Option<Embedding>>> {
        match self.provider().await {
            Some(inner) => inner.embed_batch(texts).await,
            None => Ok(Vec::new()),
        }
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    fn is_enabled(&self) -> bool {
        match self.inner.get() {
            Some(state) => state.is_some(),
            // Not yet initialized: report what the first call will decide.
            None => self.config_complete(),
        }
    }

    fn provider_name(&self) -> &str {
        &self.config.provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn incomplete_config_disables_terminally() {
        let provider = LazyEmbeddingProvider::new(EmbeddingConfig::default());
        assert!(!provider.is_enabled());

        let result = provider.embed_batch(&["text".to_string()]).await.unwrap();
        assert!(result.is_empty());

        // Disabled is terminal: still empty, still disabled.
        let result = provider.embed_batch(&["text".to_string()]).await.unwrap();
        assert!(result.is_empty());
        assert!(!provider.is_enabled());
    }

    #[tokio::test]
    async fn complete_config_reports_enabled_before_first_call() {
        let config = EmbeddingConfig {
            api_key: Some("sk-test".to_string()),
            ..EmbeddingConfig::default()
        };
        let provider = LazyEmbeddingProvider::new(config);
        assert!(provider.is_enabled());
        assert_eq!(provider.dimensions(), 1536);
    }
}
