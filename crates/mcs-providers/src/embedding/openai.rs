//! OpenAI-compatible embedding provider
//!
//! Implements the `EmbeddingProvider` port against an OpenAI-style
//! `/embeddings` endpoint. Batches preserve input order; a failed batch
//! yields `None` slots for its texts instead of failing the whole request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::warn;

use mcs_domain::error::{Error, Result};
use mcs_domain::ports::EmbeddingProvider;
use mcs_domain::value_objects::Embedding;

use crate::constants::CONTENT_TYPE_JSON;

/// OpenAI-compatible embedding provider
pub struct OpenAiEmbeddingProvider {
    api_key: String,
    base_url: String,
    model: String,
    dimensions: usize,
    batch_size: usize,
    timeout: Duration,
    http_client: Client,
}

impl OpenAiEmbeddingProvider {
    /// Create a new provider
    ///
    /// # Arguments
    /// * `api_key` - API key for the endpoint
    /// * `base_url` - Endpoint base URL (defaults to the OpenAI API)
    /// * `model` - Model name, e.g. `text-embedding-3-small`
    /// * `dimensions` - Expected vector dimensionality
    /// * `batch_size` - Texts per request
    /// * `timeout` - Per-request deadline
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        model: String,
        dimensions: usize,
        batch_size: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            model,
            dimensions,
            batch_size: batch_size.max(1),
            timeout,
            http_client: Client::new(),
        }
    }

    /// The model name
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one batch and parse its vectors, preserving order
    async fn fetch_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let payload = serde_json::json!({
            "input": texts,
            "model": self.model,
            "encoding_format": "float",
        });

        let response = self
            .http_client
            .post(format!("{}/embeddings", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", CONTENT_TYPE_JSON)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::timeout("embedding", self.timeout.as_millis() as u64)
                } else {
                    Error::dependency_with_source("embedding", "request failed", e)
                }
            })?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::dependency_with_source("embedding", "invalid response body", e))?;

        if !status.is_success() {
            return Err(Error::dependency(
                "embedding",
                format!("endpoint returned {status}: {body}"),
            ));
        }

        let data = body["data"]
            .as_array()
            .ok_or_else(|| Error::dependency("embedding", "response missing data array"))?;
        if data.len() != texts.len() {
            return Err(Error::dependency(
                "embedding",
                format!(
                    "response count mismatch: expected {}, got {}",
                    texts.len(),
                    data.len()
                ),
            ));
        }

        data.iter()
            .map(|item| {
                let vector: Vec<f32> = item["embedding"]
                    .as_array()
                    .ok_or_else(|| Error::dependency("embedding", "missing embedding vector"))?
                    .iter()
                    .map(|v| v.as_f64().unwrap_or(0.0) as f32)
                    .collect();
                if vector.len() != self.dimensions {
                    return Err(Error::dependency(
                        "embedding",
                        format!(
                            "vector dimension mismatch: expected {}, got {}",
                            self.dimensions,
                            vector.len()
                        ),
                    ));
                }
                Ok(Embedding::new(vector, self.model.clone()))
            })
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Option<Embedding>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut out: Vec<Option<Embedding>> = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            match self.fetch_batch(batch).await {
                Ok(embeddings) => out.extend(embeddings.into_iter().map(Some)),
                Err(e) => {
                    // One failed batch degrades those slots, not the request.
                    warn!(error = %e, batch_len = batch.len(), "embedding batch failed");
                    out.extend(std::iter::repeat_with(|| None).take(batch.len()));
                }
            }
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn is_enabled(&self) -> bool {
        true
    }

    fn provider_name(&self) -> &str {
        "openai"
    }
}
