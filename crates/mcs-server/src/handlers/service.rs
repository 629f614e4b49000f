//! Service status tool handlers

use serde_json::{json, Value};

use mcs_domain::error::{Error, Result};

use crate::init::AppState;

/// `health_check`: component availability report
pub async fn health_check(state: &AppState) -> Result<Value> {
    let cache_stats = state.cache.stats().await.ok();
    Ok(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.started_at.elapsed().as_secs(),
        "components": {
            "search_backend": state.client.provider_name(),
            "embeddings_enabled": state.embedder.is_enabled(),
            "cache_enabled": state.config.cache.enabled,
            "cache_entries": cache_stats.map(|s| s.total_entries),
            "auth_enabled": state.auth.is_enabled(),
            "weights_version": state.weights.latest().version,
        },
        "transport": ["stdio", "rest", "sse"],
    }))
}

/// `index_status`: document count and storage statistics
pub async fn index_status(state: &AppState) -> Result<Value> {
    let index = &state.config.search.index_name;
    match state.client.get_index_stats(index).await {
        Ok(stats) => Ok(json!({
            "index": index,
            "exists": true,
            "document_count": stats.document_count,
            "storage_size_bytes": stats.storage_size_bytes,
        })),
        Err(Error::NotFound { .. }) => Ok(json!({
            "index": index,
            "exists": false,
        })),
        Err(e) => Err(e),
    }
}

/// `get_service_info`: configuration summary, secrets excluded
pub fn get_service_info(state: &AppState) -> Result<Value> {
    let config = &state.config;
    Ok(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "search": {
            "endpoint_configured": !config.search.endpoint.is_empty(),
            "index_name": config.search.index_name,
            "api_version": config.search.api_version,
            "semantic_configuration": config.search.semantic_configuration,
            "timeout_secs": config.search.timeout_secs,
        },
        "embedding": {
            "provider": config.embedding.provider,
            "model": config.embedding.model,
            "dimensions": config.embedding.dimensions,
            "batch_size": config.embedding.batch_size,
            "enabled": state.embedder.is_enabled(),
        },
        "cache": {
            "enabled": config.cache.enabled,
            "ttl_seconds": config.cache.ttl_seconds,
            "max_entries": config.cache.max_entries,
        },
        "indexing": {
            "batch_size": config.indexing.batch_size,
            "workers": config.indexing.workers,
            "max_file_size_mb": config.indexing.max_file_size_mb,
        },
        "auth": {
            "provider_enabled": state.auth.is_enabled(),
            "require_mfa_for_admin": config.auth.require_mfa_for_admin,
            "api_keys_configured": config.auth.api_keys.len(),
        },
        "dev_mode": config.server.dev_mode,
    }))
}
