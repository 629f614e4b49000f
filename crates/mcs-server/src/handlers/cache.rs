//! Cache tool handlers

use serde_json::{json, Value};

use mcs_domain::error::{Error, Result};

use crate::args::CacheClearArgs;
use crate::init::AppState;

/// Scopes accepted by `cache_clear`
const VALID_SCOPES: &[&str] = &["all", "search", "embeddings", "results"];

/// `cache_stats`: current cache statistics
pub async fn cache_stats(state: &AppState) -> Result<Value> {
    let stats = state.cache.stats().await?;
    Ok(json!({ "cache_stats": stats }))
}

/// `cache_clear`: clear everything, one scope, or a glob within a scope
pub async fn cache_clear(state: &AppState, args: CacheClearArgs) -> Result<Value> {
    let scope = args.scope.to_lowercase();
    if !VALID_SCOPES.contains(&scope.as_str()) {
        return Err(Error::validation_field(
            "scope",
            format!(
                "invalid scope '{scope}'; must be one of: {}",
                VALID_SCOPES.join(", ")
            ),
        ));
    }

    let cleared = if scope == "all" {
        state.cache.clear_all().await?
    } else if let Some(pattern) = &args.pattern {
        state
            .cache
            .clear_pattern(&format!("{scope}:{pattern}"))
            .await?
    } else {
        state.cache.clear_scope(&scope).await?
    };

    let stats = state.cache.stats().await?;
    Ok(json!({
        "cleared": true,
        "entries_removed": cleared,
        "cache_stats": stats,
    }))
}
