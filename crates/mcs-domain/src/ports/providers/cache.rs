//! Cache provider port

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Cache statistics report
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CacheStats {
    /// Entries currently stored, including expired-but-unevicted ones
    pub total_entries: usize,
    /// Entries within TTL
    pub active_entries: usize,
    /// Entries past TTL awaiting removal
    pub expired_entries: usize,
    /// Configured capacity
    pub max_entries: usize,
    /// Configured TTL in seconds
    pub ttl_seconds: u64,
    /// Lookup hits since startup
    pub hits: u64,
    /// Lookup misses since startup
    pub misses: u64,
}

/// Port: Query Cache
///
/// String-keyed JSON value cache with per-entry insertion timestamps.
/// Keys are namespaced by scope prefix (`search:`, `embeddings:`, …) so
/// invalidation can target one concern.
///
/// Semantics:
/// - `get` returns a miss for entries older than TTL and removes them
/// - eviction is LRU to a maximum entry count
/// - every operation is atomic; concurrent `set` ordering is unspecified
#[async_trait]
pub trait CacheProvider: Send + Sync {
    /// Look up a value; refreshes recency on hit
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store a value, evicting the least-recently-used entry at capacity
    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Remove every entry; returns the number removed
    async fn clear_all(&self) -> Result<usize>;

    /// Remove entries whose key starts with `scope:`; returns the number removed
    async fn clear_scope(&self, scope: &str) -> Result<usize>;

    /// Remove entries whose key matches a glob pattern; returns the number removed
    async fn clear_pattern(&self, pattern: &str) -> Result<usize>;

    /// Current statistics
    async fn stats(&self) -> Result<CacheStats>;

    /// Identifier of this provider implementation
    fn provider_name(&self) -> &str;
}
