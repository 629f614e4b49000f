//! In-memory TTL + LRU cache provider
//!
//! A string-keyed JSON cache with per-entry insertion timestamps. All
//! operations are serialized under a single async mutex; hold times are
//! O(µs) at the configured capacities so one lock is acceptable.
//!
//! Semantics:
//! - `get` misses and removes entries older than TTL, refreshes recency on hit
//! - `set` evicts the least-recently-used entry once at capacity
//! - `clear_scope("search")` removes exactly the keys prefixed `search:`
//! - `clear_pattern("search:*auth*")` removes keys matching the glob

use async_trait::async_trait;
use globset::Glob;
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use mcs_domain::error::{Error, Result};
use mcs_domain::ports::{CacheProvider, CacheStats};

struct Entry {
    value: Value,
    inserted_at: Instant,
    touched: u64,
}

struct CacheInner {
    entries: HashMap<String, Entry>,
    clock: u64,
    hits: u64,
    misses: u64,
}

impl CacheInner {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn evict_lru(&mut self) {
        if let Some(key) = self
            .entries
            .iter()
            .min_by_key(|(_, e)| e.touched)
            .map(|(k, _)| k.clone())
        {
            self.entries.remove(&key);
        }
    }
}

/// TTL + LRU cache provider
pub struct TtlLruCache {
    inner: Mutex<CacheInner>,
    ttl: Duration,
    max_entries: usize,
}

impl TtlLruCache {
    /// Create a cache with the given TTL and capacity
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                clock: 0,
                hits: 0,
                misses: 0,
            }),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Configured TTL
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    async fn remove_matching<F: Fn(&str) -> bool>(&self, predicate: F) -> usize {
        let mut inner = self.inner.lock().await;
        let keys: Vec<String> = inner
            .entries
            .keys()
            .filter(|k| predicate(k))
            .cloned()
            .collect();
        for key in &keys {
            inner.entries.remove(key);
        }
        keys.len()
    }
}

#[async_trait]
impl CacheProvider for TtlLruCache {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();
        let expired = match inner.entries.get(key) {
            Some(entry) => now.duration_since(entry.inserted_at) >= self.ttl,
            None => {
                inner.misses += 1;
                return Ok(None);
            }
        };
        if expired {
            inner.entries.remove(key);
            inner.misses += 1;
            return Ok(None);
        }
        inner.hits += 1;
        let touched = inner.tick();
        if let Some(entry) = inner.entries.get_mut(key) {
            entry.touched = touched;
            return Ok(Some(entry.value.clone()));
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if !inner.entries.contains_key(key) && inner.entries.len() >= self.max_entries {
            inner.evict_lru();
        }
        let touched = inner.tick();
        inner.entries.insert(
            key.to_string(),
            Entry {
                value,
                inserted_at: Instant::now(),
                touched,
            },
        );
        Ok(())
    }

    async fn clear_all(&self) -> Result<usize> {
        let mut inner = self.inner.lock().await;
        let removed = inner.entries.len();
        inner.entries.clear();
        Ok(removed)
    }

    async fn clear_scope(&self, scope: &str) -> Result<usize> {
        let prefix = if scope.ends_with(':') {
            scope.to_string()
        } else {
            format!("{scope}:")
        };
        Ok(self.remove_matching(|k| k.starts_with(&prefix)).await)
    }

    async fn clear_pattern(&self, pattern: &str) -> Result<usize> {
        let matcher = Glob::new(pattern)
            .map_err(|e| Error::validation_field("pattern", format!("invalid glob: {e}")))?
            .compile_matcher();
        Ok(self.remove_matching(|k| matcher.is_match(k)).await)
    }

    async fn stats(&self) -> Result<CacheStats> {
        let inner = self.inner.lock().await;
        let now = Instant::now();
        let expired = inner
            .entries
            .values()
            .filter(|e| now.duration_since(e.inserted_at) >= self.ttl)
            .count();
        Ok(CacheStats {
            total_entries: inner.entries.len(),
            active_entries: inner.entries.len() - expired,
            expired_entries: expired,
            max_entries: self.max_entries,
            ttl_seconds: self.ttl.as_secs(),
            hits: inner.hits,
            misses: inner.misses,
        })
    }

    fn provider_name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cache(ttl_ms: u64, max: usize) -> TtlLruCache {
        TtlLruCache::new(Duration::from_millis(ttl_ms), max)
    }

    #[tokio::test]
    async fn set_then_get_within_ttl() {
        let c = cache(10_000, 10);
        c.set("search:a", json!({"n": 1})).await.unwrap();
        assert_eq!(c.get("search:a").await.unwrap(), Some(json!({"n": 1})));
    }

    #[tokio::test]
    async fn expired_entries_miss_and_are_removed() {
        let c = cache(0, 10);
        c.set("search:a", json!(1)).await.unwrap();
        assert_eq!(c.get("search:a").await.unwrap(), None);
        let stats = c.stats().await.unwrap();
        assert_eq!(stats.total_entries, 0);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn lru_eviction_at_capacity() {
        let c = cache(10_000, 2);
        c.set("a", json!(1)).await.unwrap();
        c.set("b", json!(2)).await.unwrap();
        // Touch "a" so "b" becomes the least recently used.
        c.get("a").await.unwrap();
        c.set("c", json!(3)).await.unwrap();
        assert!(c.get("a").await.unwrap().is_some());
        assert!(c.get("b").await.unwrap().is_none());
        assert!(c.get("c").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn overwriting_does_not_evict() {
        let c = cache(10_000, 2);
        c.set("a", json!(1)).await.unwrap();
        c.set("b", json!(2)).await.unwrap();
        c.set("a", json!(3)).await.unwrap();
        assert_eq!(c.get("a").await.unwrap(), Some(json!(3)));
        assert!(c.get("b").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn clear_scope_removes_exactly_the_prefix() {
        let c = cache(10_000, 10);
        c.set("search:a", json!(1)).await.unwrap();
        c.set("search:b", json!(2)).await.unwrap();
        c.set("embeddings:a", json!(3)).await.unwrap();
        c.set("searchx", json!(4)).await.unwrap();
        let removed = c.clear_scope("search").await.unwrap();
        assert_eq!(removed, 2);
        assert!(c.get("embeddings:a").await.unwrap().is_some());
        assert!(c.get("searchx").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn clear_pattern_uses_glob_matching() {
        let c = cache(10_000, 10);
        c.set("search:auth:1", json!(1)).await.unwrap();
        c.set("search:db:2", json!(2)).await.unwrap();
        let removed = c.clear_pattern("search:auth*").await.unwrap();
        assert_eq!(removed, 1);
        assert!(c.get("search:db:2").await.unwrap().is_some());

        assert!(c.clear_pattern("search:[").await.is_err());
    }

    #[tokio::test]
    async fn clear_all_reports_count() {
        let c = cache(10_000, 10);
        c.set("a", json!(1)).await.unwrap();
        c.set("b", json!(2)).await.unwrap();
        assert_eq!(c.clear_all().await.unwrap(), 2);
        assert_eq!(c.stats().await.unwrap().total_entries, 0);
    }
}
