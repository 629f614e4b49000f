//! Process-wide search client pool
//!
//! One client exists per `(endpoint, api_key, index)` triple; concurrent
//! callers share it. Clients are cheap to clone internally (the HTTP client
//! is pooled) but keeping one instance per triple bounds connection reuse.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

use super::RestSearchClient;

/// Pool key: endpoint, api key and index name
type PoolKey = (String, String, String);

/// Process-wide client pool
#[derive(Default)]
pub struct ClientPool {
    clients: DashMap<PoolKey, Arc<RestSearchClient>>,
}

impl ClientPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the client for a triple, creating it on first use
    pub fn get_or_create(
        &self,
        endpoint: &str,
        api_key: &str,
        index: &str,
        api_version: &str,
        timeout: Duration,
    ) -> Arc<RestSearchClient> {
        let key = (
            endpoint.to_string(),
            api_key.to_string(),
            index.to_string(),
        );
        self.clients
            .entry(key)
            .or_insert_with(|| {
                Arc::new(RestSearchClient::new(endpoint, api_key, api_version, timeout))
            })
            .clone()
    }

    /// Number of pooled clients
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Whether the pool is empty
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_client_per_triple() {
        let pool = ClientPool::new();
        let timeout = Duration::from_secs(30);
        let a = pool.get_or_create("https://s.example", "key1", "idx", "2024-07-01", timeout);
        let b = pool.get_or_create("https://s.example", "key1", "idx", "2024-07-01", timeout);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(pool.len(), 1);

        let c = pool.get_or_create("https://s.example", "key1", "other", "2024-07-01", timeout);
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(pool.len(), 2);
    }
}
