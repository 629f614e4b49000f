//! Typed configuration tree
//!
//! One struct per concern, merged into [`AppConfig`]. All sections have
//! working defaults so a bare process starts in a degraded-but-functional
//! state (no embeddings, no auth provider, in-memory sessions).

use mcs_domain::constants::{
    DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_CACHE_TTL_SECS, DEFAULT_EMBEDDING_BATCH_SIZE,
    DEFAULT_EMBEDDING_DIMENSIONS, DEFAULT_EMBEDDING_TIMEOUT_SECS, DEFAULT_SEARCH_TIMEOUT_SECS,
};
use mcs_domain::value_objects::Tier;
use serde::{Deserialize, Serialize};

/// Connection to the external search service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchServiceConfig {
    /// Service endpoint URL
    pub endpoint: String,
    /// Admin key (write access)
    pub admin_key: String,
    /// Optional read-only query key
    #[serde(default)]
    pub query_key: Option<String>,
    /// Default index name
    pub index_name: String,
    /// REST API version
    pub api_version: String,
    /// Semantic configuration name; missing disables the semantic stage
    #[serde(default)]
    pub semantic_configuration: Option<String>,
    /// Request deadline in seconds
    pub timeout_secs: u64,
}

impl Default for SearchServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            admin_key: String::new(),
            query_key: None,
            index_name: "code-index".to_string(),
            api_version: "2024-07-01".to_string(),
            semantic_configuration: None,
            timeout_secs: DEFAULT_SEARCH_TIMEOUT_SECS,
        }
    }
}

/// Vector generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider name (`openai`, `null`)
    pub provider: String,
    /// Model name
    pub model: String,
    /// Vector dimensionality
    pub dimensions: usize,
    /// Batch size for embedding calls
    pub batch_size: usize,
    /// Provider endpoint; empty disables the provider
    #[serde(default)]
    pub endpoint: Option<String>,
    /// API key; missing disables the provider
    #[serde(default)]
    pub api_key: Option<String>,
    /// Request deadline in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
            batch_size: DEFAULT_EMBEDDING_BATCH_SIZE,
            endpoint: None,
            api_key: None,
            timeout_secs: DEFAULT_EMBEDDING_TIMEOUT_SECS,
        }
    }
}

/// Query cache sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Entry time-to-live in seconds
    pub ttl_seconds: u64,
    /// Maximum entry count before LRU eviction
    pub max_entries: usize,
    /// Disable caching entirely when false
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_CACHE_TTL_SECS,
            max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            enabled: true,
        }
    }
}

/// Transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind the HTTP transport to
    pub host: String,
    /// Port to bind the HTTP transport to
    pub port: u16,
    /// Externally visible base URL (magic-link callbacks)
    #[serde(default)]
    pub base_url: Option<String>,
    /// CORS allowed origins; empty allows any
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    /// Dev mode: substitute a synthetic admin principal for every call
    pub dev_mode: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            base_url: None,
            allowed_origins: Vec::new(),
            dev_mode: false,
        }
    }
}

/// One pre-provisioned API key
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiKeyEntry {
    /// The bearer token value
    pub key: String,
    /// Display name of the key owner
    pub name: String,
    /// Tier granted to this key
    pub tier: Tier,
}

/// Principal derivation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// External auth provider endpoint; missing disables magic-link auth
    #[serde(default)]
    pub provider_endpoint: Option<String>,
    /// External auth provider secret
    #[serde(default)]
    pub provider_secret: Option<String>,
    /// Session lifetime in minutes
    pub session_duration_minutes: u64,
    /// Require a verified second factor for admin tools
    pub require_mfa_for_admin: bool,
    /// Emails granted the admin tier on login
    #[serde(default)]
    pub admin_emails: Vec<String>,
    /// Email domains granted the developer tier on login
    #[serde(default)]
    pub developer_domains: Vec<String>,
    /// Secret for signing M2M tokens
    #[serde(default)]
    pub jwt_secret: Option<String>,
    /// Pre-provisioned API keys
    #[serde(default)]
    pub api_keys: Vec<ApiKeyEntry>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            provider_endpoint: None,
            provider_secret: None,
            session_duration_minutes: 480,
            require_mfa_for_admin: true,
            admin_emails: Vec::new(),
            developer_domains: Vec::new(),
            jwt_secret: None,
            api_keys: Vec::new(),
        }
    }
}

/// Repository indexing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    /// Skip files larger than this many megabytes
    pub max_file_size_mb: u64,
    /// Stop after this many files (0 = unlimited)
    pub max_files: usize,
    /// Record git history metadata during indexing
    pub include_git_history: bool,
    /// How far back to look when `include_git_history` is set
    pub git_history_days: u32,
    /// Upload batch size
    pub batch_size: usize,
    /// Uploader worker count
    pub workers: usize,
    /// Include globs; empty includes every supported file
    #[serde(default)]
    pub include_globs: Vec<String>,
    /// Extra ignore globs on top of gitignore rules
    #[serde(default)]
    pub ignore_globs: Vec<String>,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 2,
            max_files: 0,
            include_git_history: false,
            git_history_days: 90,
            batch_size: 100,
            workers: 4,
            include_globs: Vec::new(),
            ignore_globs: Vec::new(),
        }
    }
}

/// Feedback store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// Directory for JSON-lines day files
    pub dir: String,
    /// Aggregator interval in seconds
    pub aggregation_interval_secs: u64,
    /// Sliding window size in days
    pub window_days: u32,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            dir: "data/feedback".to_string(),
            aggregation_interval_secs: 300,
            window_days: 14,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (`error`..`trace`)
    pub level: String,
    /// Emit per-stage timing logs for searches
    pub debug_timings: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            debug_timings: false,
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// External search service connection
    pub search: SearchServiceConfig,
    /// Vector generation
    pub embedding: EmbeddingConfig,
    /// Query cache sizing
    pub cache: CacheConfig,
    /// Transport settings
    pub server: ServerConfig,
    /// Principal derivation
    pub auth: AuthConfig,
    /// Repository indexing
    pub indexing: IndexingConfig,
    /// Feedback store
    pub feedback: FeedbackConfig,
    /// Logging
    pub logging: LoggingConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_degraded_but_usable() {
        let config = AppConfig::default();
        assert!(config.embedding.api_key.is_none());
        assert!(config.auth.provider_endpoint.is_none());
        assert!(config.cache.enabled);
        assert!(!config.server.dev_mode);
        assert!(config.auth.require_mfa_for_admin);
    }

    #[test]
    fn api_key_entries_deserialize_with_tier() {
        let entry: ApiKeyEntry = toml::from_str(
            r#"
            key = "sk-test"
            name = "ci"
            tier = "developer"
            "#,
        )
        .unwrap();
        assert_eq!(entry.tier, Tier::Developer);
    }
}
