//! Configuration
//!
//! A single environment-driven configuration object, loaded once at startup
//! and treated as immutable afterwards.

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    ApiKeyEntry, AppConfig, AuthConfig, CacheConfig, EmbeddingConfig, FeedbackConfig,
    IndexingConfig, LoggingConfig, SearchServiceConfig, ServerConfig,
};
