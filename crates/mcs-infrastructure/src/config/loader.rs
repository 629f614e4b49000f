//! Configuration loader
//!
//! Loads configuration from defaults, an optional TOML file and
//! `MCS__`-prefixed environment variables, in that precedence order.

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use mcs_domain::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::AppConfig;

/// Environment variable prefix; nested keys use `__` as the separator,
/// e.g. `MCS__SERVER__PORT`, `MCS__SEARCH__ADMIN_KEY`.
pub const CONFIG_ENV_PREFIX: &str = "MCS__";

/// Default configuration file name probed in the working directory
pub const DEFAULT_CONFIG_FILENAME: &str = "mcs.toml";

/// Configuration loader service
#[derive(Clone, Default)]
pub struct ConfigLoader {
    /// Configuration file path
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader with default settings
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Set the configuration file path
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Load configuration from all sources.
    ///
    /// Sources are merged in this order (later overrides earlier):
    /// 1. `AppConfig::default()`
    /// 2. TOML configuration file (explicit path, or `mcs.toml` if present)
    /// 3. `MCS__`-prefixed environment variables
    pub fn load(&self) -> Result<AppConfig> {
        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));

        let candidate = self
            .config_path
            .clone()
            .or_else(|| Some(PathBuf::from(DEFAULT_CONFIG_FILENAME)));
        if let Some(path) = candidate {
            if path.exists() {
                debug!(path = %path.display(), "loading configuration file");
                figment = figment.merge(Toml::file(&path));
            } else if self.config_path.is_some() {
                return Err(Error::config(format!(
                    "configuration file not found: {}",
                    path.display()
                )));
            }
        }

        figment = figment.merge(Env::prefixed(CONFIG_ENV_PREFIX).split("__"));

        let config: AppConfig = figment
            .extract()
            .map_err(|e| Error::config(format!("failed to extract configuration: {e}")))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Sanity checks that cannot be expressed through types
    fn validate(config: &AppConfig) -> Result<()> {
        if config.cache.max_entries == 0 {
            return Err(Error::config("cache.max_entries must be positive"));
        }
        if config.indexing.batch_size == 0 || config.indexing.workers == 0 {
            return Err(Error::config(
                "indexing.batch_size and indexing.workers must be positive",
            ));
        }
        if config.embedding.dimensions == 0 {
            return Err(Error::config("embedding.dimensions must be positive"));
        }
        if !config.search.endpoint.is_empty() && !config.search.endpoint.starts_with("http") {
            return Err(Error::config(format!(
                "search.endpoint is not a URL: {}",
                config.search.endpoint
            )));
        }
        Ok(())
    }
}
