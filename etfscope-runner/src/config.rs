//! TOML configuration.
//!
//! ```toml
//! [store]
//! url = "https://example.execute-api.ap-northeast-2.amazonaws.com/prod/items"
//! api_key = "..."
//! table_name = "etf_universe"
//!
//! [filter]
//! exclude_keywords = ["레버리지", "합성"]
//! min_market_cap = 1000
//!
//! [writer]
//! parallel = true
//! workers = 16
//! ```
//!
//! Every section is optional. A missing `[filter]` key falls back to the
//! Korean default list and a threshold of 1000. `[store]` is only required by
//! commands that talk to the table service.

use crate::writer::{default_workers, WriteMode};
use etfscope_core::filter::FilterConfig;
use etfscope_core::store::StoreConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("config has no [store] section")]
    MissingStore,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSection {
    pub exclude_keywords: Option<Vec<String>>,
    pub min_market_cap: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WriterSection {
    #[serde(default)]
    pub parallel: bool,
    /// Worker count in parallel mode. Defaults to twice the available cores.
    pub workers: Option<usize>,
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub store: Option<StoreConfig>,
    #[serde(default)]
    pub filter: FilterSection,
    #[serde(default)]
    pub writer: WriterSection,
}

impl AppConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(store) = &self.store {
            if store.url.trim().is_empty() {
                return Err(ConfigError::Invalid("store.url is empty".into()));
            }
            if store.table_name.trim().is_empty() {
                return Err(ConfigError::Invalid("store.table_name is empty".into()));
            }
        }
        if let Some(min) = self.filter.min_market_cap {
            if !min.is_finite() || min < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "filter.min_market_cap must be a non-negative number, got {min}"
                )));
            }
        }
        if self.writer.workers == Some(0) {
            return Err(ConfigError::Invalid("writer.workers must be at least 1".into()));
        }
        Ok(())
    }

    pub fn store(&self) -> Result<&StoreConfig, ConfigError> {
        self.store.as_ref().ok_or(ConfigError::MissingStore)
    }

    /// Filter inputs, with defaults filled in.
    pub fn filter_config(&self) -> FilterConfig {
        let defaults = FilterConfig::korean_default();
        FilterConfig {
            exclude_keywords: self
                .filter
                .exclude_keywords
                .clone()
                .unwrap_or(defaults.exclude_keywords),
            min_market_cap: self.filter.min_market_cap.unwrap_or(defaults.min_market_cap),
        }
    }

    pub fn write_mode(&self) -> WriteMode {
        if self.writer.parallel {
            WriteMode::Parallel {
                workers: self.writer.workers.unwrap_or_else(default_workers),
            }
        } else {
            WriteMode::Sequential
        }
    }
}
