//! Configuration file support.
//!
//! Configuration is read from a TOML file. Every key is optional:
//!
//! ```toml
//! request_timeout_secs = 30
//! disable_automatic_ping = false
//! auto_migrate = true
//!
//! [data_source]
//! directory = "/var/lib/metascrape"
//! ```
//!
//! `data_source` may also be the string `"memory"` or `"user_cache"`.

use crate::engine::EngineOptions;
use crate::store::DataSource;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML or has unexpected values
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Request timeout must be greater than zero")]
    ZeroTimeout,
}

/// Settings of the `metascrape` tool.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub data_source: DataSource,

    #[serde(default)]
    pub disable_automatic_ping: bool,

    /// Create missing storage structures at startup
    #[serde(default = "default_auto_migrate")]
    pub auto_migrate: bool,
}

fn default_request_timeout_secs() -> u64 {
    crate::fetch::DEFAULT_TIMEOUT.as_secs()
}

fn default_auto_migrate() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            data_source: DataSource::default(),
            disable_automatic_ping: false,
            auto_migrate: default_auto_migrate(),
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Converts the settings into [`EngineOptions`].
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            data_source: self.data_source.clone(),
            disable_automatic_ping: self.disable_automatic_ping,
            timeout: self.request_timeout(),
        }
    }
}
