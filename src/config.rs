//! Configuration loaded from `config.toml`.
//!
//! ```toml
//! database_url = "sqlite://homeql.db?mode=rwc"
//!
//! [model]
//! endpoint = "http://localhost:8080/generate"
//! max_length = 100
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HomeqlError, HomeqlResult};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://homeql.db?mode=rwc";
pub const DEFAULT_MAX_LENGTH: usize = 100;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite connection URL for the store
    pub database_url: String,

    /// Generation backend; absent endpoint means rules only
    pub model: ModelConfig,
}

/// Settings for the text-generation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub endpoint: Option<String>,
    pub api_token: Option<String>,
    /// Upper bound on generated output length
    pub max_length: usize,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            model: ModelConfig::default(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_token: None,
            max_length: DEFAULT_MAX_LENGTH,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// `<config dir>/homeql/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("homeql").join("config.toml"))
    }

    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> HomeqlResult<Self> {
        toml::from_str(content).map_err(|e| HomeqlError::Config(e.to_string()))
    }

    /// Load from `path`, or from the default location.
    ///
    /// An explicit path must exist. A missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> HomeqlResult<Self> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                Self::from_toml(&content)
            }
            None => match Self::default_path() {
                Some(path) if path.exists() => {
                    let content = std::fs::read_to_string(&path)?;
                    Self::from_toml(&content)
                }
                _ => Ok(Self::default()),
            },
        }
    }
}
