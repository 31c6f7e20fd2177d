use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable overriding [`TellerConfig::log_filter`].
pub const LOG_FILTER_ENV: &str = "TELLER_LOG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TellerConfig {
    pub account_number_prefix: String,
    /// Last sequence value considered taken; numbering continues after it.
    pub account_number_start: u64,
    pub account_number_width: usize,
    pub log_filter: String,
}

impl Default for TellerConfig {
    fn default() -> Self {
        Self {
            account_number_prefix: "ACC".to_string(),
            account_number_start: 100_000,
            account_number_width: 8,
            log_filter: "info".to_string(),
        }
    }
}

impl TellerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(filter) = std::env::var(LOG_FILTER_ENV) {
            if !filter.trim().is_empty() {
                self.log_filter = filter;
            }
        }
        self
    }
}
