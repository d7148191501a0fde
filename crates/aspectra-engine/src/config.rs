//! Weaver configuration
//!
//! Loaded from TOML:
//!
//! ```toml
//! duplicate_aspects = "reject"
//! verify_abstract_return = true
//! log_filter = "aspectra=debug"
//! ```
//!
//! Every key is optional.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or write the config file
    #[error("Failed to access config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Validation error
    #[error("Invalid config: {0}")]
    ValidationError(String),
}

/// What happens when an aspect id is registered twice
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateAspectPolicy {
    /// Warn and replace the previous aspect
    #[default]
    Replace,
    /// Fail with a weaving error
    Reject,
}

/// Configuration of a reflection context and its weaver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaverConfig {
    /// Duplicate aspect id policy
    pub duplicate_aspects: DuplicateAspectPolicy,

    /// Fail when a woven member consumes the `abstract` placeholder without
    /// returning it
    pub verify_abstract_return: bool,

    /// Default `tracing` filter for [`init_from_config`](crate::logging::init_from_config)
    pub log_filter: String,
}

impl Default for WeaverConfig {
    fn default() -> Self {
        Self {
            duplicate_aspects: DuplicateAspectPolicy::Replace,
            verify_abstract_return: true,
            log_filter: "aspectra=info".to_string(),
        }
    }
}

impl WeaverConfig {
    /// Load a config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        content.parse()
    }

    /// Write the config to a file
    pub fn to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the config
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_filter.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "log_filter cannot be empty".to_string(),
            ));
        }
        EnvFilter::try_new(&self.log_filter).map_err(|e| {
            ConfigError::ValidationError(format!("Invalid log_filter '{}': {}", self.log_filter, e))
        })?;
        Ok(())
    }
}

impl FromStr for WeaverConfig {
    type Err = ConfigError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let config: WeaverConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}
