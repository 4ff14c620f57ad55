//! Configuration for intercepting pipelines.
//!
//! A config file describes how to log and which rewrite rules to chain, in
//! order:
//!
//! ```toml
//! [logging]
//! level = "debug"
//!
//! [[rules]]
//! kind = "rename-field"
//! from = "Name"
//! to = "FullName"
//!
//! [[rules]]
//! kind = "validate"
//! ```

pub mod logging;
pub mod rules;

pub use logging::{LogFormat, LoggingConfig};
pub use rules::RuleConfig;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterceptConfig {
    pub logging: LoggingConfig,
    /// Rewrite rules in chain order
    pub rules: Vec<RuleConfig>,
}

impl InterceptConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(input: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        debug!(
            path = %path.display(),
            rules = config.rules.len(),
            "loaded intercept config"
        );
        Ok(config)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.logging.validate()?;
        for (index, rule) in self.rules.iter().enumerate() {
            rule.validate().map_err(|e| {
                let detail = match e {
                    ConfigError::Invalid(msg) => msg,
                    other => other.to_string(),
                };
                ConfigError::invalid(format!("rules[{index}] ({}): {detail}", rule.kind()))
            })?;
        }
        Ok(())
    }
}
