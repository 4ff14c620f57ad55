//! Logging configuration
//!
//! The config only describes logging; binaries install the subscriber.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};

const LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of off, error, warn, info, debug, trace
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
    Pretty,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if LEVELS.contains(&self.level.to_lowercase().as_str()) {
            Ok(())
        } else {
            Err(ConfigError::invalid(format!(
                "unknown log level '{}' (expected one of {})",
                self.level,
                LEVELS.join(", ")
            )))
        }
    }

    /// Filter directive for the intercept crates at the configured level
    pub fn directive(&self) -> String {
        let level = self.level.to_lowercase();
        ["intercept_core", "intercept_config", "intercept_memory", "intercept_cli"]
            .iter()
            .map(|krate| format!("{krate}={level}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}
