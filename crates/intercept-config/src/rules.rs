//! Rule chain description.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Spellings accepted for `cmp`, case-insensitive
pub const COMPARISONS: &[&str] = &[
    "eq", "=", "==", "ne", "!=", "<>", "lt", "<", "le", "<=", "gt", ">", "ge", ">=",
];

fn default_cmp() -> String {
    "eq".to_string()
}

/// One entry of the `[[rules]]` array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RuleConfig {
    /// Expose field `from` of scanned elements as `to`
    RenameField {
        from: String,
        to: String,
        /// Only scans of this source (all scans when absent)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source: Option<String>,
    },

    /// Restrict scanned elements to those matching `field <cmp> value`
    ScopeFilter {
        field: String,
        #[serde(default = "default_cmp")]
        cmp: String,
        value: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source: Option<String>,
    },

    /// Reject structurally invalid trees
    Validate,
}

impl RuleConfig {
    /// The rule kind as written in config files
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RenameField { .. } => "rename-field",
            Self::ScopeFilter { .. } => "scope-filter",
            Self::Validate => "validate",
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        match self {
            Self::RenameField { from, to, source } => {
                require_name("from", from)?;
                require_name("to", to)?;
                if let Some(source) = source {
                    require_name("source", source)?;
                }
            }
            Self::ScopeFilter {
                field, cmp, source, ..
            } => {
                require_name("field", field)?;
                if !COMPARISONS.contains(&cmp.trim().to_lowercase().as_str()) {
                    return Err(ConfigError::invalid(format!(
                        "unknown comparison '{cmp}' (expected one of {})",
                        COMPARISONS.join(", ")
                    )));
                }
                if let Some(source) = source {
                    require_name("source", source)?;
                }
            }
            Self::Validate => {}
        }
        Ok(())
    }
}

fn require_name(key: &str, value: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        Err(ConfigError::invalid(format!("'{key}' must not be empty")))
    } else {
        Ok(())
    }
}
