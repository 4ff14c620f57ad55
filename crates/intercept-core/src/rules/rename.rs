//! Field renaming at the data source.

use crate::error::Result;
use crate::expr::Expr;
use crate::rule::RewriteRule;

/// Wraps matching scans in a `Rename`, so every query above the scan sees
/// field `from` under the name `to`.
///
/// Callers can then write queries against the new name while the engine
/// still stores the old one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameField {
    from: String,
    to: String,
    source: Option<String>,
}

impl RenameField {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            source: None,
        }
    }

    /// Restrict the rule to scans of one source (`None` for all scans)
    pub fn with_source(mut self, source: Option<String>) -> Self {
        self.source = source;
        self
    }

    fn applies_to(&self, source: &str) -> bool {
        self.source.as_deref().map_or(true, |s| s == source)
    }
}

impl RewriteRule for RenameField {
    fn name(&self) -> &str {
        "rename-field"
    }

    fn rewrite(&self, expr: Expr) -> Result<Expr> {
        expr.transform_up(&mut |node| match node {
            Expr::Scan { source, element } if self.applies_to(&source) => {
                Ok(Expr::Scan { source, element }.rename(&self.from, &self.to))
            }
            other => Ok(other),
        })
    }
}
