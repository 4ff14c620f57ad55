//! Mandatory filters on data sources.

use crate::error::Result;
use crate::expr::{Expr, Predicate};
use crate::rule::RewriteRule;

/// Wraps matching scans in a `Filter`, so no query can see elements outside
/// the scope (soft-deleted rows, other tenants, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeFilter {
    predicate: Predicate,
    source: Option<String>,
}

impl ScopeFilter {
    pub fn new(predicate: Predicate) -> Self {
        Self {
            predicate,
            source: None,
        }
    }

    /// Restrict the rule to scans of one source (`None` for all scans)
    pub fn with_source(mut self, source: Option<String>) -> Self {
        self.source = source;
        self
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }
}

impl RewriteRule for ScopeFilter {
    fn name(&self) -> &str {
        "scope-filter"
    }

    fn rewrite(&self, expr: Expr) -> Result<Expr> {
        expr.transform_up(&mut |node| match node {
            Expr::Scan { source, element }
                if self.source.as_deref().map_or(true, |s| s == source) =>
            {
                Ok(Expr::Scan { source, element }.filter(self.predicate.clone()))
            }
            other => Ok(other),
        })
    }
}
