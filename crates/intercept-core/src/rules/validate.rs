//! Validation rule.
//!
//! Checks that a tree is well-formed before it reaches the engine.

use crate::error::{InterceptError, Result};
use crate::expr::Expr;
use crate::rule::RewriteRule;

/// Rejects structurally invalid trees; valid trees pass through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validate;

impl Validate {
    fn check(&self, node: &Expr) -> std::result::Result<(), String> {
        match node {
            Expr::Scan { source, .. } if source.trim().is_empty() => {
                Err("scan has an empty source name".to_string())
            }
            Expr::Project { fields, .. } if fields.is_empty() => {
                Err("projection has no fields".to_string())
            }
            Expr::Project { fields, .. } => require_fields(fields.iter().map(String::as_str)),
            Expr::Filter { predicate, .. } => require_fields(predicate.fields()),
            Expr::Rename { from, to, .. } => require_fields([from.as_str(), to.as_str()]),
            Expr::OrderBy { field, .. } => require_fields([field.as_str()]),
            _ => Ok(()),
        }
    }
}

fn require_fields<'a>(
    fields: impl IntoIterator<Item = &'a str>,
) -> std::result::Result<(), String> {
    if fields.into_iter().any(|f| f.trim().is_empty()) {
        Err("empty field name".to_string())
    } else {
        Ok(())
    }
}

impl RewriteRule for Validate {
    fn name(&self) -> &str {
        "validate"
    }

    fn rewrite(&self, expr: Expr) -> Result<Expr> {
        let mut failure = None;
        expr.walk(&mut |node| {
            if failure.is_none() {
                if let Err(message) = self.check(node) {
                    failure = Some(format!("{}: {message}", node.op_name()));
                }
            }
        });

        match failure {
            Some(message) => Err(InterceptError::tree_validation(self.name(), message)),
            None => Ok(expr),
        }
    }
}
