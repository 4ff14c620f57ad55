//! Rewrite rules.
//!
//! A rule is a pure tree-to-tree function. Rules that do not recognise a
//! tree shape return it unchanged; they only fail with
//! [`InterceptError::TreeValidation`](crate::InterceptError::TreeValidation)
//! when the tree is structurally invalid.

use crate::error::Result;
use crate::expr::Expr;
use std::fmt;

/// One stage of the translation pipeline.
///
/// Rules must not keep shared mutable state: a provider is only safe to use
/// from several threads if all of its rules are.
pub trait RewriteRule: Send + Sync {
    /// Unique name for this rule
    fn name(&self) -> &str;

    /// Rewrite the tree
    fn rewrite(&self, expr: Expr) -> Result<Expr>;
}

/// A rule backed by a closure.
pub struct FnRule<F> {
    name: String,
    f: F,
}

impl<F> RewriteRule for FnRule<F>
where
    F: Fn(Expr) -> Result<Expr> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn rewrite(&self, expr: Expr) -> Result<Expr> {
        (self.f)(expr)
    }
}

impl<F> fmt::Debug for FnRule<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnRule").field("name", &self.name).finish()
    }
}

/// Build a rule from a closure
pub fn rule_fn<F>(name: impl Into<String>, f: F) -> FnRule<F>
where
    F: Fn(Expr) -> Result<Expr> + Send + Sync,
{
    FnRule {
        name: name.into(),
        f,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ElementType;

    #[test]
    fn test_fn_rule() {
        let rule = rule_fn("take-one", |expr: Expr| Ok(expr.take(1)));
        let input = Expr::scan("customers", ElementType::named("Customer"));

        assert_eq!(rule.name(), "take-one");
        assert_eq!(rule.rewrite(input.clone()).unwrap(), input.take(1));
    }
}
