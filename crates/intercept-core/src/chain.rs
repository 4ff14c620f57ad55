//! Ordered rule chains.

use crate::error::Result;
use crate::expr::Expr;
use crate::rule::RewriteRule;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// An ordered, immutable sequence of rewrite rules.
///
/// Order is fixed at construction and every rule runs on every
/// translation. Cloning is cheap and clones share the same rules, so one
/// chain can back any number of providers.
#[derive(Clone)]
pub struct RuleChain {
    rules: Arc<[Arc<dyn RewriteRule>]>,
}

impl Default for RuleChain {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl RuleChain {
    pub fn new(rules: Vec<Arc<dyn RewriteRule>>) -> Self {
        Self {
            rules: rules.into(),
        }
    }

    /// The identity chain
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> RuleChainBuilder {
        RuleChainBuilder::new()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rule names in chain order
    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn rules(&self) -> impl Iterator<Item = &Arc<dyn RewriteRule>> {
        self.rules.iter()
    }

    /// Feed the tree through every rule in order.
    ///
    /// The first error stops the chain and is returned unchanged.
    pub fn apply(&self, expr: Expr) -> Result<Expr> {
        self.rules.iter().try_fold(expr, |expr, rule| {
            trace!(rule = rule.name(), op = expr.op_name(), "applying rewrite rule");
            rule.rewrite(expr)
        })
    }
}

impl fmt::Debug for RuleChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Builder for ergonomic chain construction
#[derive(Default)]
pub struct RuleChainBuilder {
    rules: Vec<Arc<dyn RewriteRule>>,
}

impl RuleChainBuilder {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule to the chain
    pub fn with_rule(mut self, rule: impl RewriteRule + 'static) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Append a rule that is shared with other chains
    pub fn with_shared(mut self, rule: Arc<dyn RewriteRule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn build(self) -> RuleChain {
        RuleChain::new(self.rules)
    }
}
