//! Built-in rewrite rules.
//!
//! Rule chains are usually supplied by the caller; these cover the common
//! interception needs and can be chained from a config file with
//! [`chain_from_config`].

mod rename;
mod scope;
mod validate;

pub use rename::RenameField;
pub use scope::ScopeFilter;
pub use validate::Validate;

use crate::chain::RuleChain;
use crate::error::Result;
use crate::expr::{Comparison, Predicate};
use crate::rule::RewriteRule;
use intercept_config::RuleConfig;
use std::sync::Arc;

/// Build a single rule from its config entry
pub fn rule_from_config(config: &RuleConfig) -> Result<Arc<dyn RewriteRule>> {
    let rule: Arc<dyn RewriteRule> = match config {
        RuleConfig::RenameField { from, to, source } => {
            Arc::new(RenameField::new(from, to).with_source(source.clone()))
        }
        RuleConfig::ScopeFilter {
            field,
            cmp,
            value,
            source,
        } => {
            let cmp: Comparison = cmp.parse()?;
            let predicate = Predicate::compare(field, cmp, value.clone());
            Arc::new(ScopeFilter::new(predicate).with_source(source.clone()))
        }
        RuleConfig::Validate => Arc::new(Validate),
    };
    Ok(rule)
}

/// Build a rule chain from config entries, keeping their order
pub fn chain_from_config(configs: &[RuleConfig]) -> Result<RuleChain> {
    let rules = configs
        .iter()
        .map(rule_from_config)
        .collect::<Result<Vec<_>>>()?;
    Ok(RuleChain::new(rules))
}
