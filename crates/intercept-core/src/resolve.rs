//! Self-reference resolution.
//!
//! Handles built by a provider start from an [`Expr::Origin`] node carrying
//! that provider's id instead of embedding the engine's source tree. Before
//! any user rule runs, [`ResolveOrigin`] swaps each such node for the stored
//! source tree, so rules never see a dangling self-reference.

use crate::error::Result;
use crate::expr::{Expr, OriginId};
use crate::rule::RewriteRule;

/// Replaces self-references to one origin with that origin's source tree.
///
/// Substituted source trees are not scanned again, and `Origin` nodes of
/// other providers are left in place. As long as the source tree does not
/// reference its own origin, running it twice is the same as running it
/// once.
#[derive(Debug, Clone)]
pub struct ResolveOrigin {
    origin: OriginId,
    source: Expr,
}

impl ResolveOrigin {
    pub fn new(origin: OriginId, source: Expr) -> Self {
        Self { origin, source }
    }

    pub fn origin(&self) -> OriginId {
        self.origin
    }

    /// The tree substituted for each self-reference
    pub fn source(&self) -> &Expr {
        &self.source
    }
}

impl RewriteRule for ResolveOrigin {
    fn name(&self) -> &str {
        "resolve-origin"
    }

    fn rewrite(&self, expr: Expr) -> Result<Expr> {
        expr.transform_up(&mut |node| match node {
            Expr::Origin { id, .. } if id == self.origin => Ok(self.source.clone()),
            other => Ok(other),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{ElementType, Predicate};

    fn customers() -> Expr {
        Expr::scan("customers", ElementType::named("Customer"))
    }

    fn element() -> ElementType {
        ElementType::named("Customer")
    }

    #[test]
    fn test_replaces_own_origin() {
        let id = OriginId::new();
        let resolve = ResolveOrigin::new(id, customers());
        let expr = Expr::origin(id, element()).filter(Predicate::eq("Name", "Ada"));

        let out = resolve.rewrite(expr).unwrap();
        assert_eq!(out, customers().filter(Predicate::eq("Name", "Ada")));
        assert!(out.origins().is_empty());
    }

    #[test]
    fn test_leaves_foreign_origin() {
        let own = OriginId::new();
        let foreign = OriginId::new();
        let resolve = ResolveOrigin::new(own, customers());
        let expr = Expr::origin(foreign, element()).take(1);

        assert_eq!(resolve.rewrite(expr.clone()).unwrap(), expr);
    }

    #[test]
    fn test_source_containing_origin_is_not_expanded() {
        // A source that itself points back at the origin must not recurse.
        let id = OriginId::new();
        let source = Expr::origin(id, element()).take(5);
        let resolve = ResolveOrigin::new(id, source.clone());

        let out = resolve.rewrite(Expr::origin(id, element())).unwrap();
        assert_eq!(out, source);
    }

    #[test]
    fn test_plain_tree_is_unchanged() {
        let resolve = ResolveOrigin::new(OriginId::new(), customers());
        let expr = customers().skip(2);

        assert_eq!(resolve.rewrite(expr.clone()).unwrap(), expr);
    }
}
