//! The translating provider.
//!
//! ## Translation
//!
//! Every `execute*` call runs the same pipeline before anything reaches the
//! engine:
//!
//! 1. **Resolve**: self-references to this provider are replaced with the
//!    engine's source tree ([`ResolveOrigin`])
//! 2. **Rewrite**: the rule chain runs in order
//! 3. **Forward**: the final tree goes to the engine verbatim and the engine's
//!    answer comes back untouched
//!
//! ```text
//! Query<T> ──compose──> Query<T> ──execute──> TranslatingProvider
//!                                               ├─> ResolveOrigin
//!                                               ├─> RuleChain (r1 → r2 → …)
//!                                               └─> QueryEngine
//! ```

use crate::chain::RuleChain;
use crate::element::Element;
use crate::engine::{Enumerable, QueryEngine};
use crate::error::{InterceptError, Result};
use crate::expr::{ElementType, Expr, OriginId, ResultType};
use crate::query::{AnyQuery, Query};
use crate::registry::ElementRegistry;
use crate::resolve::ResolveOrigin;
use crate::rule::RewriteRule;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Intercepts queries bound to it and rewrites them before forwarding them
/// to the underlying engine.
///
/// Cheap to clone; clones are the same provider (same origin id, engine and
/// rules).
#[derive(Clone)]
pub struct TranslatingProvider {
    inner: Arc<ProviderInner>,
}

struct ProviderInner {
    engine: Arc<dyn QueryEngine>,
    resolve: ResolveOrigin,
    rules: RuleChain,
    registry: ElementRegistry,
}

impl TranslatingProvider {
    /// Create a provider over `engine` with the given rule chain
    pub fn new(engine: Arc<dyn QueryEngine>, rules: RuleChain) -> Self {
        Self::from_parts(engine, rules, ElementRegistry::new())
    }

    pub fn builder() -> ProviderBuilder {
        ProviderBuilder::new()
    }

    fn from_parts(
        engine: Arc<dyn QueryEngine>,
        rules: RuleChain,
        registry: ElementRegistry,
    ) -> Self {
        let origin = OriginId::new();
        let resolve = ResolveOrigin::new(origin, engine.source().clone());

        debug!(
            %origin,
            engine = engine.name(),
            rules = ?rules,
            "built translating provider"
        );

        Self {
            inner: Arc::new(ProviderInner {
                engine,
                resolve,
                rules,
                registry,
            }),
        }
    }

    /// Identifier carried by this provider's self-reference nodes
    pub fn id(&self) -> OriginId {
        self.inner.resolve.origin()
    }

    pub fn rules(&self) -> &RuleChain {
        &self.inner.rules
    }

    pub fn engine(&self) -> &Arc<dyn QueryEngine> {
        &self.inner.engine
    }

    pub fn registry(&self) -> &ElementRegistry {
        &self.inner.registry
    }

    /// The engine source tree captured at construction
    pub fn source(&self) -> &Expr {
        self.inner.resolve.source()
    }

    /// The root handle: a self-reference to the engine's source query
    pub fn root<T: Element>(&self) -> Query<T> {
        Query::new(Expr::origin(self.id(), T::element_type()), self.clone())
    }

    /// Root handle typed from the source tree's declared element type
    pub fn root_untyped(&self) -> Result<Box<dyn AnyQuery>> {
        let element = sequence_element(self.source())?;
        self.create_query_untyped(Expr::origin(self.id(), element))
    }

    /// Bind a tree to this provider with element type `T`.
    ///
    /// Nothing is rewritten until the handle is executed.
    pub fn create_query<T: Element>(&self, tree: impl Into<Option<Expr>>) -> Result<Query<T>> {
        let expr = require_tree(tree.into())?;
        Ok(Query::new(expr, self.clone()))
    }

    /// Bind a tree whose element type is only known from the tree itself.
    ///
    /// The tree must declare a sequence of a named element type registered
    /// with this provider; otherwise `TypeResolution` is returned.
    pub fn create_query_untyped(
        &self,
        tree: impl Into<Option<Expr>>,
    ) -> Result<Box<dyn AnyQuery>> {
        let expr = require_tree(tree.into())?;
        let element = sequence_element(&expr)?;
        self.inner.registry.construct(&element, expr, self.clone())
    }

    /// Resolve self-references to this provider
    pub fn resolve_self_references(&self, expr: Expr) -> Result<Expr> {
        self.inner.resolve.rewrite(expr)
    }

    /// Run the full translation: self-reference resolution, then every rule
    /// in order.
    pub fn translate(&self, expr: Expr) -> Result<Expr> {
        let resolved = self.resolve_self_references(expr)?;
        self.inner.rules.apply(resolved)
    }

    /// Translate and execute eagerly, returning the engine's value unchanged
    pub fn execute(&self, tree: impl Into<Option<Expr>>) -> Result<Value> {
        let translated = self.translate(require_tree(tree.into())?)?;
        debug!(
            origin = %self.id(),
            op = translated.op_name(),
            "forwarding translated tree for execution"
        );
        self.inner.engine.execute(translated)
    }

    /// Like [`execute`](Self::execute), viewing the result as `R`
    pub fn execute_typed<R: DeserializeOwned>(
        &self,
        tree: impl Into<Option<Expr>>,
    ) -> Result<R> {
        decode(self.execute(tree)?)
    }

    /// Translate and hand the tree to the engine's lazy entry point.
    ///
    /// The engine's sequence is returned as-is, without buffering.
    pub fn execute_lazy(
        &self,
        tree: impl Into<Option<Expr>>,
    ) -> Result<Box<dyn Enumerable>> {
        let translated = self.translate(require_tree(tree.into())?)?;
        debug!(
            origin = %self.id(),
            op = translated.op_name(),
            "forwarding translated tree for enumeration"
        );
        self.inner.engine.enumerate(translated)
    }
}

impl fmt::Debug for TranslatingProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslatingProvider")
            .field("id", &self.id())
            .field("engine", &self.inner.engine.name())
            .field("rules", &self.inner.rules)
            .field("registry", &self.inner.registry)
            .finish()
    }
}

/// Builder for providers that need registered element types
#[derive(Default)]
pub struct ProviderBuilder {
    engine: Option<Arc<dyn QueryEngine>>,
    rules: RuleChain,
    registry: ElementRegistry,
}

impl ProviderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn engine(mut self, engine: Arc<dyn QueryEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Rule chain to apply (defaults to the empty chain)
    pub fn rules(mut self, rules: RuleChain) -> Self {
        self.rules = rules;
        self
    }

    /// Register an element type for the untyped entry point
    pub fn register<T: Element>(mut self) -> Self {
        self.registry.register::<T>();
        self
    }

    pub fn registry(mut self, registry: ElementRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Build the provider; fails if no engine was supplied
    pub fn build(self) -> Result<TranslatingProvider> {
        let engine = self
            .engine
            .ok_or_else(|| InterceptError::invalid_argument("engine must be provided"))?;
        Ok(TranslatingProvider::from_parts(
            engine,
            self.rules,
            self.registry,
        ))
    }
}

fn require_tree(tree: Option<Expr>) -> Result<Expr> {
    tree.ok_or_else(|| InterceptError::invalid_argument("tree must not be absent"))
}

/// Element type of a tree declaring a sequence of named elements
fn sequence_element(expr: &Expr) -> Result<ElementType> {
    match expr.result_type() {
        ResultType::Sequence(element @ ElementType::Named(_)) => Ok(element),
        ResultType::Sequence(ElementType::Record) => Err(InterceptError::type_resolution(
            format!("'{}' produces anonymous records", expr.op_name()),
        )),
        other => Err(InterceptError::type_resolution(format!(
            "'{}' does not produce a sequence (declares {other:?})",
            expr.op_name()
        ))),
    }
}

/// View an engine value as `T`
pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| InterceptError::type_mismatch::<T>(e.to_string()))
}
