//! Bound query handles.
//!
//! A [`Query<T>`] is an inert value: composing it only builds a bigger tree
//! and a new handle bound to the same provider. The provider (and through it
//! the engine) is reached only when the handle is enumerated or a result is
//! requested.

use crate::element::Element;
use crate::engine::Enumerable;
use crate::error::Result;
use crate::expr::{ElementType, Expr, Predicate, SortDirection};
use crate::provider::{decode, TranslatingProvider};
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

/// A query tree bound to the provider that must execute it.
pub struct Query<T> {
    expr: Expr,
    provider: TranslatingProvider,
    _element: PhantomData<fn() -> T>,
}

impl<T: Element> Query<T> {
    pub(crate) fn new(expr: Expr, provider: TranslatingProvider) -> Self {
        Self {
            expr,
            provider,
            _element: PhantomData,
        }
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn into_expr(self) -> Expr {
        self.expr
    }

    pub fn provider(&self) -> &TranslatingProvider {
        &self.provider
    }

    /// Declared element type (`T::element_type()`)
    pub fn element_type(&self) -> ElementType {
        T::element_type()
    }

    fn compose<U: Element>(&self, expr: Expr) -> Query<U> {
        Query::new(expr, self.provider.clone())
    }

    pub fn filter(&self, predicate: Predicate) -> Self {
        self.compose(self.expr.clone().filter(predicate))
    }

    pub fn order_by(&self, field: impl Into<String>) -> Self {
        self.compose(self.expr.clone().order_by(field, SortDirection::Ascending))
    }

    pub fn order_by_desc(&self, field: impl Into<String>) -> Self {
        self.compose(self.expr.clone().order_by(field, SortDirection::Descending))
    }

    pub fn skip(&self, count: usize) -> Self {
        self.compose(self.expr.clone().skip(count))
    }

    pub fn take(&self, count: usize) -> Self {
        self.compose(self.expr.clone().take(count))
    }

    /// Keep only `fields`, viewing the result as elements of type `U`
    pub fn project<U, I, S>(&self, fields: I) -> Query<U>
    where
        U: Element,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.compose(self.expr.clone().project(fields, U::element_type()))
    }

    /// Run the tree eagerly and return the engine's raw value
    pub fn execute(&self) -> Result<Value> {
        self.provider.execute(self.expr.clone())
    }

    /// Enumerate lazily; the returned sequence can be iterated repeatedly
    pub fn iter(&self) -> Result<Elements<T>> {
        let inner = self.provider.execute_lazy(self.expr.clone())?;
        Ok(Elements {
            inner,
            _element: PhantomData,
        })
    }

    /// Enumerate and collect every element
    pub fn to_vec(&self) -> Result<Vec<T>> {
        self.iter()?.iter().collect()
    }

    pub fn count(&self) -> Result<u64> {
        self.provider.execute_typed(self.expr.clone().count())
    }

    pub fn any(&self) -> Result<bool> {
        self.provider.execute_typed(self.expr.clone().any())
    }

    pub fn first(&self) -> Result<Option<T>> {
        self.provider.execute_typed(self.expr.clone().first())
    }
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            expr: self.expr.clone(),
            provider: self.provider.clone(),
            _element: PhantomData,
        }
    }
}

/// Handles are equal when their trees are equal and they share a provider.
impl<T> PartialEq for Query<T> {
    fn eq(&self, other: &Self) -> bool {
        self.provider.id() == other.provider.id() && self.expr == other.expr
    }
}

impl<T: Element> fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("element", &T::NAME)
            .field("provider", &self.provider.id())
            .field("expr", &self.expr)
            .finish()
    }
}

/// Lazily decoded elements of an enumerated query.
pub struct Elements<T> {
    inner: Box<dyn Enumerable>,
    _element: PhantomData<fn() -> T>,
}

impl<T: Element> Elements<T> {
    /// Start a fresh pass over the engine's sequence
    pub fn iter(&self) -> impl Iterator<Item = Result<T>> + '_ {
        self.inner.iter().map(|item| item.and_then(decode::<T>))
    }
}

/// A type-erased [`Query<T>`], as returned by the untyped entry point.
pub trait AnyQuery: Send + Sync + fmt::Debug {
    fn element_type(&self) -> ElementType;

    fn expr(&self) -> &Expr;

    fn provider(&self) -> &TranslatingProvider;

    /// Run the tree eagerly
    fn execute(&self) -> Result<Value>;

    /// Enumerate without decoding elements
    fn enumerate(&self) -> Result<Box<dyn Enumerable>>;

    fn as_any(&self) -> &dyn Any;
}

impl dyn AnyQuery {
    /// Recover the typed handle
    pub fn downcast_ref<T: Element>(&self) -> Option<&Query<T>> {
        self.as_any().downcast_ref::<Query<T>>()
    }
}

impl<T: Element> AnyQuery for Query<T> {
    fn element_type(&self) -> ElementType {
        T::element_type()
    }

    fn expr(&self) -> &Expr {
        &self.expr
    }

    fn provider(&self) -> &TranslatingProvider {
        &self.provider
    }

    fn execute(&self) -> Result<Value> {
        self.provider.execute(self.expr.clone())
    }

    fn enumerate(&self) -> Result<Box<dyn Enumerable>> {
        self.provider.execute_lazy(self.expr.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::RuleChain;
    use crate::engine::QueryEngine;
    use crate::error::InterceptError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Engine that fails every call and counts how often it was reached
    struct Refusing {
        source: Expr,
        calls: AtomicUsize,
    }

    impl QueryEngine for Refusing {
        fn source(&self) -> &Expr {
            &self.source
        }

        fn execute(&self, _expr: Expr) -> Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(InterceptError::engine("refused"))
        }

        fn enumerate(&self, _expr: Expr) -> Result<Box<dyn Enumerable>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(InterceptError::engine("refused"))
        }
    }

    fn provider() -> (Arc<Refusing>, TranslatingProvider) {
        let engine = Arc::new(Refusing {
            source: Expr::scan("rows", ElementType::named("json")),
            calls: AtomicUsize::new(0),
        });
        let provider = TranslatingProvider::new(engine.clone(), RuleChain::empty());
        (engine, provider)
    }

    #[test]
    fn test_composition_never_reaches_engine() {
        let (engine, provider) = provider();

        let mut query = provider.root::<Value>();
        for i in 0..10 {
            query = query.filter(Predicate::gt("n", i)).skip(1).order_by("n");
        }
        let _projected: Query<Value> = query.take(3).project(["n"]);

        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_composition_wraps_prior_tree() {
        let (_engine, provider) = provider();
        let root = provider.root::<Value>();
        let filtered = root.filter(Predicate::eq("n", 1));

        assert_eq!(filtered.expr().input(), Some(root.expr()));
        assert_eq!(filtered.provider().id(), provider.id());
    }

    #[test]
    fn test_equal_trees_same_provider_are_equal() {
        let (_engine, provider) = provider();
        let a = provider.root::<Value>().take(2);
        let b = provider.create_query::<Value>(a.expr().clone()).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_same_tree_other_provider_differs() {
        let (_engine, first) = provider();
        let (_engine2, second) = provider();
        let tree = Expr::scan("rows", ElementType::named("json"));

        let a = first.create_query::<Value>(tree.clone()).unwrap();
        let b = second.create_query::<Value>(tree).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_engine_error_propagates_unchanged() {
        let (engine, provider) = provider();
        let query = provider.root::<Value>();

        let err = query.count().unwrap_err();
        assert!(err.is_engine());
        assert_eq!(err.to_string(), "refused");
        assert!(query.iter().is_err());
        assert_eq!(engine.calls.load(Ordering::SeqCst), 2);
    }
}
