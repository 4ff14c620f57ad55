//! Element registry for the untyped entry point.
//!
//! Typed handles are chosen at compile time (`Query<T>`). Only callers that
//! hold nothing but a tree go through this registry, which maps the tree's
//! declared element name to a constructor for the matching `Query<T>`.

use crate::element::Element;
use crate::error::{InterceptError, Result};
use crate::expr::{ElementType, Expr};
use crate::provider::TranslatingProvider;
use crate::query::{AnyQuery, Query};
use std::collections::HashMap;
use std::fmt;

/// Builds a type-erased handle for one element type
pub type QueryConstructor = fn(Expr, TranslatingProvider) -> Box<dyn AnyQuery>;

fn construct<T: Element>(expr: Expr, provider: TranslatingProvider) -> Box<dyn AnyQuery> {
    Box::new(Query::<T>::new(expr, provider))
}

/// Dispatch table from element name to handle constructor.
#[derive(Clone, Default)]
pub struct ElementRegistry {
    constructors: HashMap<String, QueryConstructor>,
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under `T::NAME` (replaces any previous entry)
    pub fn register<T: Element>(&mut self) {
        self.constructors.insert(T::NAME.to_string(), construct::<T>);
    }

    /// Builder-style registration
    pub fn with<T: Element>(mut self) -> Self {
        self.register::<T>();
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered element names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Build a handle for `element`, failing if it has no registered type
    pub fn construct(
        &self,
        element: &ElementType,
        expr: Expr,
        provider: TranslatingProvider,
    ) -> Result<Box<dyn AnyQuery>> {
        let name = element.name().ok_or_else(|| {
            InterceptError::type_resolution("anonymous record elements have no concrete type")
        })?;
        let constructor = self.constructors.get(name).ok_or_else(|| {
            InterceptError::type_resolution(format!(
                "no element type registered for '{name}' (registered: {})",
                self.names().join(", ")
            ))
        })?;
        Ok(constructor(expr, provider))
    }
}

impl fmt::Debug for ElementRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Order {
        #[allow(dead_code)]
        id: u64,
    }

    impl Element for Order {
        const NAME: &'static str = "Order";
    }

    #[test]
    fn test_register_and_list() {
        let registry = ElementRegistry::new()
            .with::<Order>()
            .with::<serde_json::Value>();

        assert!(registry.contains("Order"));
        assert_eq!(registry.names(), vec!["Order", "json"]);
    }
}
