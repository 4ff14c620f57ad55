//! Contract for the engine that finally executes translated trees.
//!
//! The pipeline never looks inside what the engine returns: eager results
//! are handed back as-is and lazy sequences are returned without buffering.

use crate::error::Result;
use crate::expr::Expr;
use serde_json::Value;

/// A restartable sequence of values.
///
/// Each call to [`Enumerable::iter`] starts a fresh pass. Whether the
/// sequence is finite is up to the engine that produced it.
pub trait Enumerable: Send + Sync {
    fn iter(&self) -> Box<dyn Iterator<Item = Result<Value>> + '_>;
}

/// The underlying query engine.
///
/// The pipeline calls `execute` or `enumerate` exactly once per request and
/// never retries or caches.
pub trait QueryEngine: Send + Sync {
    /// The engine's own source query, substituted for self-references
    fn source(&self) -> &Expr;

    /// Run the tree eagerly and return its result
    fn execute(&self, expr: Expr) -> Result<Value>;

    /// Build a lazy sequence for the tree
    fn enumerate(&self, expr: Expr) -> Result<Box<dyn Enumerable>>;

    /// Engine name for logging
    fn name(&self) -> &str {
        "engine"
    }
}

/// A sequence backed by values already in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueSequence {
    values: Vec<Value>,
}

impl ValueSequence {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Enumerable for ValueSequence {
    fn iter(&self) -> Box<dyn Iterator<Item = Result<Value>> + '_> {
        Box::new(self.values.iter().cloned().map(Ok))
    }
}

impl From<Vec<Value>> for ValueSequence {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}
