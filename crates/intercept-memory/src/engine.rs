//! The in-memory engine

use crate::eval::{self, Tables};
use intercept_core::{ElementType, Enumerable, Expr, QueryEngine, Result};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// A table of rows together with the source it is exposed under.
///
/// This is the on-disk shape read by the CLI:
///
/// ```json
/// { "source": "customers", "element": "Customer", "rows": [ { "Name": "Ada" } ] }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Dataset {
    pub source: String,
    #[serde(default)]
    pub element: Option<String>,
    #[serde(default)]
    pub rows: Vec<Value>,
}

#[derive(Default)]
struct Stats {
    executed: AtomicUsize,
    enumerated: AtomicUsize,
    recording: bool,
    received: Mutex<Vec<Expr>>,
}

/// Evaluates trees against named tables of JSON rows.
///
/// Calls to `execute` and `enumerate` are always counted. The trees
/// themselves are kept only after [`MemoryEngine::recording`], which is
/// meant for tests that inspect exactly what arrived after translation.
pub struct MemoryEngine {
    source: Expr,
    tables: Arc<Tables>,
    stats: Stats,
}

impl MemoryEngine {
    /// An engine whose source query is `source`, with no tables yet
    pub fn new(source: Expr) -> Self {
        Self {
            source,
            tables: Arc::new(HashMap::new()),
            stats: Stats::default(),
        }
    }

    /// Engine over a single dataset; the source query scans it
    pub fn from_dataset(dataset: Dataset) -> Self {
        let element = dataset
            .element
            .map(ElementType::named)
            .unwrap_or(ElementType::Record);
        let source = Expr::scan(dataset.source.clone(), element);
        Self::new(source).with_table(dataset.source, dataset.rows)
    }

    /// Keep every received tree, see [`received`](Self::received)
    pub fn recording(mut self) -> Self {
        self.stats.recording = true;
        self
    }

    pub fn with_table(mut self, name: impl Into<String>, rows: Vec<Value>) -> Self {
        Arc::make_mut(&mut self.tables).insert(name.into(), rows);
        self
    }

    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn execute_count(&self) -> usize {
        self.stats.executed.load(Ordering::SeqCst)
    }

    pub fn enumerate_count(&self) -> usize {
        self.stats.enumerated.load(Ordering::SeqCst)
    }

    /// Every tree received while recording, oldest first
    pub fn received(&self) -> Vec<Expr> {
        self.stats.received.lock().clone()
    }

    pub fn last_received(&self) -> Option<Expr> {
        self.stats.received.lock().last().cloned()
    }

    pub fn clear_received(&self) {
        self.stats.received.lock().clear();
    }

    fn record(&self, expr: &Expr) {
        if self.stats.recording {
            self.stats.received.lock().push(expr.clone());
        }
    }
}

impl QueryEngine for MemoryEngine {
    fn source(&self) -> &Expr {
        &self.source
    }

    fn execute(&self, expr: Expr) -> Result<Value> {
        self.stats.executed.fetch_add(1, Ordering::SeqCst);
        self.record(&expr);
        debug!(op = expr.op_name(), depth = expr.depth(), "executing tree");
        eval::value(&self.tables, &expr)
    }

    fn enumerate(&self, expr: Expr) -> Result<Box<dyn Enumerable>> {
        self.stats.enumerated.fetch_add(1, Ordering::SeqCst);
        self.record(&expr);
        debug!(op = expr.op_name(), depth = expr.depth(), "enumerating tree");
        Ok(Box::new(MemorySequence {
            tables: Arc::clone(&self.tables),
            expr,
        }))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Lazy result of [`MemoryEngine::enumerate`].
///
/// Each pass re-evaluates the tree against the table snapshot taken when
/// the sequence was created.
struct MemorySequence {
    tables: Arc<Tables>,
    expr: Expr,
}

impl Enumerable for MemorySequence {
    fn iter(&self) -> Box<dyn Iterator<Item = Result<Value>> + '_> {
        match eval::rows(&self.tables, &self.expr) {
            Ok(rows) => rows,
            Err(err) => Box::new(std::iter::once(Err(err))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intercept_core::Predicate;
    use serde_json::json;

    fn engine() -> MemoryEngine {
        MemoryEngine::from_dataset(Dataset {
            source: "people".into(),
            element: Some("Person".into()),
            rows: vec![json!({ "Name": "Ada" }), json!({ "Name": "Grace" })],
        })
        .recording()
    }

    #[test]
    fn test_from_dataset_scans_its_table() {
        let engine = engine();
        assert_eq!(
            engine.source(),
            &Expr::scan("people", ElementType::named("Person"))
        );
        assert_eq!(engine.table_names(), vec!["people"]);
    }

    #[test]
    fn test_execute_records_tree() {
        let engine = engine();
        let expr = engine.source().clone().filter(Predicate::eq("Name", "Ada"));

        let out = engine.execute(expr.clone()).unwrap();

        assert_eq!(out, json!([{ "Name": "Ada" }]));
        assert_eq!(engine.execute_count(), 1);
        assert_eq!(engine.enumerate_count(), 0);
        assert_eq!(engine.last_received(), Some(expr));
    }

    #[test]
    fn test_trees_are_kept_only_while_recording() {
        let quiet = MemoryEngine::new(Expr::scan("t", ElementType::Record))
            .with_table("t", Vec::new());
        quiet.execute(quiet.source().clone()).unwrap();
        quiet.enumerate(quiet.source().clone()).unwrap();
        assert_eq!(quiet.execute_count(), 1);
        assert_eq!(quiet.enumerate_count(), 1);
        assert!(quiet.received().is_empty());

        let recorded = engine();
        recorded.execute(recorded.source().clone()).unwrap();
        assert_eq!(recorded.received().len(), 1);
        recorded.clear_received();
        assert!(recorded.received().is_empty());
        assert_eq!(recorded.last_received(), None);
        assert_eq!(recorded.execute_count(), 1);
    }

    #[test]
    fn test_enumerate_is_restartable() {
        let engine = engine();
        let seq = engine.enumerate(engine.source().clone()).unwrap();

        let first: Vec<Value> = seq.iter().map(|v| v.unwrap()).collect();
        let second: Vec<Value> = seq.iter().map(|v| v.unwrap()).collect();

        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
        assert_eq!(engine.enumerate_count(), 1);
    }

    #[test]
    fn test_enumerate_error_surfaces_on_iteration() {
        let engine = engine();
        let seq = engine
            .enumerate(Expr::scan("missing", ElementType::Record))
            .unwrap();

        let items: Vec<Result<Value>> = seq.iter().collect();
        assert_eq!(items.len(), 1);
        assert!(items[0].as_ref().unwrap_err().is_engine());
    }

    #[test]
    fn test_dataset_defaults() {
        let dataset: Dataset = serde_json::from_value(json!({ "source": "t" })).unwrap();
        let engine = MemoryEngine::from_dataset(dataset);
        assert_eq!(engine.source(), &Expr::scan("t", ElementType::Record));
        assert_eq!(engine.execute(engine.source().clone()).unwrap(), json!([]));
    }
}
