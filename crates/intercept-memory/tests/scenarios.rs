//! End-to-end interception scenarios over the in-memory engine

use intercept_config::InterceptConfig;
use intercept_core::rules::{chain_from_config, RenameField, Validate};
use intercept_core::{
    rule_fn, Element, ElementType, Enumerable, Expr, InterceptError, Predicate, QueryEngine,
    Result, RuleChain, TranslatingProvider,
};
use intercept_memory::{MemoryEngine, MemoryError};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Customer {
    full_name: String,
    age: u32,
}

impl Element for Customer {
    const NAME: &'static str = "Customer";
}

fn customers() -> Arc<MemoryEngine> {
    let source = Expr::scan("customers", ElementType::named("Customer"));
    let rows = vec![
        json!({ "Name": "Ada Lovelace", "Age": 36 }),
        json!({ "Name": "Grace Hopper", "Age": 85 }),
        json!({ "Name": "Alan Turing", "Age": 41 }),
    ];
    Arc::new(
        MemoryEngine::new(source)
            .with_table("customers", rows)
            .recording(),
    )
}

#[test]
fn test_rename_rule_reaches_engine_once() {
    let engine = customers();
    let rules = RuleChain::builder()
        .with_rule(RenameField::new("Name", "FullName"))
        .build();
    let provider = TranslatingProvider::new(engine.clone(), rules);

    let query = provider
        .root::<Customer>()
        .filter(Predicate::eq("FullName", "Ada Lovelace"));
    let result = provider.execute(query.expr().clone()).unwrap();

    let expected = engine
        .source()
        .clone()
        .rename("Name", "FullName")
        .filter(Predicate::eq("FullName", "Ada Lovelace"));
    assert_eq!(engine.received(), vec![expected.clone()]);
    assert_eq!(engine.execute_count(), 1);

    // The engine's answer is handed back untouched
    let direct = MemoryEngine::new(engine.source().clone())
        .with_table("customers", vec![json!({ "Name": "Ada Lovelace", "Age": 36 })]);
    assert_eq!(result, direct.execute(expected).unwrap());
}

#[test]
fn test_typed_results_see_rewritten_fields() {
    let rules = RuleChain::builder()
        .with_rule(RenameField::new("Name", "FullName"))
        .build();
    let provider = TranslatingProvider::new(customers(), rules);

    let oldest = provider
        .root::<Customer>()
        .order_by_desc("Age")
        .first()
        .unwrap();
    assert_eq!(
        oldest,
        Some(Customer {
            full_name: "Grace Hopper".into(),
            age: 85,
        })
    );

    let over_forty = provider.root::<Customer>().filter(Predicate::gt("Age", 40));
    assert_eq!(over_forty.count().unwrap(), 2);
    assert!(over_forty.any().unwrap());
}

#[test]
fn test_empty_chain_lazy_matches_direct_engine() {
    let engine = customers();
    let provider = TranslatingProvider::new(engine.clone(), RuleChain::empty());

    let query = provider.root::<Value>().filter(Predicate::lt("Age", 50)).skip(1);
    let lazy = provider.execute_lazy(query.expr().clone()).unwrap();

    let resolved = provider.resolve_self_references(query.expr().clone()).unwrap();
    assert_eq!(engine.last_received(), Some(resolved.clone()));
    let direct = engine.enumerate(resolved).unwrap();

    let first: Vec<Value> = lazy.iter().map(|v| v.unwrap()).collect();
    let second: Vec<Value> = lazy.iter().map(|v| v.unwrap()).collect();
    let expected: Vec<Value> = direct.iter().map(|v| v.unwrap()).collect();
    assert_eq!(first, vec![json!({ "Name": "Alan Turing", "Age": 41 })]);
    assert_eq!(first, second);
    assert_eq!(first, expected);
}

#[test]
fn test_composition_is_inert() {
    let engine = customers();
    let provider = TranslatingProvider::new(engine.clone(), RuleChain::empty());

    let _ = provider
        .root::<Customer>()
        .filter(Predicate::eq("Name", "Ada Lovelace"))
        .order_by("Age")
        .skip(1)
        .take(10);

    assert_eq!(engine.execute_count(), 0);
    assert_eq!(engine.enumerate_count(), 0);
    assert!(engine.received().is_empty());
}

#[test]
fn test_absent_tree_does_no_work() {
    let engine = customers();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let rules = RuleChain::builder()
        .with_rule(rule_fn("count", move |e: Expr| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(e)
        }))
        .build();
    let provider = TranslatingProvider::new(engine.clone(), rules);

    let err = provider.create_query::<Customer>(None).unwrap_err();
    assert!(matches!(err, InterceptError::InvalidArgument(_)));
    assert!(matches!(
        provider.execute(None),
        Err(InterceptError::InvalidArgument(_))
    ));

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(engine.received().is_empty());
}

#[test]
fn test_untyped_entry_point_uses_registered_type() {
    let provider = TranslatingProvider::builder()
        .engine(customers())
        .register::<Customer>()
        .build()
        .unwrap();

    let any = provider.root_untyped().unwrap();
    assert_eq!(any.element_type(), ElementType::named("Customer"));
    assert!(any.downcast_ref::<Customer>().is_some());
    assert!(any.downcast_ref::<Value>().is_none());

    let unregistered = Expr::scan("orders", ElementType::named("Order"));
    assert!(matches!(
        provider.create_query_untyped(unregistered),
        Err(InterceptError::TypeResolution(_))
    ));
}

#[test]
fn test_result_type_mismatch() {
    let provider = TranslatingProvider::new(customers(), RuleChain::empty());

    // Without the rename, rows have no FullName field
    let err = provider.root::<Customer>().to_vec().unwrap_err();
    assert!(matches!(
        err,
        InterceptError::TypeMismatch { ref expected, .. } if expected.contains("Customer")
    ));

    let count = provider.root::<Value>().count().unwrap();
    let err = provider
        .execute_typed::<String>(provider.root::<Value>().expr().clone().count())
        .unwrap_err();
    assert_eq!(count, 3);
    assert!(matches!(err, InterceptError::TypeMismatch { .. }));
}

#[test]
fn test_tree_validation_stops_chain() {
    let engine = customers();
    let later = Arc::new(AtomicUsize::new(0));
    let counter = later.clone();
    let rules = RuleChain::builder()
        .with_rule(Validate)
        .with_rule(rule_fn("later", move |e: Expr| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(e)
        }))
        .build();
    let provider = TranslatingProvider::new(engine.clone(), rules);

    let invalid = Expr::scan("customers", ElementType::Record)
        .project(Vec::<String>::new(), ElementType::Record);
    let err = provider.execute(invalid).unwrap_err();

    assert!(matches!(err, InterceptError::TreeValidation { ref rule, .. } if rule == "validate"));
    assert_eq!(later.load(Ordering::SeqCst), 0);
    assert_eq!(engine.execute_count(), 0);
}

#[test]
fn test_engine_errors_propagate() {
    let engine = Arc::new(MemoryEngine::new(Expr::scan("nowhere", ElementType::Record)));
    let provider = TranslatingProvider::new(engine, RuleChain::empty());

    let err = provider.root::<Value>().to_vec().unwrap_err();
    assert!(err.is_engine());
    assert_eq!(
        err.to_string(),
        MemoryError::UnknownSource("nowhere".into()).to_string()
    );
}

#[test]
fn test_chain_from_config_file() {
    let config = InterceptConfig::from_toml_str(
        r#"
        [[rules]]
        kind = "validate"

        [[rules]]
        kind = "scope-filter"
        field = "Age"
        cmp = "lt"
        value = 80

        [[rules]]
        kind = "rename-field"
        from = "Name"
        to = "FullName"
        "#,
    )
    .unwrap();
    let rules = chain_from_config(&config.rules).unwrap();
    let provider = TranslatingProvider::new(customers(), rules);

    let names: Vec<String> = provider
        .root::<Customer>()
        .order_by("FullName")
        .to_vec()
        .unwrap()
        .into_iter()
        .map(|c| c.full_name)
        .collect();
    assert_eq!(names, vec!["Ada Lovelace", "Alan Turing"]);
}

/// Engine whose sequences never end
struct Naturals {
    source: Expr,
}

struct NaturalSequence;

impl Enumerable for NaturalSequence {
    fn iter(&self) -> Box<dyn Iterator<Item = Result<Value>> + '_> {
        Box::new((0u64..).map(|n| Ok(Value::from(n))))
    }
}

impl QueryEngine for Naturals {
    fn source(&self) -> &Expr {
        &self.source
    }

    fn execute(&self, _expr: Expr) -> Result<Value> {
        Err(InterceptError::engine("infinite sequence cannot be executed eagerly"))
    }

    fn enumerate(&self, _expr: Expr) -> Result<Box<dyn Enumerable>> {
        Ok(Box::new(NaturalSequence))
    }
}

#[test]
fn test_lazy_results_are_not_buffered() {
    let engine = Arc::new(Naturals {
        source: Expr::scan("naturals", ElementType::named("json")),
    });
    let provider = TranslatingProvider::new(engine, RuleChain::empty());

    let elements = provider.root::<Value>().iter().unwrap();
    let head: Vec<Value> = elements.iter().take(5).map(|n| n.unwrap()).collect();
    assert_eq!(head, vec![json!(0), json!(1), json!(2), json!(3), json!(4)]);
}
