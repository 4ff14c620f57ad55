//! Row-at-a-time evaluation of query trees over in-memory tables.
//!
//! Sequence operators are lazy iterator adapters; only `OrderBy` buffers
//! its input.

use crate::error::MemoryError;
use intercept_core::{Comparison, Expr, Predicate, Result, SortDirection};
use serde_json::{Map, Number, Value};
use std::cmp::Ordering;
use std::collections::HashMap;

pub(crate) type Tables = HashMap<String, Vec<Value>>;

pub(crate) type Rows<'a> = Box<dyn Iterator<Item = Result<Value>> + 'a>;

/// Build a row iterator for a sequence tree
pub(crate) fn rows<'a>(tables: &'a Tables, expr: &'a Expr) -> Result<Rows<'a>> {
    let iter: Rows<'a> = match expr {
        Expr::Scan { source, .. } => {
            let table = tables
                .get(source)
                .ok_or_else(|| MemoryError::UnknownSource(source.clone()))?;
            Box::new(table.iter().cloned().map(Ok))
        }
        Expr::Origin { id, .. } => {
            return Err(MemoryError::UnresolvedOrigin(id.to_string()).into())
        }
        Expr::Filter { input, predicate } => Box::new(rows(tables, input)?.filter(move |row| {
            row.as_ref().map_or(true, |value| matches(predicate, value))
        })),
        Expr::Rename { input, from, to } => {
            Box::new(rows(tables, input)?.map(move |row| row.map(|value| rename(value, from, to))))
        }
        Expr::Project { input, fields, .. } => {
            Box::new(rows(tables, input)?.map(move |row| row.map(|value| project(&value, fields))))
        }
        Expr::OrderBy {
            input,
            field,
            direction,
        } => {
            let mut buffered = rows(tables, input)?.collect::<Result<Vec<_>>>()?;
            buffered.sort_by(|a, b| {
                let ord = compare(field_of(a, field), field_of(b, field))
                    .unwrap_or(Ordering::Equal);
                match direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            });
            Box::new(buffered.into_iter().map(Ok))
        }
        Expr::Skip { input, count } => Box::new(rows(tables, input)?.skip(*count)),
        Expr::Take { input, count } => Box::new(rows(tables, input)?.take(*count)),
        Expr::Count { .. } | Expr::Any { .. } | Expr::First { .. } => {
            return Err(MemoryError::NotASequence(expr.op_name()).into())
        }
    };
    Ok(iter)
}

/// Evaluate any tree to a single value (sequences become arrays)
pub(crate) fn value(tables: &Tables, expr: &Expr) -> Result<Value> {
    match expr {
        Expr::Count { input } => {
            let mut n: u64 = 0;
            for row in rows(tables, input)? {
                row?;
                n += 1;
            }
            Ok(Value::from(n))
        }
        Expr::Any { input } => {
            let first = rows(tables, input)?.next().transpose()?;
            Ok(Value::Bool(first.is_some()))
        }
        Expr::First { input } => {
            let first = rows(tables, input)?.next().transpose()?;
            Ok(first.unwrap_or(Value::Null))
        }
        _ => Ok(Value::Array(rows(tables, expr)?.collect::<Result<Vec<_>>>()?)),
    }
}

fn field_of<'v>(row: &'v Value, field: &str) -> &'v Value {
    row.get(field).unwrap_or(&Value::Null)
}

fn matches(predicate: &Predicate, row: &Value) -> bool {
    match predicate {
        Predicate::Compare { field, cmp, value } => {
            let actual = field_of(row, field);
            match cmp {
                Comparison::Eq => equal(actual, value),
                Comparison::Ne => !equal(actual, value),
                Comparison::Lt => compare(actual, value) == Some(Ordering::Less),
                Comparison::Le => {
                    matches!(compare(actual, value), Some(Ordering::Less | Ordering::Equal))
                }
                Comparison::Gt => compare(actual, value) == Some(Ordering::Greater),
                Comparison::Ge => {
                    matches!(compare(actual, value), Some(Ordering::Greater | Ordering::Equal))
                }
            }
        }
        Predicate::And { left, right } => matches(left, row) && matches(right, row),
        Predicate::Or { left, right } => matches(left, row) || matches(right, row),
        Predicate::Not { inner } => !matches(inner, row),
    }
}

fn equal(a: &Value, b: &Value) -> bool {
    compare(a, b).map_or(a == b, |ord| ord == Ordering::Equal)
}

/// Ordering between comparable JSON scalars; `None` across kinds
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

/// Integers compare exactly; f64 only when a float is involved
fn compare_numbers(x: &Number, y: &Number) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return Some(a.cmp(&b));
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return Some(a.cmp(&b));
    }
    // An integer above i64::MAX against a negative one
    if x.is_u64() && y.is_i64() {
        return Some(Ordering::Greater);
    }
    if x.is_i64() && y.is_u64() {
        return Some(Ordering::Less);
    }
    x.as_f64()?.partial_cmp(&y.as_f64()?)
}

fn rename(value: Value, from: &str, to: &str) -> Value {
    match value {
        Value::Object(mut map) => {
            if let Some(v) = map.remove(from) {
                map.insert(to.to_string(), v);
            }
            Value::Object(map)
        }
        other => other,
    }
}

fn project(value: &Value, fields: &[String]) -> Value {
    let map: Map<String, Value> = fields
        .iter()
        .map(|f| (f.clone(), field_of(value, f).clone()))
        .collect();
    Value::Object(map)
}
