//! `run` and `explain`

use crate::cli::QueryArgs;
use anyhow::{bail, Context, Result};
use intercept_config::InterceptConfig;
use intercept_core::rules::chain_from_config;
use intercept_core::{Predicate, Query, TranslatingProvider};
use intercept_memory::{Dataset, MemoryEngine};
use serde_json::Value;
use std::io::Write;
use std::sync::Arc;
use tracing::debug;

/// Execute the query and print one JSON line per row, or the count
pub fn run(config: &InterceptConfig, args: &QueryArgs, out: &mut impl Write) -> Result<()> {
    let provider = provider(config, args)?;
    let query = compose(&provider, args)?;

    if args.count {
        writeln!(out, "{}", query.count()?)?;
        return Ok(());
    }

    let elements = query.iter()?;
    let mut rows = 0usize;
    for row in elements.iter() {
        writeln!(out, "{}", serde_json::to_string(&row?)?)?;
        rows += 1;
    }
    debug!(rows, "printed results");
    Ok(())
}

/// Print the tree the engine would receive
pub fn explain(config: &InterceptConfig, args: &QueryArgs, out: &mut impl Write) -> Result<()> {
    let provider = provider(config, args)?;
    let query = compose(&provider, args)?;

    let tree = if args.count {
        query.into_expr().count()
    } else {
        query.into_expr()
    };
    let translated = provider.translate(tree)?;
    writeln!(out, "{}", serde_json::to_string_pretty(&translated)?)?;
    Ok(())
}

fn provider(config: &InterceptConfig, args: &QueryArgs) -> Result<TranslatingProvider> {
    let dataset = load_dataset(args)?;
    let rules = chain_from_config(&config.rules).context("Failed to build rule chain")?;
    debug!(
        source = %dataset.source,
        rows = dataset.rows.len(),
        "loaded dataset"
    );
    Ok(TranslatingProvider::new(
        Arc::new(MemoryEngine::from_dataset(dataset)),
        rules,
    ))
}

fn load_dataset(args: &QueryArgs) -> Result<Dataset> {
    let content = std::fs::read_to_string(&args.data)
        .with_context(|| format!("Failed to read data file {}", args.data.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid data file {}", args.data.display()))
}

fn compose(provider: &TranslatingProvider, args: &QueryArgs) -> Result<Query<Value>> {
    let mut query = provider.root::<Value>();
    for clause in &args.filters {
        let (field, value) = parse_where(clause)?;
        query = query.filter(Predicate::eq(field, value));
    }
    if let Some(field) = &args.order_by {
        query = if args.desc {
            query.order_by_desc(field)
        } else {
            query.order_by(field)
        };
    }
    if let Some(n) = args.skip {
        query = query.skip(n);
    }
    if let Some(n) = args.take {
        query = query.take(n);
    }
    Ok(query)
}

/// Split `FIELD=VALUE`; VALUE is JSON when it parses, otherwise a string
fn parse_where(clause: &str) -> Result<(String, Value)> {
    let Some((field, raw)) = clause.split_once('=') else {
        bail!("Invalid --where '{clause}': expected FIELD=VALUE");
    };
    let field = field.trim();
    if field.is_empty() {
        bail!("Invalid --where '{clause}': empty field name");
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((field.to_string(), value))
}
