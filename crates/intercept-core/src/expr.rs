//! Query trees.
//!
//! An [`Expr`] is an immutable, owned tree describing a query. Every node
//! declares the type of result it produces ([`Expr::result_type`]); the
//! pipeline treats nodes as opaque apart from [`Expr::Origin`], the
//! self-reference that stands for "the source query of the provider that
//! built this tree".
//!
//! Rules transform trees by value, so a tree handed to the pipeline is never
//! modified behind the caller's back.

use crate::error::{InterceptError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque identifier carried by a self-reference node.
///
/// Each translating provider owns exactly one; only that provider resolves
/// `Origin` nodes carrying it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OriginId(Uuid);

impl OriginId {
    /// Generate a fresh identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OriginId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OriginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Origin({})", self.0)
    }
}

/// Type of the elements a sequence produces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    /// A named element type, e.g. `Customer`
    Named(String),
    /// Anonymous record shape (ad-hoc projections)
    Record,
}

impl ElementType {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Name of the element type, if it has one
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Record => None,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Record => f.write_str("<record>"),
        }
    }
}

/// Kind of a scalar result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    Integer,
    Boolean,
}

/// Declared result type of a tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResultType {
    /// Zero or more elements
    Sequence(ElementType),
    /// At most one element
    Single(ElementType),
    /// A scalar aggregate
    Scalar(ScalarKind),
}

/// Comparison operators for predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl FromStr for Comparison {
    type Err = InterceptError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "eq" | "=" | "==" => Ok(Self::Eq),
            "ne" | "!=" | "<>" => Ok(Self::Ne),
            "lt" | "<" => Ok(Self::Lt),
            "le" | "<=" => Ok(Self::Le),
            "gt" | ">" => Ok(Self::Gt),
            "ge" | ">=" => Ok(Self::Ge),
            other => Err(InterceptError::invalid_argument(format!(
                "unknown comparison '{other}'"
            ))),
        }
    }
}

/// Sort direction for `OrderBy`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Row predicate used by `Filter` nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    /// Compare a field with a literal
    Compare {
        field: String,
        cmp: Comparison,
        value: Value,
    },
    And {
        left: Box<Predicate>,
        right: Box<Predicate>,
    },
    Or {
        left: Box<Predicate>,
        right: Box<Predicate>,
    },
    Not {
        inner: Box<Predicate>,
    },
}

#[allow(clippy::should_implement_trait)]
impl Predicate {
    pub fn compare(field: impl Into<String>, cmp: Comparison, value: impl Into<Value>) -> Self {
        Self::Compare {
            field: field.into(),
            cmp,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Comparison::Eq, value)
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Comparison::Ne, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Comparison::Lt, value)
    }

    pub fn le(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Comparison::Le, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Comparison::Gt, value)
    }

    pub fn ge(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Comparison::Ge, value)
    }

    pub fn and(self, other: Predicate) -> Self {
        Self::And {
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    pub fn or(self, other: Predicate) -> Self {
        Self::Or {
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    pub fn not(self) -> Self {
        Self::Not {
            inner: Box::new(self),
        }
    }

    /// Field names referenced by this predicate, in order of appearance
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Compare { field, .. } => out.push(field),
            Self::And { left, right } | Self::Or { left, right } => {
                left.collect_fields(out);
                right.collect_fields(out);
            }
            Self::Not { inner } => inner.collect_fields(out),
        }
    }
}

/// A query tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Expr {
    /// Plain data scan of a named source
    Scan { source: String, element: ElementType },

    /// Self-reference: the source query of the provider identified by `id`
    Origin { id: OriginId, element: ElementType },

    Filter {
        input: Box<Expr>,
        predicate: Predicate,
    },

    /// Expose field `from` of each element under the name `to`
    Rename {
        input: Box<Expr>,
        from: String,
        to: String,
    },

    Project {
        input: Box<Expr>,
        fields: Vec<String>,
        element: ElementType,
    },

    OrderBy {
        input: Box<Expr>,
        field: String,
        direction: SortDirection,
    },

    Skip { input: Box<Expr>, count: usize },

    Take { input: Box<Expr>, count: usize },

    Count { input: Box<Expr> },

    Any { input: Box<Expr> },

    First { input: Box<Expr> },
}

impl Expr {
    pub fn scan(source: impl Into<String>, element: ElementType) -> Self {
        Self::Scan {
            source: source.into(),
            element,
        }
    }

    pub fn origin(id: OriginId, element: ElementType) -> Self {
        Self::Origin { id, element }
    }

    pub fn filter(self, predicate: Predicate) -> Self {
        Self::Filter {
            input: Box::new(self),
            predicate,
        }
    }

    pub fn rename(self, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::Rename {
            input: Box::new(self),
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn project<I, S>(self, fields: I, element: ElementType) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Project {
            input: Box::new(self),
            fields: fields.into_iter().map(Into::into).collect(),
            element,
        }
    }

    pub fn order_by(self, field: impl Into<String>, direction: SortDirection) -> Self {
        Self::OrderBy {
            input: Box::new(self),
            field: field.into(),
            direction,
        }
    }

    pub fn skip(self, count: usize) -> Self {
        Self::Skip {
            input: Box::new(self),
            count,
        }
    }

    pub fn take(self, count: usize) -> Self {
        Self::Take {
            input: Box::new(self),
            count,
        }
    }

    pub fn count(self) -> Self {
        Self::Count {
            input: Box::new(self),
        }
    }

    pub fn any(self) -> Self {
        Self::Any {
            input: Box::new(self),
        }
    }

    pub fn first(self) -> Self {
        Self::First {
            input: Box::new(self),
        }
    }

    /// Short operator name for diagnostics
    pub fn op_name(&self) -> &'static str {
        match self {
            Self::Scan { .. } => "scan",
            Self::Origin { .. } => "origin",
            Self::Filter { .. } => "filter",
            Self::Rename { .. } => "rename",
            Self::Project { .. } => "project",
            Self::OrderBy { .. } => "order_by",
            Self::Skip { .. } => "skip",
            Self::Take { .. } => "take",
            Self::Count { .. } => "count",
            Self::Any { .. } => "any",
            Self::First { .. } => "first",
        }
    }

    /// The declared result type of this tree
    pub fn result_type(&self) -> ResultType {
        match self {
            Self::Scan { element, .. }
            | Self::Origin { element, .. }
            | Self::Project { element, .. } => ResultType::Sequence(element.clone()),
            Self::Filter { input, .. }
            | Self::Rename { input, .. }
            | Self::OrderBy { input, .. }
            | Self::Skip { input, .. }
            | Self::Take { input, .. } => input.result_type(),
            Self::Count { .. } => ResultType::Scalar(ScalarKind::Integer),
            Self::Any { .. } => ResultType::Scalar(ScalarKind::Boolean),
            Self::First { input } => match input.result_type() {
                ResultType::Sequence(element) => ResultType::Single(element),
                other => other,
            },
        }
    }

    /// The input subtree, or `None` for leaves
    pub fn input(&self) -> Option<&Expr> {
        match self {
            Self::Scan { .. } | Self::Origin { .. } => None,
            Self::Filter { input, .. }
            | Self::Rename { input, .. }
            | Self::Project { input, .. }
            | Self::OrderBy { input, .. }
            | Self::Skip { input, .. }
            | Self::Take { input, .. }
            | Self::Count { input }
            | Self::Any { input }
            | Self::First { input } => Some(input),
        }
    }

    /// Rebuild this node with each direct child replaced by `f(child)`.
    pub fn map_children<F>(self, mut f: F) -> Result<Expr>
    where
        F: FnMut(Expr) -> Result<Expr>,
    {
        let mut map = |input: Box<Expr>| f(*input).map(Box::new);
        Ok(match self {
            leaf @ (Self::Scan { .. } | Self::Origin { .. }) => leaf,
            Self::Filter { input, predicate } => Self::Filter {
                input: map(input)?,
                predicate,
            },
            Self::Rename { input, from, to } => Self::Rename {
                input: map(input)?,
                from,
                to,
            },
            Self::Project {
                input,
                fields,
                element,
            } => Self::Project {
                input: map(input)?,
                fields,
                element,
            },
            Self::OrderBy {
                input,
                field,
                direction,
            } => Self::OrderBy {
                input: map(input)?,
                field,
                direction,
            },
            Self::Skip { input, count } => Self::Skip {
                input: map(input)?,
                count,
            },
            Self::Take { input, count } => Self::Take {
                input: map(input)?,
                count,
            },
            Self::Count { input } => Self::Count { input: map(input)? },
            Self::Any { input } => Self::Any { input: map(input)? },
            Self::First { input } => Self::First { input: map(input)? },
        })
    }

    /// Post-order rewrite: children are rewritten before their parent, and
    /// whatever `f` returns for a node is not visited again.
    pub fn transform_up<F>(self, f: &mut F) -> Result<Expr>
    where
        F: FnMut(Expr) -> Result<Expr>,
    {
        let node = self.map_children(|child| child.transform_up(f))?;
        f(node)
    }

    /// Visit every node, parents before children
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Expr)) {
        let mut current = Some(self);
        while let Some(node) = current {
            f(node);
            current = node.input();
        }
    }

    /// Ids of all self-reference nodes in this tree
    pub fn origins(&self) -> Vec<OriginId> {
        let mut ids = Vec::new();
        self.walk(&mut |node| {
            if let Self::Origin { id, .. } = node {
                ids.push(*id);
            }
        });
        ids
    }

    /// Whether the tree references the given origin
    pub fn references(&self, origin: OriginId) -> bool {
        self.origins().contains(&origin)
    }

    /// Number of nodes from the root down to the leaf
    pub fn depth(&self) -> usize {
        let mut n = 0;
        self.walk(&mut |_| n += 1);
        n
    }
}
