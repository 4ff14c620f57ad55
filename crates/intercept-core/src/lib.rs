//! Query interception for Intercept
//!
//! This crate sits between code that builds queries and the engine that runs
//! them. Queries are composed against a [`Query<T>`] handle; when one is
//! executed, its tree is rewritten by the [`TranslatingProvider`] and only
//! then forwarded to the underlying [`QueryEngine`].
//!
//! ## Architecture
//!
//! ```text
//! Query<T> (inert, composable)
//!   └─> TranslatingProvider
//!         ├─> ResolveOrigin   (self-references → engine source tree)
//!         ├─> RuleChain       (user rules, in order)
//!         └─> QueryEngine     (execute / enumerate, result returned as-is)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use intercept_core::{Predicate, RuleChain, TranslatingProvider};
//! use intercept_core::rules::RenameField;
//!
//! let rules = RuleChain::builder()
//!     .with_rule(RenameField::new("Name", "FullName"))
//!     .build();
//! let provider = TranslatingProvider::new(engine, rules);
//!
//! let adas = provider
//!     .root::<Customer>()
//!     .filter(Predicate::eq("FullName", "Ada Lovelace"))
//!     .to_vec()?;
//! ```

pub mod chain;
pub mod element;
pub mod engine;
pub mod error;
pub mod expr;
pub mod provider;
pub mod query;
pub mod registry;
pub mod resolve;
pub mod rule;
pub mod rules;

pub use chain::{RuleChain, RuleChainBuilder};
pub use element::Element;
pub use engine::{Enumerable, QueryEngine, ValueSequence};
pub use error::{InterceptError, Result};
pub use expr::{
    Comparison, ElementType, Expr, OriginId, Predicate, ResultType, ScalarKind, SortDirection,
};
pub use provider::{ProviderBuilder, TranslatingProvider};
pub use query::{AnyQuery, Elements, Query};
pub use registry::ElementRegistry;
pub use resolve::ResolveOrigin;
pub use rule::{rule_fn, FnRule, RewriteRule};
