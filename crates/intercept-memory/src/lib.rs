//! In-memory query engine
//!
//! Evaluates intercepted query trees over named tables of JSON rows. Used
//! by the `intercept` CLI and as a concrete engine in tests; it records
//! every tree it receives.

mod engine;
mod error;
mod eval;

pub use engine::{Dataset, MemoryEngine};
pub use error::MemoryError;
