//! Memory engine error types

use intercept_core::InterceptError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MemoryError {
    #[error("Unknown source: {0}")]
    UnknownSource(String),

    /// Self-references must be resolved before trees reach the engine
    #[error("Unresolved self-reference: {0}")]
    UnresolvedOrigin(String),

    #[error("'{0}' does not produce a sequence")]
    NotASequence(&'static str),
}

impl From<MemoryError> for InterceptError {
    fn from(err: MemoryError) -> Self {
        InterceptError::engine(err)
    }
}
