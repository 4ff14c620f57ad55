//! Error types for query interception.

use thiserror::Error;

/// Errors raised while constructing, translating or executing an
/// intercepted query.
///
/// The pipeline never recovers locally: whatever a rule or the engine
/// returns reaches the caller as-is.
#[derive(Debug, Error)]
pub enum InterceptError {
    /// A required argument (tree, engine) was absent
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The element type of an untyped tree could not be determined
    #[error("Cannot resolve element type: {0}")]
    TypeResolution(String),

    /// A typed result was requested but the engine returned something else
    #[error("Type mismatch: expected {expected}: {message}")]
    TypeMismatch { expected: String, message: String },

    /// A rewrite rule rejected a structurally invalid tree
    #[error("Tree validation failed in rule '{rule}': {message}")]
    TreeValidation { rule: String, message: String },

    /// Failure reported by the underlying engine
    #[error(transparent)]
    Engine(Box<dyn std::error::Error + Send + Sync>),
}

/// Result type for interception operations
pub type Result<T, E = InterceptError> = std::result::Result<T, E>;

impl InterceptError {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a type resolution error
    pub fn type_resolution(msg: impl Into<String>) -> Self {
        Self::TypeResolution(msg.into())
    }

    /// Create a type mismatch error for the expected Rust type
    pub fn type_mismatch<T: ?Sized>(message: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: std::any::type_name::<T>().to_string(),
            message: message.into(),
        }
    }

    /// Create a tree validation error attributed to a rule
    pub fn tree_validation(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TreeValidation {
            rule: rule.into(),
            message: message.into(),
        }
    }

    /// Wrap an engine failure
    pub fn engine(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Engine(err.into())
    }

    /// Check if the error came from the underlying engine
    pub fn is_engine(&self) -> bool {
        matches!(self, Self::Engine(_))
    }
}
