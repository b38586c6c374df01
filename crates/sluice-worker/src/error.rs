//! Error types for worker pool configuration.

use thiserror::Error;

/// Result type for worker configuration operations.
pub type WorkerResult<T> = Result<T, WorkerError>;

/// Errors raised while validating or resolving a pool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkerError {
    /// The resizing strategy name is not one of the known strategies.
    #[error("unknown resizing strategy {0:?} (expected eager, lazy or balanced)")]
    UnknownStrategy(String),

    /// A numeric bound or name is out of range.
    #[error("invalid pool configuration: {field}: {reason}")]
    InvalidConfig {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl WorkerError {
    /// Create an unknown strategy error.
    pub fn unknown_strategy(name: impl Into<String>) -> Self {
        Self::UnknownStrategy(name.into())
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}
