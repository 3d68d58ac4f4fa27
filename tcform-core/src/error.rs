//! Error types for domain validation

use thiserror::Error;

/// Result type alias for domain operations
pub type Result<T> = std::result::Result<T, DomainError>;

/// Errors raised while building domain values from operator input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A single value violates the server's naming or value constraints
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Field (or parameter name) that was rejected
        field: String,
        /// Why it was rejected
        reason: String,
    },

    /// The configuration as a whole is structurally invalid
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A build step runner type this crate does not model
    #[error("build step type '{0}' not supported")]
    UnsupportedStepType(String),
}

impl DomainError {
    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
