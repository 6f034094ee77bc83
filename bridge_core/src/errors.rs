//! # Error Types
//!
//! Structured error types for bridge_core. Each variant carries enough
//! context for the form layer to show a readable message and for tooling to
//! react programmatically via [`CalcError::error_code`].
//!
//! ## Example
//!
//! ```rust
//! use bridge_core::errors::{CalcError, CalcResult};
//!
//! fn validate_span(span_m: f64) -> CalcResult<()> {
//!     if span_m <= 0.0 {
//!         return Err(CalcError::invalid_input("span_m", span_m.to_string(), "Span must be positive"));
//!     }
//!     Ok(())
//! }
//!
//! assert!(validate_span(-1.0).is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for bridge_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for lookup, calculation, and export operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// An input value is non-numeric or outside its domain
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A state or district key is not in the location database
    #[error("{kind} not found: {key}")]
    NotFound { kind: String, key: String },

    /// One or more constraints failed (geometry relation, export limits)
    #[error("Validation failed for {context}: {}", .violations.join("; "))]
    ValidationFailed {
        context: String,
        violations: Vec<String>,
    },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON or TOML (de)serialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },
}

impl CalcError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a NotFound error
    pub fn not_found(kind: impl Into<String>, key: impl Into<String>) -> Self {
        CalcError::NotFound {
            kind: kind.into(),
            key: key.into(),
        }
    }

    /// Create a ValidationFailed error from a list of violated constraints
    pub fn validation_failed<I, S>(context: impl Into<String>, violations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CalcError::ValidationFailed {
            context: context.into(),
            violations: violations.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a SerializationError
    pub fn serialization(reason: impl Into<String>) -> Self {
        CalcError::SerializationError {
            reason: reason.into(),
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::NotFound { .. } => "NOT_FOUND",
            CalcError::ValidationFailed { .. } => "VALIDATION_FAILED",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
        }
    }
}
