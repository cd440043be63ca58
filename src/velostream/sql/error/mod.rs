//! Error types for aggregate function resolution and execution.
//!
//! Resolution errors (`UnknownFunction`, `ArityMismatch`, `UnsupportedType`,
//! `InvalidInitArguments`, `ArgumentIndexOutOfRange`) are raised while a query
//! is compiled and reject it before any record is processed.
//!
//! `Internal` is reserved for contract violations by the caller, for example a
//! value whose runtime type disagrees with the type the function was resolved
//! for. It signals a bug in the owning engine, not bad input data.

use crate::velostream::sql::execution::types::{format_signature, SqlType};
use thiserror::Error;

/// Result alias for aggregate framework operations
pub type AggregateResult<T> = Result<T, AggregateError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AggregateError {
    #[error("Unknown aggregate function '{name}'{}", format_suggestions(.suggestions))]
    UnknownFunction {
        name: String,
        suggestions: Vec<String>,
    },

    #[error("Function {function} expects {expected} argument(s) but was called with {actual}: {}", format_signature(.signature))]
    ArityMismatch {
        function: String,
        expected: usize,
        actual: usize,
        signature: Vec<SqlType>,
    },

    #[error("Function {function} does not support argument type {offending} in {}: {reason}", format_signature(.signature))]
    UnsupportedType {
        function: String,
        offending: SqlType,
        signature: Vec<SqlType>,
        reason: String,
    },

    #[error("Invalid initialization arguments for {function}: {message}")]
    InvalidInitArguments { function: String, message: String },

    #[error("Aggregate argument index {index} is out of range for an input of {width} column(s)")]
    ArgumentIndexOutOfRange { index: usize, width: usize },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal aggregation error in {function}: {message}")]
    Internal { function: String, message: String },
}

impl AggregateError {
    pub fn unsupported_type(
        function: impl Into<String>,
        offending: &SqlType,
        signature: &[SqlType],
        reason: impl Into<String>,
    ) -> Self {
        AggregateError::UnsupportedType {
            function: function.into(),
            offending: offending.clone(),
            signature: signature.to_vec(),
            reason: reason.into(),
        }
    }

    pub fn invalid_init_arguments(function: impl Into<String>, message: impl Into<String>) -> Self {
        AggregateError::InvalidInitArguments {
            function: function.into(),
            message: message.into(),
        }
    }

    pub fn internal(function: impl Into<String>, message: impl Into<String>) -> Self {
        AggregateError::Internal {
            function: function.into(),
            message: message.into(),
        }
    }

    /// Whether this error belongs to query compilation rather than execution.
    pub fn is_resolution_error(&self) -> bool {
        !matches!(
            self,
            AggregateError::Internal { .. } | AggregateError::Config { .. }
        )
    }
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean: {}?)", suggestions.join(", "))
    }
}
