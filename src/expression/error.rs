//! Error types for expression evaluation.

use crate::expression::value::{Value, ValueType};
use thiserror::Error;

/// A value could not be converted to the requested type.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Cannot coerce value '{value}' of type {from} to {to}")]
pub struct CoercionError {
    pub value: String,
    pub from: ValueType,
    pub to: ValueType,
}

impl CoercionError {
    pub fn new(value: &Value, to: ValueType) -> Self {
        Self {
            value: value.to_string(),
            from: value.value_type(),
            to,
        }
    }
}

/// Errors that can occur while evaluating a compiled expression.
///
/// A failed evaluation never poisons the expression; the same compiled
/// expression can be evaluated again against another context.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Content that is only known to be invalid once evaluated, such as a
    /// malformed `range` bound or an unknown type name for `is`.
    #[error("{message} at location {index} in expression: {expression}")]
    IllegalSyntax {
        expression: String,
        index: usize,
        message: String,
    },

    #[error(transparent)]
    Coercion(#[from] CoercionError),

    /// The context could not resolve a named value.
    #[error("Cannot resolve '{name}': {message}")]
    Unresolved { name: String, message: String },
}

impl EvalError {
    pub fn illegal_syntax(expression: &str, index: usize, message: impl Into<String>) -> Self {
        EvalError::IllegalSyntax {
            expression: expression.to_string(),
            index,
            message: message.into(),
        }
    }

    pub fn unresolved(name: impl Into<String>, message: impl Into<String>) -> Self {
        EvalError::Unresolved {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Result type for expression evaluation
pub type EvalResult<T> = Result<T, EvalError>;
