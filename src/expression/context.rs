//! The capability an expression is evaluated against.

use crate::expression::error::{CoercionError, EvalResult};
use crate::expression::value::{Value, ValueType};

/// Everything a compiled expression needs from the caller.
///
/// Only [`resolve`](EvaluationContext::resolve) is mandatory. The other
/// capabilities default to the standard conversions on [`Value`] and
/// [`ValueType`], and a context may override them to plug in its own type
/// registry or converters.
pub trait EvaluationContext {
    /// Resolve the text of a function block (`${header.foo}` resolves
    /// `header.foo`). The text is opaque to the expression engine.
    fn resolve(&self, name: &str) -> EvalResult<Value>;

    /// Convert `value` to `target`.
    fn coerce(&self, value: &Value, target: ValueType) -> Result<Value, CoercionError> {
        value.coerce_to(target)
    }

    /// Resolve a type name used on the right side of `is`.
    fn resolve_type(&self, name: &str) -> Option<ValueType> {
        ValueType::from_name(name)
    }

    /// Turn a value into a sequence of candidate values for `in` and
    /// `contains`.
    fn to_iterable(&self, value: &Value) -> Vec<Value> {
        default_iterable(value)
    }
}

/// Lists iterate their elements, text splits on commas, null is empty and
/// any other scalar is a single element.
pub fn default_iterable(value: &Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::List(items) => items.clone(),
        Value::String(s) => s
            .split(',')
            .map(|piece| Value::String(piece.trim().to_string()))
            .collect(),
        other => vec![other.clone()],
    }
}
