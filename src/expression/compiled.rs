//! Compiled, reusable expressions.

use crate::expression::error::{CoercionError, EvalResult};
use crate::expression::{EvaluationContext, Value, ValueType};
use std::fmt;
use std::sync::Arc;

/// The evaluation closure behind an [`Expression`].
pub type EvalFn = dyn Fn(&dyn EvaluationContext) -> EvalResult<Value> + Send + Sync;

/// A compiled expression.
///
/// Cloning is cheap; the closure and source text are shared. The closure
/// holds no per-call state, so one expression may be evaluated from many
/// threads at once against different contexts.
#[derive(Clone)]
pub struct Expression {
    func: Arc<EvalFn>,
    text: Arc<str>,
}

impl Expression {
    pub fn new<F>(text: impl Into<Arc<str>>, func: F) -> Self
    where
        F: Fn(&dyn EvaluationContext) -> EvalResult<Value> + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
            text: text.into(),
        }
    }

    /// An expression that always yields `value`.
    pub fn constant(text: impl Into<Arc<str>>, value: Value) -> Self {
        Self::new(text, move |_| Ok(value.clone()))
    }

    /// The same computation under a different textual form.
    pub fn with_text(self, text: impl Into<Arc<str>>) -> Self {
        Self {
            func: self.func,
            text: text.into(),
        }
    }

    /// Evaluate without converting the result.
    pub fn value(&self, ctx: &dyn EvaluationContext) -> EvalResult<Value> {
        (self.func)(ctx)
    }

    /// Evaluate and convert the result to `target` through the context.
    /// [`ValueType::Any`] returns the value as produced.
    pub fn evaluate(&self, ctx: &dyn EvaluationContext, target: ValueType) -> EvalResult<Value> {
        let value = self.value(ctx)?;
        if target == ValueType::Any {
            return Ok(value);
        }
        Ok(ctx.coerce(&value, target)?)
    }

    /// Textual form of the expression, suitable for compiling again.
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Expression").field(&self.text).finish()
    }
}

/// An expression whose result is read as a boolean.
#[derive(Clone, Debug)]
pub struct Predicate {
    expression: Expression,
}

impl Predicate {
    pub fn new(expression: Expression) -> Self {
        Self { expression }
    }

    pub fn constant(value: bool) -> Self {
        Self::new(Expression::constant(value.to_string(), Value::Boolean(value)))
    }

    /// Evaluate with a boolean target. A result the context cannot turn
    /// into a boolean is a coercion error, never `false`.
    pub fn matches(&self, ctx: &dyn EvaluationContext) -> EvalResult<bool> {
        match self.expression.evaluate(ctx, ValueType::Boolean)? {
            Value::Boolean(b) => Ok(b),
            other => Err(CoercionError::new(&other, ValueType::Boolean).into()),
        }
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.expression, f)
    }
}
