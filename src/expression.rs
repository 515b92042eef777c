//! Runtime side of the expression language.
//!
//! This module provides:
//! - Values and type names
//! - The evaluation context capability
//! - Operator definitions and their semantics
//! - Compiled expressions and predicates

pub mod compiled;
pub mod context;
pub mod error;
pub mod eval;
pub mod operator;
pub mod value;

pub use compiled::{EvalFn, Expression, Predicate};
pub use context::{default_iterable, EvaluationContext};
pub use error::{CoercionError, EvalError, EvalResult};
pub use eval::{evaluate_binary, evaluate_unary, Site};
pub use operator::{BinaryOperator, LogicalOperator, UnaryOperator};
pub use value::{parse_numeric, Value, ValueType};
