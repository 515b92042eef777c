pub mod expression;
pub mod language;
pub mod message;
pub mod simple;

pub use expression::{EvalError, EvaluationContext, Expression, Predicate, Value, ValueType};
pub use language::{LanguageConfig, SimpleLanguage};
pub use message::{Message, MessageContext};
pub use simple::{CompileError, CompileMode};
