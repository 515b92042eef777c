//! Runtime values and type names.

use crate::expression::error::CoercionError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A value produced by resolving a name or evaluating an expression.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
}

impl Value {
    pub fn string(val: impl Into<String>) -> Self {
        Value::String(val.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The concrete runtime type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Integer(_) => ValueType::Integer,
            Value::Float(_) => ValueType::Float,
            Value::String(_) => ValueType::String,
            Value::List(_) => ValueType::List,
        }
    }

    /// Text used when the value is concatenated into a larger string.
    /// Null renders as the empty string.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Boolean(b) => b.to_string(),
            Value::Integer(n) => n.to_string(),
            Value::Float(f) => format_float(*f),
            Value::String(s) => s.clone(),
            Value::List(items) => items
                .iter()
                .map(Value::to_text)
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    /// Standard conversion used when a context does not override coercion.
    pub fn coerce_to(&self, target: ValueType) -> Result<Value, CoercionError> {
        let fail = || CoercionError::new(self, target);

        match (target, self) {
            (ValueType::Any, _) => Ok(self.clone()),
            (ValueType::Boolean, Value::Null) => Ok(Value::Boolean(false)),
            (_, Value::Null) => Ok(Value::Null),

            (ValueType::Null, _) => Err(fail()),

            (ValueType::String, v) => Ok(Value::String(v.to_text())),

            (ValueType::Boolean, Value::Boolean(b)) => Ok(Value::Boolean(*b)),
            (ValueType::Boolean, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(Value::Boolean(true)),
                "false" => Ok(Value::Boolean(false)),
                _ => Err(fail()),
            },
            (ValueType::Boolean, _) => Err(fail()),

            (ValueType::Integer, Value::Integer(n)) => Ok(Value::Integer(*n)),
            (ValueType::Integer, Value::Float(f)) => {
                if f.fract() == 0.0 && f.is_finite() && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                    Ok(Value::Integer(*f as i64))
                } else {
                    Err(fail())
                }
            }
            (ValueType::Integer, Value::String(s)) => match parse_numeric(s.trim()) {
                Some(Value::Integer(n)) => Ok(Value::Integer(n)),
                Some(Value::Float(f)) if f.fract() == 0.0 => Value::Float(f).coerce_to(target),
                _ => Err(fail()),
            },
            (ValueType::Integer, _) => Err(fail()),

            (ValueType::Float, Value::Integer(n)) => Ok(Value::Float(*n as f64)),
            (ValueType::Float, Value::Float(f)) => Ok(Value::Float(*f)),
            (ValueType::Float, Value::String(s)) => match parse_numeric(s.trim()) {
                Some(Value::Integer(n)) => Ok(Value::Float(n as f64)),
                Some(Value::Float(f)) => Ok(Value::Float(f)),
                _ => Err(fail()),
            },
            (ValueType::Float, _) => Err(fail()),

            (ValueType::Number, Value::Integer(_) | Value::Float(_)) => Ok(self.clone()),
            (ValueType::Number, Value::String(s)) => parse_numeric(s.trim()).ok_or_else(fail),
            (ValueType::Number, _) => Err(fail()),

            (ValueType::List, Value::List(items)) => Ok(Value::List(items.clone())),
            (ValueType::List, v) => Ok(Value::List(vec![v.clone()])),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            other => write!(f, "{}", other.to_text()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.is_finite() && f.abs() < 1e15 {
        format!("{:.1}", f)
    } else {
        f.to_string()
    }
}

/// Parse `-?\d+` as an integer and `-?\d+\.\d+` as a decimal.
///
/// Stricter than `str::parse::<f64>`, which also accepts `inf`, `NaN` and
/// exponents that should stay plain text in an expression.
pub fn parse_numeric(text: &str) -> Option<Value> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() {
        return None;
    }

    let mut parts = digits.splitn(2, '.');
    let whole = parts.next()?;
    let fraction = parts.next();

    if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    match fraction {
        None => text.parse::<i64>().ok().map(Value::Integer),
        Some(frac) if !frac.is_empty() && frac.chars().all(|c| c.is_ascii_digit()) => {
            text.parse::<f64>().ok().map(Value::Float)
        }
        Some(_) => None,
    }
}

/// Type names a value can be coerced to or tested against with `is`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// No coercion; also matches every non-null value in `is` tests.
    Any,
    Null,
    Boolean,
    Integer,
    Float,
    /// Either Integer or Float.
    Number,
    String,
    List,
}

impl ValueType {
    /// Resolve a type name as written on the right side of `is`.
    pub fn from_name(name: &str) -> Option<ValueType> {
        let simple = name.rsplit('.').next().unwrap_or(name);
        match simple.to_ascii_lowercase().as_str() {
            "object" | "any" => Some(ValueType::Any),
            "boolean" | "bool" => Some(ValueType::Boolean),
            "integer" | "int" | "long" | "short" | "i64" => Some(ValueType::Integer),
            "double" | "float" | "f64" | "decimal" => Some(ValueType::Float),
            "number" => Some(ValueType::Number),
            "string" | "charsequence" | "text" => Some(ValueType::String),
            "list" | "collection" | "iterable" | "array" => Some(ValueType::List),
            _ => None,
        }
    }

    /// Whether `value` is an instance of this type.
    pub fn is_instance(&self, value: &Value) -> bool {
        match (self, value) {
            (ValueType::Null, Value::Null) => true,
            (_, Value::Null) => false,
            (ValueType::Any, _) => true,
            (ValueType::Number, Value::Integer(_) | Value::Float(_)) => true,
            (ty, v) => *ty == v.value_type(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Any => "Any",
            ValueType::Null => "Null",
            ValueType::Boolean => "Boolean",
            ValueType::Integer => "Integer",
            ValueType::Float => "Float",
            ValueType::Number => "Number",
            ValueType::String => "String",
            ValueType::List => "List",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
