//! Operator evaluation over runtime values.

use crate::expression::{
    BinaryOperator, CoercionError, EvalError, EvalResult, EvaluationContext, UnaryOperator, Value, ValueType,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;

static RANGE_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^(\d+)\.\.(\d+)$").ok());

/// Where an operator sits in the source, for error reporting.
#[derive(Debug, Clone, Copy)]
pub struct Site<'a> {
    pub expression: &'a str,
    /// Index of the operand the error is about.
    pub index: usize,
}

impl Site<'_> {
    fn error(&self, message: impl Into<String>) -> EvalError {
        EvalError::illegal_syntax(self.expression, self.index, message)
    }
}

/// Apply a binary operator to two evaluated operands.
///
/// Negated operators share the test of their positive counterpart and
/// invert its result.
pub fn evaluate_binary(
    ctx: &dyn EvaluationContext,
    op: BinaryOperator,
    left: &Value,
    right: &Value,
    site: Site<'_>,
) -> EvalResult<bool> {
    use BinaryOperator as Op;

    let (_, negate) = op.positive();
    let result = match op {
        Op::Eq | Op::NotEq => equals(ctx, left, right),
        Op::EqIgnoreCase | Op::NotEqIgnoreCase => equals_ignore_case(left, right),
        Op::Gt => compare(ctx, left, right).map_or(false, Ordering::is_gt),
        Op::Gte => compare(ctx, left, right).map_or(false, Ordering::is_ge),
        Op::Lt => compare(ctx, left, right).map_or(false, Ordering::is_lt),
        Op::Lte => compare(ctx, left, right).map_or(false, Ordering::is_le),
        Op::Contains | Op::NotContains => contains(ctx, left, right),
        Op::ContainsIgnoreCase | Op::NotContainsIgnoreCase => contains_ignore_case(left, right),
        Op::StartsWith => text_test(left, right, |l, r| l.starts_with(r)),
        Op::EndsWith => text_test(left, right, |l, r| l.ends_with(r)),
        Op::Is | Op::NotIs => is_instance(ctx, left, right, site)?,
        Op::Regex | Op::NotRegex => regex_matches(left, right, site)?,
        Op::In | Op::NotIn => ctx
            .to_iterable(right)
            .iter()
            .any(|candidate| equals(ctx, left, candidate)),
        Op::Range | Op::NotRange => in_range(ctx, left, right, site)?,
    };
    Ok(result != negate)
}

/// Equality after coercion to a common type. Values that cannot be brought
/// to a common type are unequal.
pub fn equals(ctx: &dyn EvaluationContext, left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Integer(l), Value::Float(r)) => (*l as f64) == *r,
        (Value::Float(l), Value::Integer(r)) => *l == (*r as f64),
        (l, r) if l.value_type() == r.value_type() => l == r,
        (l, r) => {
            if let Ok(converted) = ctx.coerce(r, l.value_type()) {
                if equals_same_type(l, &converted) {
                    return true;
                }
            }
            match ctx.coerce(l, r.value_type()) {
                Ok(converted) => equals_same_type(&converted, r),
                Err(_) => false,
            }
        }
    }
}

fn equals_same_type(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Integer(l), Value::Float(r)) => (*l as f64) == *r,
        (Value::Float(l), Value::Integer(r)) => *l == (*r as f64),
        (l, r) => l == r,
    }
}

fn equals_ignore_case(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (l, r) => l.to_text().to_lowercase() == r.to_text().to_lowercase(),
    }
}

/// Numeric ordering when both sides convert to numbers, text ordering
/// otherwise. `None` when either side is null.
pub fn compare(ctx: &dyn EvaluationContext, left: &Value, right: &Value) -> Option<Ordering> {
    if left.is_null() || right.is_null() {
        return None;
    }

    let numbers = (
        ctx.coerce(left, ValueType::Number).ok(),
        ctx.coerce(right, ValueType::Number).ok(),
    );
    match numbers {
        (Some(Value::Integer(l)), Some(Value::Integer(r))) => return Some(l.cmp(&r)),
        (Some(l), Some(r)) => {
            if let (Some(l), Some(r)) = (as_f64(&l), as_f64(&r)) {
                // NaN sorts above every number so the order stays total
                return Some(l.partial_cmp(&r).unwrap_or_else(|| l.total_cmp(&r)));
            }
        }
        _ => {}
    }

    Some(left.to_text().cmp(&right.to_text()))
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(n) => Some(*n as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

fn contains(ctx: &dyn EvaluationContext, left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::List(items), r) => items.iter().any(|item| equals(ctx, item, r)),
        (l, r) => l.to_text().contains(&r.to_text()),
    }
}

fn contains_ignore_case(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::List(items), r) => {
            let needle = r.to_text().to_lowercase();
            items.iter().any(|item| item.to_text().to_lowercase() == needle)
        }
        (l, r) => l
            .to_text()
            .to_lowercase()
            .contains(&r.to_text().to_lowercase()),
    }
}

fn text_test(left: &Value, right: &Value, test: impl Fn(&str, &str) -> bool) -> bool {
    if left.is_null() || right.is_null() {
        return false;
    }
    test(&left.to_text(), &right.to_text())
}

fn is_instance(
    ctx: &dyn EvaluationContext,
    left: &Value,
    right: &Value,
    site: Site<'_>,
) -> EvalResult<bool> {
    let name = right.to_text();
    if right.is_null() || name.trim() == "null" {
        return Err(site.error(format!(
            "Syntax error in is operator: {} cannot be null. It must be a class type.",
            right
        )));
    }

    let ty = ctx.resolve_type(name.trim()).ok_or_else(|| {
        site.error(format!(
            "Syntax error in is operator: type '{}' cannot be resolved",
            name.trim()
        ))
    })?;
    Ok(ty.is_instance(left))
}

/// Full match of the left text against the right pattern.
fn regex_matches(left: &Value, right: &Value, site: Site<'_>) -> EvalResult<bool> {
    if left.is_null() {
        return Ok(false);
    }
    let pattern = right.to_text();
    let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
        site.error(format!(
            "Syntax error in regex operator: {} is not a valid pattern: {}",
            pattern, e
        ))
    })?;
    Ok(regex.is_match(&left.to_text()))
}

fn in_range(
    ctx: &dyn EvaluationContext,
    left: &Value,
    right: &Value,
    site: Site<'_>,
) -> EvalResult<bool> {
    let text = right.to_text();
    let invalid = || {
        site.error(format!(
            "Syntax error in range operator: {} is not valid. Valid syntax:'from..to'(where from and to are numbers).",
            text
        ))
    };

    let captures = RANGE_PATTERN
        .as_ref()
        .and_then(|pattern| pattern.captures(&text))
        .ok_or_else(invalid)?;
    let bound = |group: usize| -> EvalResult<i64> {
        captures
            .get(group)
            .and_then(|m| m.as_str().parse::<i64>().ok())
            .ok_or_else(invalid)
    };
    let (from, to) = (bound(1)?, bound(2)?);

    if left.is_null() {
        return Ok(false);
    }
    let value = match ctx.coerce(left, ValueType::Number)? {
        Value::Integer(n) => n as f64,
        Value::Float(f) => f,
        _ => return Err(CoercionError::new(left, ValueType::Number).into()),
    };
    Ok(from as f64 <= value && value <= to as f64)
}

/// Increment or decrement a numeric operand, keeping its original type.
pub fn evaluate_unary(
    ctx: &dyn EvaluationContext,
    op: UnaryOperator,
    operand: &Value,
    site: Site<'_>,
) -> EvalResult<Value> {
    let not_a_number = || site.error(format!("Cannot evaluate {} as number", operand));

    if operand.is_null() {
        return Err(not_a_number());
    }
    let number = ctx
        .coerce(operand, ValueType::Number)
        .map_err(|_| not_a_number())?;

    let result = match number {
        Value::Integer(n) => n
            .checked_add(op.delta())
            .map(Value::Integer)
            .ok_or_else(|| site.error(format!("Cannot {} {}: numeric overflow", op, n)))?,
        Value::Float(f) => Value::Float(f + op.delta() as f64),
        _ => return Err(not_a_number()),
    };

    Ok(ctx.coerce(&result, operand.value_type())?)
}
