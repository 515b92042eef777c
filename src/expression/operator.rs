//! Operator definitions for expressions.

use std::fmt;

/// Binary operators supported in predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    // Equality
    Eq,
    EqIgnoreCase,
    NotEq,
    NotEqIgnoreCase,

    // Comparison
    Gt,
    Gte,
    Lt,
    Lte,

    // Containment
    Contains,
    NotContains,
    ContainsIgnoreCase,
    NotContainsIgnoreCase,
    StartsWith,
    EndsWith,

    // Type test
    Is,
    NotIs,

    // Pattern matching
    Regex,
    NotRegex,

    // Membership
    In,
    NotIn,
    Range,
    NotRange,
}

/// Every accepted spelling, longest first so that the tokenizer can match
/// greedily (`!=~` before `!=`, `not contains` before `not`).
const BINARY_SYMBOLS: &[(&str, BinaryOperator)] = &[
    ("not contains", BinaryOperator::NotContains),
    ("starts with", BinaryOperator::StartsWith),
    ("startsWith", BinaryOperator::StartsWith),
    ("not regex", BinaryOperator::NotRegex),
    ("not range", BinaryOperator::NotRange),
    ("!contains", BinaryOperator::NotContains),
    ("ends with", BinaryOperator::EndsWith),
    ("contains", BinaryOperator::Contains),
    ("endsWith", BinaryOperator::EndsWith),
    ("!regex", BinaryOperator::NotRegex),
    ("!range", BinaryOperator::NotRange),
    ("not is", BinaryOperator::NotIs),
    ("not in", BinaryOperator::NotIn),
    ("regex", BinaryOperator::Regex),
    ("range", BinaryOperator::Range),
    ("!=~", BinaryOperator::NotEqIgnoreCase),
    ("!~~", BinaryOperator::NotContainsIgnoreCase),
    ("!is", BinaryOperator::NotIs),
    ("!in", BinaryOperator::NotIn),
    ("==", BinaryOperator::Eq),
    ("=~", BinaryOperator::EqIgnoreCase),
    (">=", BinaryOperator::Gte),
    ("<=", BinaryOperator::Lte),
    ("!=", BinaryOperator::NotEq),
    ("~~", BinaryOperator::ContainsIgnoreCase),
    ("is", BinaryOperator::Is),
    ("in", BinaryOperator::In),
    (">", BinaryOperator::Gt),
    ("<", BinaryOperator::Lt),
];

impl BinaryOperator {
    /// Look up an operator by any of its spellings.
    pub fn from_symbol(symbol: &str) -> Option<BinaryOperator> {
        BINARY_SYMBOLS
            .iter()
            .find(|(text, _)| *text == symbol)
            .map(|(_, op)| *op)
    }

    /// All spellings, longest first.
    pub fn symbols() -> impl Iterator<Item = &'static str> {
        BINARY_SYMBOLS.iter().map(|(text, _)| *text)
    }

    /// Split a negated operator into its positive counterpart.
    ///
    /// Returns the operator that is actually evaluated and whether its
    /// boolean result must be inverted.
    pub fn positive(&self) -> (BinaryOperator, bool) {
        match self {
            BinaryOperator::NotEq => (BinaryOperator::Eq, true),
            BinaryOperator::NotEqIgnoreCase => (BinaryOperator::EqIgnoreCase, true),
            BinaryOperator::NotContains => (BinaryOperator::Contains, true),
            BinaryOperator::NotContainsIgnoreCase => (BinaryOperator::ContainsIgnoreCase, true),
            BinaryOperator::NotIs => (BinaryOperator::Is, true),
            BinaryOperator::NotRegex => (BinaryOperator::Regex, true),
            BinaryOperator::NotIn => (BinaryOperator::In, true),
            BinaryOperator::NotRange => (BinaryOperator::Range, true),
            other => (*other, false),
        }
    }

    /// Get the canonical display string for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Eq => "==",
            BinaryOperator::EqIgnoreCase => "=~",
            BinaryOperator::NotEq => "!=",
            BinaryOperator::NotEqIgnoreCase => "!=~",
            BinaryOperator::Gt => ">",
            BinaryOperator::Gte => ">=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Lte => "<=",
            BinaryOperator::Contains => "contains",
            BinaryOperator::NotContains => "!contains",
            BinaryOperator::ContainsIgnoreCase => "~~",
            BinaryOperator::NotContainsIgnoreCase => "!~~",
            BinaryOperator::StartsWith => "startsWith",
            BinaryOperator::EndsWith => "endsWith",
            BinaryOperator::Is => "is",
            BinaryOperator::NotIs => "!is",
            BinaryOperator::Regex => "regex",
            BinaryOperator::NotRegex => "!regex",
            BinaryOperator::In => "in",
            BinaryOperator::NotIn => "!in",
            BinaryOperator::Range => "range",
            BinaryOperator::NotRange => "!range",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unary operators, written directly after a function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Inc,
    Dec,
}

impl UnaryOperator {
    pub fn from_symbol(symbol: &str) -> Option<UnaryOperator> {
        match symbol {
            "++" => Some(UnaryOperator::Inc),
            "--" => Some(UnaryOperator::Dec),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOperator::Inc => "++",
            UnaryOperator::Dec => "--",
        }
    }

    /// The amount added to the operand.
    pub fn delta(&self) -> i64 {
        match self {
            UnaryOperator::Inc => 1,
            UnaryOperator::Dec => -1,
        }
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical operators joining predicate terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    pub fn from_symbol(symbol: &str) -> Option<LogicalOperator> {
        match symbol {
            "&&" => Some(LogicalOperator::And),
            "||" => Some(LogicalOperator::Or),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOperator::And => "&&",
            LogicalOperator::Or => "||",
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
