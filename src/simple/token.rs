// Tokens produced by the lexer

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Blocks
    FunctionStart,
    FunctionEnd,
    SingleQuote,
    DoubleQuote,

    // Operators
    BinaryOperator,
    UnaryOperator,
    LogicalOperator,

    // Text
    Literal,
    Whitespace,
}

impl TokenKind {
    pub fn is_operator(&self) -> bool {
        matches!(
            self,
            TokenKind::BinaryOperator | TokenKind::UnaryOperator | TokenKind::LogicalOperator
        )
    }

    pub fn is_quote(&self) -> bool {
        matches!(self, TokenKind::SingleQuote | TokenKind::DoubleQuote)
    }
}

/// A positioned lexical unit.
///
/// `text` is the token value with escapes resolved; `raw` is the exact
/// source slice, which is what gets printed back when a node is displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub raw: String,
    /// Character offset of the first character in the source text.
    pub index: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, index: usize) -> Self {
        let text = text.into();
        Self {
            kind,
            raw: text.clone(),
            text,
            index,
        }
    }

    pub fn with_raw(kind: TokenKind, text: String, raw: String, index: usize) -> Self {
        Self {
            kind,
            text,
            raw,
            index,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}[{}] at location {}", self.kind, self.raw, self.index)
    }
}
