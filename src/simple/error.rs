//! Errors raised while turning text into a compiled expression.

use thiserror::Error;

/// A quote or function block was opened but never closed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} at location {index}")]
pub struct TokenError {
    pub message: String,
    pub index: usize,
}

impl TokenError {
    pub fn new(message: impl Into<String>, index: usize) -> Self {
        Self {
            message: message.into(),
            index,
        }
    }
}

/// Structural problem found while building the AST.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} at location {index}")]
pub struct ParseError {
    pub message: String,
    pub index: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, index: usize) -> Self {
        Self {
            message: message.into(),
            index,
        }
    }
}

/// Any failure of the text → AST → expression pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("Tokenizer error: {0}")]
    Token(#[from] TokenError),

    #[error("Parser error: {0}")]
    Parse(#[from] ParseError),

    /// A node was asked to compile without the operands it needs.
    #[error("Structural error: {message} at location {index}")]
    Structural { message: String, index: usize },
}

impl CompileError {
    /// Character offset the error points at.
    pub fn index(&self) -> usize {
        match self {
            CompileError::Token(e) => e.index,
            CompileError::Parse(e) => e.index,
            CompileError::Structural { index, .. } => *index,
        }
    }
}

pub type TokenResult<T> = Result<T, TokenError>;
pub type ParseResult<T> = Result<T, ParseError>;
pub type CompileResult<T> = Result<T, CompileError>;
