// Simple language front end - tokenizing, parsing and compiling expression text

pub mod ast;
pub mod builder;
pub mod compile;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::Node;
pub use compile::Compiler;
pub use error::{CompileError, CompileResult, ParseError, TokenError};
pub use lexer::Lexer;
pub use parser::Parser;
pub use token::{Token, TokenKind};

use crate::expression::Expression;
use crate::language::LanguageConfig;
use std::sync::Arc;

/// How top-level text is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompileMode {
    /// Functions and unary operators are structural; everything else is text.
    Expression,
    /// Quotes, binary and logical operators are structural as well.
    Predicate,
}

/// Tokenize and parse `text` into its root node.
pub fn parse(text: &str, mode: CompileMode, allow_escape: bool) -> CompileResult<Node> {
    let tokens = Lexer::new(text, mode).with_escape(allow_escape).tokenize()?;
    Ok(Parser::new(tokens, mode).parse()?)
}

/// Run the whole pipeline: text, tokens, AST, compiled expression.
pub fn compile(
    text: &str,
    mode: CompileMode,
    config: &Arc<LanguageConfig>,
) -> CompileResult<Expression> {
    let root = parse(text, mode, config.allow_escape)?;
    Compiler::new(text, config.clone()).compile_root(&root, mode)
}
