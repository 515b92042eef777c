// Builders that accumulate children while a block or operator is open

use super::ast::{BinaryNode, BlockNode, Node};
use super::error::{ParseError, ParseResult};
use super::token::{Token, TokenKind};
use crate::expression::BinaryOperator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Function,
    SingleQuote,
    DoubleQuote,
}

impl BlockKind {
    pub fn from_token(kind: TokenKind) -> Option<BlockKind> {
        match kind {
            TokenKind::FunctionStart => Some(BlockKind::Function),
            TokenKind::SingleQuote => Some(BlockKind::SingleQuote),
            TokenKind::DoubleQuote => Some(BlockKind::DoubleQuote),
            _ => None,
        }
    }

    /// Whether a token of `kind` closes a block of this kind.
    pub fn is_closed_by(&self, kind: TokenKind) -> bool {
        matches!(
            (self, kind),
            (BlockKind::Function, TokenKind::FunctionEnd)
                | (BlockKind::SingleQuote, TokenKind::SingleQuote)
                | (BlockKind::DoubleQuote, TokenKind::DoubleQuote)
        )
    }

    fn describe(&self) -> &'static str {
        match self {
            BlockKind::Function => "Function",
            BlockKind::SingleQuote => "Single quote",
            BlockKind::DoubleQuote => "Double quote",
        }
    }
}

/// An open function or quote block.
///
/// Children are accepted until the parser closes the block; after that the
/// builder refuses everything and can only be frozen into a [`Node`].
#[derive(Debug)]
pub struct BlockBuilder {
    kind: BlockKind,
    token: Token,
    children: Vec<Node>,
    closed: bool,
}

impl BlockBuilder {
    pub fn new(kind: BlockKind, token: Token) -> Self {
        Self {
            kind,
            token,
            children: Vec::new(),
            closed: false,
        }
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    /// Offer a child to the block. Returns the child back when it is not
    /// consumed: the block is closed or the child is an operator node.
    pub fn accept(&mut self, child: Node) -> Result<(), Node> {
        if self.closed {
            return Err(child);
        }
        match child {
            Node::Literal(_)
            | Node::Composite(_)
            | Node::Function(_)
            | Node::SingleQuote(_)
            | Node::DoubleQuote(_) => {
                self.children.push(child);
                Ok(())
            }
            other => Err(other),
        }
    }

    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Turn the closed block into an immutable node.
    pub fn freeze(self) -> ParseResult<Node> {
        if !self.closed {
            return Err(ParseError::new(
                format!("{} has no ending", self.kind.describe()),
                self.token.index,
            ));
        }
        if self.kind == BlockKind::Function && self.children.is_empty() {
            return Err(ParseError::new(
                "Function block has no content",
                self.token.index,
            ));
        }

        let block = BlockNode {
            children: self.children,
            token: self.token,
        };
        Ok(match self.kind {
            BlockKind::Function => Node::Function(block),
            BlockKind::SingleQuote => Node::SingleQuote(block),
            BlockKind::DoubleQuote => Node::DoubleQuote(block),
        })
    }
}

/// A binary operator waiting for its operands.
#[derive(Debug)]
pub struct BinaryBuilder {
    op: BinaryOperator,
    token: Token,
    left: Option<Node>,
    right: Option<Node>,
}

impl BinaryBuilder {
    pub fn new(token: Token) -> ParseResult<Self> {
        let op = BinaryOperator::from_symbol(&token.text)
            .ok_or_else(|| ParseError::new("Unknown operator", token.index))?;
        Ok(Self {
            op,
            token,
            left: None,
            right: None,
        })
    }

    /// Bind the left operand. Returns it back if one is already bound.
    pub fn accept_left(&mut self, node: Node) -> Result<(), Node> {
        if self.left.is_some() {
            return Err(node);
        }
        self.left = Some(node);
        Ok(())
    }

    /// Bind the right operand. Returns it back if one is already bound.
    pub fn accept_right(&mut self, node: Node) -> Result<(), Node> {
        if self.right.is_some() {
            return Err(node);
        }
        self.right = Some(node);
        Ok(())
    }

    pub fn freeze(self) -> ParseResult<Node> {
        if self.left.is_none() {
            return Err(ParseError::new(
                format!("Binary operator {} has no left hand side token", self.token.text),
                self.token.index,
            ));
        }
        if self.right.is_none() {
            return Err(ParseError::new(
                format!("Binary operator {} has no right hand side token", self.token.text),
                self.token.index,
            ));
        }
        Ok(Node::Binary(BinaryNode {
            op: self.op,
            left: self.left.map(Box::new),
            right: self.right.map(Box::new),
            token: self.token,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simple::ast::LiteralNode;

    fn literal(text: &str) -> Node {
        Node::Literal(LiteralNode {
            text: text.to_string(),
            raw: text.to_string(),
            index: 0,
        })
    }

    #[test]
    fn test_block_accepts_until_closed() {
        let mut builder = BlockBuilder::new(
            BlockKind::Function,
            Token::new(TokenKind::FunctionStart, "${", 0),
        );
        assert!(builder.accept(literal("body")).is_ok());
        builder.close();
        assert!(builder.is_closed());
        assert!(builder.accept(literal("more")).is_err());

        let node = builder.freeze().unwrap();
        assert_eq!(node.to_string(), "${body}");
    }

    #[test]
    fn test_block_rejects_operators() {
        let mut builder = BlockBuilder::new(
            BlockKind::SingleQuote,
            Token::new(TokenKind::SingleQuote, "'", 0),
        );
        let mut binary =
            BinaryBuilder::new(Token::new(TokenKind::BinaryOperator, "==", 2)).unwrap();
        binary.accept_left(literal("a")).unwrap();
        binary.accept_right(literal("b")).unwrap();
        let rejected = builder.accept(binary.freeze().unwrap());
        assert!(matches!(rejected, Err(Node::Binary(_))));
    }

    #[test]
    fn test_freeze_errors() {
        let builder = BlockBuilder::new(
            BlockKind::DoubleQuote,
            Token::new(TokenKind::DoubleQuote, "\"", 4),
        );
        assert_eq!(
            builder.freeze().unwrap_err(),
            ParseError::new("Double quote has no ending", 4)
        );

        let mut builder = BlockBuilder::new(
            BlockKind::Function,
            Token::new(TokenKind::FunctionStart, "${", 1),
        );
        builder.close();
        assert_eq!(
            builder.freeze().unwrap_err().message,
            "Function block has no content"
        );

        let mut binary =
            BinaryBuilder::new(Token::new(TokenKind::BinaryOperator, "range", 7)).unwrap();
        binary.accept_left(literal("5")).unwrap();
        assert!(binary.accept_left(literal("6")).is_err());
        let err = binary.freeze().unwrap_err();
        assert_eq!(err.message, "Binary operator range has no right hand side token");
        assert_eq!(err.index, 7);
    }

    #[test]
    fn test_unknown_binary_operator() {
        let err = BinaryBuilder::new(Token::new(TokenKind::BinaryOperator, "like", 3)).unwrap_err();
        assert_eq!(err, ParseError::new("Unknown operator", 3));
    }

    #[test]
    fn test_block_kind_closing() {
        assert!(BlockKind::Function.is_closed_by(TokenKind::FunctionEnd));
        assert!(!BlockKind::SingleQuote.is_closed_by(TokenKind::DoubleQuote));
        assert_eq!(
            BlockKind::from_token(TokenKind::DoubleQuote),
            Some(BlockKind::DoubleQuote)
        );
        assert_eq!(BlockKind::from_token(TokenKind::Literal), None);
    }
}
