// Abstract syntax tree produced by the parser

use super::token::Token;
use crate::expression::{BinaryOperator, LogicalOperator, UnaryOperator};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Literal(LiteralNode),
    /// Concatenation of the children's text.
    Composite(Vec<Node>),
    Function(BlockNode),
    SingleQuote(BlockNode),
    DoubleQuote(BlockNode),
    Binary(BinaryNode),
    Unary(UnaryNode),
    Logical(LogicalNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralNode {
    /// Text with escapes resolved.
    pub text: String,
    /// Text exactly as written.
    pub raw: String,
    pub index: usize,
}

impl LiteralNode {
    pub fn from_token(token: &Token) -> Self {
        Self {
            text: token.text.clone(),
            raw: token.raw.clone(),
            index: token.index,
        }
    }
}

/// A function or quote block. `token` is the opening marker.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockNode {
    pub children: Vec<Node>,
    pub token: Token,
}

impl BlockNode {
    /// The leading literal text of the block, if it starts with one.
    pub fn leading_text(&self) -> Option<&str> {
        match self.children.first() {
            Some(Node::Literal(lit)) => Some(&lit.text),
            _ => None,
        }
    }

    /// The literal text when the block holds exactly one literal.
    pub fn single_literal(&self) -> Option<&LiteralNode> {
        match self.children.as_slice() {
            [Node::Literal(lit)] => Some(lit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryNode {
    pub op: BinaryOperator,
    pub left: Option<Box<Node>>,
    pub right: Option<Box<Node>>,
    pub token: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryNode {
    pub op: UnaryOperator,
    pub operand: Option<Box<Node>>,
    pub token: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalNode {
    pub op: LogicalOperator,
    pub left: Option<Box<Node>>,
    pub right: Option<Box<Node>>,
    pub token: Token,
}

impl Node {
    /// Character offset of the token that starts this node.
    pub fn index(&self) -> usize {
        match self {
            Node::Literal(lit) => lit.index,
            Node::Composite(children) => children.first().map_or(0, Node::index),
            Node::Function(block) | Node::SingleQuote(block) | Node::DoubleQuote(block) => {
                block.token.index
            }
            Node::Binary(node) => node.left.as_ref().map_or(node.token.index, |l| l.index()),
            Node::Unary(node) => node.operand.as_ref().map_or(node.token.index, |o| o.index()),
            Node::Logical(node) => node.left.as_ref().map_or(node.token.index, |l| l.index()),
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Node::Literal(_))
    }
}

fn write_children(f: &mut fmt::Formatter<'_>, children: &[Node]) -> fmt::Result {
    for child in children {
        write!(f, "{}", child)?;
    }
    Ok(())
}

fn write_operand(f: &mut fmt::Formatter<'_>, operand: &Option<Box<Node>>) -> fmt::Result {
    match operand {
        Some(node) => write!(f, "{}", node),
        None => Ok(()),
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Literal(lit) => f.write_str(&lit.raw),
            Node::Composite(children) => write_children(f, children),
            Node::Function(block) => {
                f.write_str("${")?;
                write_children(f, &block.children)?;
                f.write_str("}")
            }
            Node::SingleQuote(block) => {
                f.write_str("'")?;
                write_children(f, &block.children)?;
                f.write_str("'")
            }
            Node::DoubleQuote(block) => {
                f.write_str("\"")?;
                write_children(f, &block.children)?;
                f.write_str("\"")
            }
            Node::Binary(node) => {
                write_operand(f, &node.left)?;
                write!(f, " {} ", node.token.raw)?;
                write_operand(f, &node.right)
            }
            Node::Unary(node) => {
                write_operand(f, &node.operand)?;
                f.write_str(node.op.as_str())
            }
            Node::Logical(node) => {
                write_operand(f, &node.left)?;
                write!(f, " {} ", node.op)?;
                write_operand(f, &node.right)
            }
        }
    }
}
