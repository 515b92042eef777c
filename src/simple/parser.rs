// Parser - resolves block nesting and operator binding into a single root node

use super::ast::{LiteralNode, LogicalNode, Node, UnaryNode};
use super::builder::{BinaryBuilder, BlockBuilder, BlockKind};
use super::error::{ParseError, ParseResult};
use super::token::{Token, TokenKind};
use super::CompileMode;
use crate::expression::{LogicalOperator, UnaryOperator};
use std::collections::VecDeque;

/// A top-level item: either a finished operand or an operator token.
#[derive(Debug)]
enum Item {
    Node(Node),
    Operator(Token),
}

pub struct Parser {
    tokens: Vec<Token>,
    mode: CompileMode,
    items: VecDeque<Item>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>, mode: CompileMode) -> Self {
        Parser {
            tokens,
            mode,
            items: VecDeque::new(),
        }
    }

    /// Parse the tokens into one root node.
    ///
    /// In expression mode the root is the single top-level node or a
    /// composite of all of them. In predicate mode the root is a binary or
    /// logical tree; an empty predicate yields an empty composite.
    pub fn parse(mut self) -> ParseResult<Node> {
        let items = self.build_blocks()?;
        self.items = bind_unary(items)?.into();

        match self.mode {
            CompileMode::Expression => self.parse_composite(),
            CompileMode::Predicate => self.parse_predicate(),
        }
    }

    /// First pass: fold block tokens into function and quote nodes.
    fn build_blocks(&self) -> ParseResult<Vec<Item>> {
        let mut stack: Vec<BlockBuilder> = Vec::new();
        let mut items = Vec::new();

        for token in &self.tokens {
            match token.kind {
                TokenKind::FunctionStart
                | TokenKind::FunctionEnd
                | TokenKind::SingleQuote
                | TokenKind::DoubleQuote => match stack.pop() {
                    Some(mut block) if block.kind().is_closed_by(token.kind) => {
                        block.close();
                        let node = block.freeze()?;
                        emit(&mut stack, &mut items, node)?;
                    }
                    open => {
                        stack.extend(open);
                        let kind = BlockKind::from_token(token.kind)
                            .ok_or_else(|| ParseError::new("Unexpected token", token.index))?;
                        stack.push(BlockBuilder::new(kind, token.clone()));
                    }
                },
                TokenKind::Literal => {
                    let node = Node::Literal(LiteralNode::from_token(token));
                    emit(&mut stack, &mut items, node)?;
                }
                TokenKind::Whitespace => {}
                TokenKind::BinaryOperator
                | TokenKind::UnaryOperator
                | TokenKind::LogicalOperator => {
                    if !stack.is_empty() {
                        return Err(ParseError::new("Unexpected token", token.index));
                    }
                    items.push(Item::Operator(token.clone()));
                }
            }
        }

        if let Some(open) = stack.pop() {
            // Never closed, so this reports the missing end marker.
            open.freeze()?;
        }

        Ok(items)
    }

    fn parse_composite(&mut self) -> ParseResult<Node> {
        let mut nodes = Vec::with_capacity(self.items.len());
        while let Some(item) = self.items.pop_front() {
            match item {
                Item::Node(node) => nodes.push(node),
                Item::Operator(token) => {
                    return Err(ParseError::new("Unexpected token", token.index))
                }
            }
        }

        if nodes.len() == 1 {
            if let Some(node) = nodes.pop() {
                return Ok(node);
            }
        }
        Ok(Node::Composite(nodes))
    }

    fn parse_predicate(&mut self) -> ParseResult<Node> {
        if self.items.is_empty() {
            return Ok(Node::Composite(Vec::new()));
        }

        let root = self.parse_logical()?;

        match self.items.pop_front() {
            None => Ok(root),
            Some(Item::Node(Node::Literal(lit))) => Err(ParseError::new("Unknown operator", lit.index)),
            Some(Item::Node(node)) => Err(ParseError::new("Unexpected token", node.index())),
            Some(Item::Operator(token)) => Err(ParseError::new("Unexpected token", token.index)),
        }
    }

    /// `comparison ((&& | ||)? comparison)*`, left to right.
    ///
    /// A comparison written directly after a finished binary comparison is
    /// joined with `&&`. A bare word in that position stays an error.
    fn parse_logical(&mut self) -> ParseResult<Node> {
        let mut left = self.parse_comparison()?;
        let mut joinable = matches!(left, Node::Binary(_));

        loop {
            let (op, token) = if let Some(token) = self.take_operator(TokenKind::LogicalOperator) {
                let op = LogicalOperator::from_symbol(&token.text)
                    .ok_or_else(|| ParseError::new("Unknown operator", token.index))?;
                if !matches!(self.items.front(), Some(Item::Node(_))) {
                    return Err(ParseError::new(
                        format!("Logical operator {} has no right hand side token", token.text),
                        token.index,
                    ));
                }
                (op, token)
            } else {
                match self.items.front() {
                    Some(Item::Node(next)) if joinable && !next.is_literal() => {
                        let implicit = Token::new(
                            TokenKind::LogicalOperator,
                            LogicalOperator::And.to_string(),
                            next.index(),
                        );
                        (LogicalOperator::And, implicit)
                    }
                    _ => break,
                }
            };

            let right = self.parse_comparison()?;
            joinable = matches!(right, Node::Binary(_));
            left = Node::Logical(LogicalNode {
                op,
                left: Some(Box::new(left)),
                right: Some(Box::new(right)),
                token,
            });
        }

        Ok(left)
    }

    /// `operand (binop operand)?`
    fn parse_comparison(&mut self) -> ParseResult<Node> {
        let left = self.parse_operand()?;

        let Some(token) = self.take_operator(TokenKind::BinaryOperator) else {
            return Ok(left);
        };

        let mut builder = BinaryBuilder::new(token)?;
        builder
            .accept_left(left)
            .map_err(|node| ParseError::new("Unexpected token", node.index()))?;
        if matches!(self.items.front(), Some(Item::Node(_))) {
            let right = self.parse_operand()?;
            builder
                .accept_right(right)
                .map_err(|node| ParseError::new("Unexpected token", node.index()))?;
        }
        builder.freeze()
    }

    fn parse_operand(&mut self) -> ParseResult<Node> {
        match self.items.pop_front() {
            Some(Item::Node(node)) => Ok(node),
            Some(Item::Operator(token)) => Err(ParseError::new(
                format!(
                    "{} operator {} has no left hand side token",
                    operator_label(token.kind),
                    token.text
                ),
                token.index,
            )),
            None => Err(ParseError::new(
                "Unexpected end of expression",
                self.tokens.last().map_or(0, |t| t.index),
            )),
        }
    }

    fn take_operator(&mut self, kind: TokenKind) -> Option<Token> {
        match self.items.front() {
            Some(Item::Operator(token)) if token.kind == kind => match self.items.pop_front() {
                Some(Item::Operator(token)) => Some(token),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Hand a finished node to the innermost open block, or to the top level.
fn emit(stack: &mut [BlockBuilder], items: &mut Vec<Item>, node: Node) -> ParseResult<()> {
    match stack.last_mut() {
        Some(block) => block
            .accept(node)
            .map_err(|node| ParseError::new("Unexpected token", node.index())),
        None => {
            items.push(Item::Node(node));
            Ok(())
        }
    }
}

/// Attach every `++`/`--` to the function directly before it.
fn bind_unary(items: Vec<Item>) -> ParseResult<Vec<Item>> {
    let mut bound = Vec::with_capacity(items.len());

    for item in items {
        match item {
            Item::Operator(token) if token.kind == TokenKind::UnaryOperator => {
                let op = UnaryOperator::from_symbol(&token.text)
                    .ok_or_else(|| ParseError::new("Unknown operator", token.index))?;
                match bound.pop() {
                    Some(Item::Node(operand @ Node::Function(_))) => {
                        bound.push(Item::Node(Node::Unary(UnaryNode {
                            op,
                            operand: Some(Box::new(operand)),
                            token,
                        })));
                    }
                    _ => {
                        return Err(ParseError::new(
                            format!("Unary operator {} has no left hand side token", token.text),
                            token.index,
                        ))
                    }
                }
            }
            other => bound.push(other),
        }
    }

    Ok(bound)
}

fn operator_label(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::LogicalOperator => "Logical",
        TokenKind::UnaryOperator => "Unary",
        _ => "Binary",
    }
}
