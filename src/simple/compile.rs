// Compiler - turns AST nodes into evaluation closures

use super::ast::{BinaryNode, BlockNode, LogicalNode, Node, UnaryNode};
use super::error::{CompileError, CompileResult};
use super::lexer::Lexer;
use super::parser::Parser;
use super::CompileMode;
use crate::expression::{
    evaluate_binary, evaluate_unary, parse_numeric, EvalError, EvalResult, EvaluationContext,
    Expression, LogicalOperator, Predicate, Site, Value,
};
use crate::language::LanguageConfig;
use std::sync::Arc;

pub struct Compiler {
    /// Full source text, carried into evaluation errors.
    expression: Arc<str>,
    config: Arc<LanguageConfig>,
}

impl Compiler {
    pub fn new(expression: &str, config: Arc<LanguageConfig>) -> Self {
        Self {
            expression: expression.into(),
            config,
        }
    }

    /// Compile the root node produced by the parser.
    ///
    /// In predicate mode a bare literal is a typed constant and an empty
    /// root is constant `false`.
    pub fn compile_root(&self, root: &Node, mode: CompileMode) -> CompileResult<Expression> {
        let expression = match (mode, root) {
            (CompileMode::Predicate, Node::Composite(children)) if children.is_empty() => {
                Expression::constant("false", Value::Boolean(false))
            }
            (CompileMode::Predicate, node) => self.compile_operand(node)?,
            (CompileMode::Expression, node) => self.compile(node)?,
        };
        Ok(expression.with_text(root.to_string()))
    }

    pub fn compile(&self, node: &Node) -> CompileResult<Expression> {
        match node {
            Node::Literal(lit) => Ok(Expression::constant(
                lit.raw.as_str(),
                Value::String(lit.text.clone()),
            )),
            Node::Composite(children) => self.compile_concat(node, children),
            Node::Function(block) => self.compile_function(node, block),
            Node::SingleQuote(block) | Node::DoubleQuote(block) => {
                self.compile_concat(node, &block.children)
            }
            Node::Binary(binary) => self.compile_binary(node, binary),
            Node::Unary(unary) => self.compile_unary(node, unary),
            Node::Logical(logical) => self.compile_logical(node, logical),
        }
    }

    /// Operands of binary and logical operators: bare literals are typed.
    fn compile_operand(&self, node: &Node) -> CompileResult<Expression> {
        match node {
            Node::Literal(lit) => Ok(Expression::constant(
                lit.raw.as_str(),
                typed_constant(&lit.text),
            )),
            other => self.compile(other),
        }
    }

    /// Concatenate the children's text. A single child keeps its own type.
    fn compile_concat(&self, node: &Node, children: &[Node]) -> CompileResult<Expression> {
        match children {
            [] => Ok(Expression::constant(node.to_string(), Value::string(""))),
            [child] => Ok(self.compile(child)?.with_text(node.to_string())),
            _ => {
                let parts = children
                    .iter()
                    .map(|child| self.compile(child))
                    .collect::<CompileResult<Vec<_>>>()?;
                Ok(Expression::new(node.to_string(), move |ctx| {
                    let mut text = String::new();
                    for part in &parts {
                        text.push_str(&part.value(ctx)?.to_text());
                    }
                    Ok(Value::String(text))
                }))
            }
        }
    }

    fn compile_function(&self, node: &Node, block: &BlockNode) -> CompileResult<Expression> {
        if let Some(lit) = block.single_literal() {
            let name = lit.text.clone();
            return Ok(Expression::new(node.to_string(), move |ctx| ctx.resolve(&name)));
        }
        if block.children.is_empty() {
            return Err(structural("Function block has no content", block.token.index));
        }

        let quote_values = block
            .leading_text()
            .map_or(false, |text| self.config.is_call_style(text));
        let pieces = block
            .children
            .iter()
            .map(|child| self.compile_piece(child, quote_values))
            .collect::<CompileResult<Vec<_>>>()?;

        let expression = self.expression.clone();
        let config = self.config.clone();
        let index = block.token.index;
        Ok(Expression::new(node.to_string(), move |ctx| {
            let mut text = String::new();
            for piece in &pieces {
                piece.render(ctx, &mut text, config.allow_escape)?;
            }
            resolve_dynamic(ctx, &text, &config, &expression, index)
        }))
    }

    fn compile_piece(&self, child: &Node, quote_values: bool) -> CompileResult<Piece> {
        match child {
            Node::Literal(lit) => Ok(Piece::Text(lit.raw.clone())),
            Node::Function(inner)
                if inner
                    .leading_text()
                    .map_or(false, |text| self.config.is_static_reference(text)) =>
            {
                Ok(Piece::Text(child.to_string()))
            }
            other => Ok(Piece::Value {
                expression: self.compile(other)?,
                quote: quote_values,
            }),
        }
    }

    fn compile_binary(&self, node: &Node, binary: &BinaryNode) -> CompileResult<Expression> {
        let left_node = binary.left.as_deref().ok_or_else(|| {
            structural(
                format!("Binary operator {} has no left hand side", binary.token.text),
                binary.token.index,
            )
        })?;
        let right_node = binary.right.as_deref().ok_or_else(|| {
            structural(
                format!("Binary operator {} has no right hand side", binary.token.text),
                binary.token.index,
            )
        })?;

        let left = self.compile_operand(left_node)?;
        let right = self.compile_operand(right_node)?;
        let op = binary.op;
        let right_index = right_node.index();
        let expression = self.expression.clone();

        Ok(Expression::new(node.to_string(), move |ctx| {
            let l = left.value(ctx)?;
            let r = right.value(ctx)?;
            let site = Site {
                expression: &expression,
                index: right_index,
            };
            evaluate_binary(ctx, op, &l, &r, site).map(Value::Boolean)
        }))
    }

    fn compile_unary(&self, node: &Node, unary: &UnaryNode) -> CompileResult<Expression> {
        let operand_node = unary.operand.as_deref().ok_or_else(|| {
            structural(
                format!("Unary operator {} has no left hand side", unary.token.text),
                unary.token.index,
            )
        })?;

        let operand = self.compile(operand_node)?;
        let op = unary.op;
        let operand_index = operand_node.index();
        let expression = self.expression.clone();

        Ok(Expression::new(node.to_string(), move |ctx| {
            let value = operand.value(ctx)?;
            let site = Site {
                expression: &expression,
                index: operand_index,
            };
            evaluate_unary(ctx, op, &value, site)
        }))
    }

    fn compile_logical(&self, node: &Node, logical: &LogicalNode) -> CompileResult<Expression> {
        let missing = |side: &str| {
            structural(
                format!("Logical operator {} has no {} hand side", logical.token.text, side),
                logical.token.index,
            )
        };
        let left_node = logical.left.as_deref().ok_or_else(|| missing("left"))?;
        let right_node = logical.right.as_deref().ok_or_else(|| missing("right"))?;

        let left = Predicate::new(self.compile_operand(left_node)?);
        let right = Predicate::new(self.compile_operand(right_node)?);
        let op = logical.op;

        Ok(Expression::new(node.to_string(), move |ctx| {
            let result = match op {
                LogicalOperator::And => left.matches(ctx)? && right.matches(ctx)?,
                LogicalOperator::Or => left.matches(ctx)? || right.matches(ctx)?,
            };
            Ok(Value::Boolean(result))
        }))
    }
}

/// One child of a function whose text is assembled at evaluation time.
enum Piece {
    Text(String),
    Value { expression: Expression, quote: bool },
}

impl Piece {
    /// Append this piece to the function text. A quoted value escapes its
    /// own delimiter, and with escapes enabled the result is escaped once
    /// more so the text survives being tokenized again.
    fn render(&self, ctx: &dyn EvaluationContext, out: &mut String, escape: bool) -> EvalResult<()> {
        match self {
            Piece::Text(text) => out.push_str(text),
            Piece::Value { expression, quote } => {
                let text = expression.value(ctx)?.to_text();
                if *quote && !is_quoted(&text) {
                    let quoted = quote_value(&text);
                    if escape {
                        out.push_str(&escape_function_text(&quoted));
                    } else {
                        out.push_str(&quoted);
                    }
                } else {
                    out.push_str(&text);
                }
            }
        }
        Ok(())
    }
}

/// Wrap in single quotes, or in double quotes when the text holds a single
/// quote. The chosen delimiter is backslash-escaped inside the text.
fn quote_value(text: &str) -> String {
    let mark = if text.contains('\'') { '"' } else { '\'' };
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push(mark);
    for c in text.chars() {
        if c == mark {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push(mark);
    quoted
}

/// Escape the characters the tokenizer treats specially inside a function.
fn escape_function_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '$' | '}') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn is_quoted(text: &str) -> bool {
    let mut chars = text.chars();
    match (chars.next(), chars.next_back()) {
        (Some(first), Some(last)) => first == last && (first == '\'' || first == '"'),
        _ => false,
    }
}

/// Compile the assembled text as a function again and resolve it.
fn resolve_dynamic(
    ctx: &dyn EvaluationContext,
    text: &str,
    config: &LanguageConfig,
    expression: &str,
    index: usize,
) -> EvalResult<Value> {
    let source = format!("${{{}}}", text);
    let invalid = |e: CompileError| {
        EvalError::illegal_syntax(
            expression,
            index,
            format!("Cannot compile function {}: {}", source, e),
        )
    };

    let tokens = Lexer::new(&source, CompileMode::Expression)
        .with_escape(config.allow_escape)
        .tokenize()
        .map_err(|e| invalid(e.into()))?;
    let root = Parser::new(tokens, CompileMode::Expression)
        .parse()
        .map_err(|e| invalid(e.into()))?;

    match &root {
        Node::Function(block) => match block.single_literal() {
            Some(lit) => ctx.resolve(&lit.text),
            None => ctx.resolve(text),
        },
        _ => ctx.resolve(text),
    }
}

/// `null`, `true`, `false` and numbers; anything else stays text.
fn typed_constant(text: &str) -> Value {
    match text.to_ascii_lowercase().as_str() {
        "null" => Value::Null,
        "true" => Value::Boolean(true),
        "false" => Value::Boolean(false),
        _ => parse_numeric(text).unwrap_or_else(|| Value::string(text)),
    }
}

fn structural(message: impl Into<String>, index: usize) -> CompileError {
    CompileError::Structural {
        message: message.into(),
        index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{BinaryOperator, ValueType};
    use crate::simple::ast::LiteralNode;
    use crate::simple::token::{Token, TokenKind};
    use std::collections::HashMap;

    struct MapContext(HashMap<String, Value>);

    impl MapContext {
        fn new(entries: &[(&str, Value)]) -> Self {
            Self(
                entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
            )
        }
    }

    impl EvaluationContext for MapContext {
        fn resolve(&self, name: &str) -> EvalResult<Value> {
            self.0
                .get(name)
                .cloned()
                .ok_or_else(|| EvalError::unresolved(name, "not found"))
        }
    }

    fn compile(text: &str, mode: CompileMode) -> CompileResult<Expression> {
        let tokens = Lexer::new(text, mode).tokenize()?;
        let root = Parser::new(tokens, mode).parse()?;
        Compiler::new(text, Arc::new(LanguageConfig::default())).compile_root(&root, mode)
    }

    fn value(text: &str, ctx: &MapContext) -> Value {
        compile(text, CompileMode::Expression)
            .unwrap()
            .value(ctx)
            .unwrap()
    }

    fn matches(text: &str, ctx: &MapContext) -> EvalResult<bool> {
        Predicate::new(compile(text, CompileMode::Predicate).unwrap()).matches(ctx)
    }

    #[test]
    fn test_single_function_keeps_type() {
        let ctx = MapContext::new(&[("header.age", Value::Integer(20))]);
        assert_eq!(value("${header.age}", &ctx), Value::Integer(20));
        assert_eq!(value("age=${header.age}", &ctx), Value::string("age=20"));
        assert_eq!(value("", &ctx), Value::string(""));
    }

    #[test]
    fn test_nested_function_resolves_twice() {
        let ctx = MapContext::new(&[
            ("headerNameKey", Value::string("foo")),
            ("header.foo", Value::string("bar")),
        ]);
        assert_eq!(value("${header.${headerNameKey}}", &ctx), Value::string("bar"));
    }

    #[test]
    fn test_call_style_values_are_quoted() {
        let ctx = MapContext::new(&[
            ("header.name", Value::string("O'Brien")),
            ("header.city", Value::string("Cork")),
            ("bean:greeter.hello(\"O'Brien\")", Value::string("Hello O'Brien")),
            ("bean:greeter.visit('Cork')", Value::string("Welcome to Cork")),
        ]);
        assert_eq!(
            value("${bean:greeter.hello(${header.name})}", &ctx),
            Value::string("Hello O'Brien")
        );
        assert_eq!(
            value("${bean:greeter.visit(${header.city})}", &ctx),
            Value::string("Welcome to Cork")
        );

        // Outside call-style functions values are spliced as-is
        let ctx = MapContext::new(&[
            ("key", Value::string("city")),
            ("header.city", Value::string("Cork")),
        ]);
        assert_eq!(value("${header.${key}}", &ctx), Value::string("Cork"));
    }

    #[test]
    fn test_call_style_value_with_both_quotes() {
        let ctx = MapContext::new(&[
            ("header.name", Value::string("O'Brien \"Jr\"")),
            ("header.path", Value::string("C:\\data}")),
            (
                "bean:greeter.hello(\"O'Brien \\\"Jr\\\"\")",
                Value::string("Hello Jr"),
            ),
            ("bean:files.open('C:\\data}')", Value::string("opened")),
        ]);
        assert_eq!(
            value("${bean:greeter.hello(${header.name})}", &ctx),
            Value::string("Hello Jr")
        );
        assert_eq!(
            value("${bean:files.open(${header.path})}", &ctx),
            Value::string("opened")
        );
    }

    #[test]
    fn test_quote_value() {
        assert_eq!(quote_value("Cork"), "'Cork'");
        assert_eq!(quote_value("O'Brien"), "\"O'Brien\"");
        assert_eq!(quote_value("O'Brien \"Jr\""), r#""O'Brien \"Jr\"""#);
        assert_eq!(escape_function_text(r#"'a\b}'"#), r#"'a\\b\}'"#);
    }

    #[test]
    fn test_static_reference_is_not_evaluated() {
        let ctx = MapContext::new(&[(
            "bean:limits.check(${type:org.example.Limits.MAX})",
            Value::Boolean(true),
        )]);
        assert_eq!(
            value("${bean:limits.check(${type:org.example.Limits.MAX})}", &ctx),
            Value::Boolean(true)
        );
    }

    #[test]
    fn test_unary() {
        let ctx = MapContext::new(&[
            ("header.count", Value::Integer(41)),
            ("header.name", Value::string("abc")),
        ]);
        assert_eq!(value("${header.count}++", &ctx), Value::Integer(42));
        assert_eq!(value("${header.count}--", &ctx), Value::Integer(40));

        let err = compile("${header.name}++", CompileMode::Expression)
            .unwrap()
            .value(&ctx)
            .unwrap_err();
        let EvalError::IllegalSyntax { index, message, .. } = err else {
            panic!("expected illegal syntax");
        };
        assert_eq!(index, 0);
        assert_eq!(message, "Cannot evaluate abc as number");
    }

    #[test]
    fn test_typed_constants() {
        let ctx = MapContext::new(&[
            ("header.flag", Value::Boolean(true)),
            ("header.missing", Value::Null),
            ("header.price", Value::Float(9.5)),
        ]);
        assert!(matches("${header.flag} == true", &ctx).unwrap());
        assert!(matches("${header.missing} == null", &ctx).unwrap());
        assert!(matches("${header.price} < 10", &ctx).unwrap());
        assert!(matches("${header.price} == 9.5", &ctx).unwrap());
        assert!(matches("true", &ctx).unwrap());
        assert!(!matches("", &ctx).unwrap());
    }

    #[test]
    fn test_quoted_numbers_stay_text() {
        let ctx = MapContext::new(&[]);
        let expr = compile("'123'", CompileMode::Predicate).unwrap();
        assert_eq!(expr.value(&ctx).unwrap(), Value::string("123"));
        assert_eq!(expr.to_string(), "'123'");
    }

    #[test]
    fn test_logical_short_circuit() {
        let ctx = MapContext::new(&[("header.a", Value::Integer(1))]);
        // The right side would fail to resolve if evaluated
        assert!(matches("${header.a} == 1 || ${header.nope} == 2", &ctx).unwrap());
        assert!(!matches("${header.a} == 2 && ${header.nope} == 2", &ctx).unwrap());
        assert!(matches("${header.a} == 1 && ${header.nope} == 2", &ctx).is_err());
    }

    #[test]
    fn test_is_error_carries_right_index() {
        let ctx = MapContext::new(&[("header.type", Value::string("x"))]);
        let err = matches("${header.type} is 'com.foo.Missing'", &ctx).unwrap_err();
        let EvalError::IllegalSyntax {
            expression, index, ..
        } = err
        else {
            panic!("expected illegal syntax");
        };
        assert_eq!(index, 18);
        assert_eq!(expression, "${header.type} is 'com.foo.Missing'");
    }

    #[test]
    fn test_predicate_text_is_normalized() {
        let expr = compile("${header.a}   ==    'x'", CompileMode::Predicate).unwrap();
        assert_eq!(expr.to_string(), "${header.a} == 'x'");
    }

    #[test]
    fn test_structural_error() {
        let node = Node::Binary(BinaryNode {
            op: BinaryOperator::Eq,
            left: Some(Box::new(Node::Literal(LiteralNode {
                text: "a".to_string(),
                raw: "a".to_string(),
                index: 0,
            }))),
            right: None,
            token: Token::new(TokenKind::BinaryOperator, "==", 2),
        });
        let compiler = Compiler::new("a ==", Arc::new(LanguageConfig::default()));
        let err = compiler.compile(&node).unwrap_err();
        assert_eq!(
            err,
            CompileError::Structural {
                message: "Binary operator == has no right hand side".to_string(),
                index: 2,
            }
        );
    }

    #[test]
    fn test_evaluate_with_boolean_target() {
        let ctx = MapContext::new(&[("header.flag", Value::string("TRUE"))]);
        let expr = compile("${header.flag}", CompileMode::Expression).unwrap();
        assert_eq!(
            expr.evaluate(&ctx, ValueType::Boolean).unwrap(),
            Value::Boolean(true)
        );
    }
}
