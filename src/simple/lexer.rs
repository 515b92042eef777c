// Lexer - splits expression text into positioned tokens

use super::error::{TokenError, TokenResult};
use super::token::{Token, TokenKind};
use super::CompileMode;
use crate::expression::BinaryOperator;

const LOGICAL_SYMBOLS: [&str; 2] = ["&&", "||"];

pub struct Lexer {
    chars: Vec<char>,
    position: usize,
    mode: CompileMode,
    allow_escape: bool,
    /// Blocks opened but not yet closed, innermost last, with their start index.
    open_blocks: Vec<(TokenKind, usize)>,
    /// Position just past the most recent function close.
    function_end: Option<usize>,
}

impl Lexer {
    pub fn new(input: &str, mode: CompileMode) -> Self {
        Lexer {
            chars: input.chars().collect(),
            position: 0,
            mode,
            allow_escape: true,
            open_blocks: Vec::new(),
            function_end: None,
        }
    }

    pub fn with_escape(mut self, allow_escape: bool) -> Self {
        self.allow_escape = allow_escape;
        self
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> TokenResult<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            tokens.push(token);
        }

        if let Some((kind, index)) = self.open_blocks.last() {
            let message = match kind {
                TokenKind::SingleQuote => "single quote has no ending quote",
                TokenKind::DoubleQuote => "double quote has no ending quote",
                _ => "function has no ending token",
            };
            return Err(TokenError::new(message, *index));
        }

        Ok(tokens)
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Option<Token> {
        self.current()?;
        let start = self.position;

        if let Some((kind, len)) = self.match_special() {
            let raw: String = self.chars[start..start + len].iter().collect();
            self.position += len;
            self.track_block(kind, start);
            if kind == TokenKind::FunctionEnd {
                self.function_end = Some(self.position);
            }
            return Some(Token::new(kind, raw, start));
        }

        Some(self.read_literal())
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.position + offset).copied()
    }

    fn starts_with_at(&self, position: usize, text: &str) -> bool {
        let mut i = position;
        for expected in text.chars() {
            match self.chars.get(i) {
                Some(c) if *c == expected => i += 1,
                _ => return false,
            }
        }
        true
    }

    /// Whether the character at `position` ends a word: end of input or whitespace.
    fn boundary_at(&self, position: usize) -> bool {
        self.chars.get(position).map_or(true, |c| c.is_whitespace())
    }

    /// Recognise a structural token at the current position, returning its
    /// kind and length in characters. What counts as structural depends on
    /// the innermost open block.
    fn match_special(&self) -> Option<(TokenKind, usize)> {
        let c = self.current()?;

        if c == '$' && self.peek_at(1) == Some('{') {
            return Some((TokenKind::FunctionStart, 2));
        }

        match self.open_blocks.last().map(|(kind, _)| *kind) {
            Some(TokenKind::FunctionStart) => {
                (c == '}').then_some((TokenKind::FunctionEnd, 1))
            }
            Some(TokenKind::SingleQuote) => (c == '\'').then_some((TokenKind::SingleQuote, 1)),
            Some(TokenKind::DoubleQuote) => (c == '"').then_some((TokenKind::DoubleQuote, 1)),
            _ => self.match_top_level(c),
        }
    }

    fn match_top_level(&self, c: char) -> Option<(TokenKind, usize)> {
        if let Some(len) = self.match_unary() {
            return Some((TokenKind::UnaryOperator, len));
        }

        if self.mode != CompileMode::Predicate {
            return None;
        }

        match c {
            '\'' => return Some((TokenKind::SingleQuote, 1)),
            '"' => return Some((TokenKind::DoubleQuote, 1)),
            _ => {}
        }

        if let Some(found) = self.match_operator() {
            return Some(found);
        }

        if c.is_whitespace() {
            let len = self.chars[self.position..]
                .iter()
                .take_while(|c| c.is_whitespace())
                .count();
            return Some((TokenKind::Whitespace, len));
        }

        None
    }

    /// `++` and `--` only count directly after a function and before
    /// whitespace or the end of input; anywhere else they are text.
    fn match_unary(&self) -> Option<usize> {
        if self.function_end != Some(self.position) {
            return None;
        }
        let is_unary = self.starts_with_at(self.position, "++")
            || self.starts_with_at(self.position, "--");
        (is_unary && self.boundary_at(self.position + 2)).then_some(2)
    }

    /// Binary and logical operators must be surrounded by whitespace (or
    /// the start/end of input). Longest spelling wins.
    fn match_operator(&self) -> Option<(TokenKind, usize)> {
        let preceded = self.position == 0 || self.boundary_at(self.position - 1);
        if !preceded {
            return None;
        }

        let candidates = LOGICAL_SYMBOLS
            .iter()
            .map(|s| (TokenKind::LogicalOperator, *s))
            .chain(BinaryOperator::symbols().map(|s| (TokenKind::BinaryOperator, s)));

        for (kind, symbol) in candidates {
            let len = symbol.chars().count();
            if self.starts_with_at(self.position, symbol) && self.boundary_at(self.position + len) {
                return Some((kind, len));
            }
        }
        None
    }

    fn track_block(&mut self, kind: TokenKind, index: usize) {
        match kind {
            TokenKind::FunctionStart => self.open_blocks.push((kind, index)),
            TokenKind::FunctionEnd => {
                self.open_blocks.pop();
            }
            TokenKind::SingleQuote | TokenKind::DoubleQuote => {
                if self.open_blocks.last().map(|(k, _)| *k) == Some(kind) {
                    self.open_blocks.pop();
                } else {
                    self.open_blocks.push((kind, index));
                }
            }
            _ => {}
        }
    }

    /// Read literal text up to the next structural token.
    fn read_literal(&mut self) -> Token {
        let start = self.position;
        let mut text = String::new();

        while let Some(ch) = self.current() {
            if self.position > start && self.match_special().is_some() {
                break;
            }

            if self.allow_escape && ch == '\\' {
                if let Some(escaped) = self.peek_at(1).and_then(unescape) {
                    text.push(escaped);
                    self.position += 2;
                    continue;
                }
            }

            text.push(ch);
            self.position += 1;
        }

        let raw: String = self.chars[start..self.position].iter().collect();
        Token::with_raw(TokenKind::Literal, text, raw, start)
    }
}

fn unescape(c: char) -> Option<char> {
    match c {
        'n' => Some('\n'),
        't' => Some('\t'),
        'r' => Some('\r'),
        '\\' | '\'' | '"' | '$' | '}' => Some(c),
        _ => None,
    }
}
