/*
 * expression.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Expression parsing.
//!
//! A small hand-rolled lexer and recursive-descent parser for the embedded
//! expression language: literals, identifiers, unary and binary operators,
//! array and object literals, member access, and filter calls. Dotted chains
//! of plain identifiers (`user.address.city`) stay a single identifier so
//! that variable resolution can apply its strict path rules; member
//! expressions only arise from computed access or from composite bases.

use crate::value::format_number;
use std::fmt;

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    /// A possibly dotted variable path (`user` or `user.name`).
    Identifier(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Member {
        object: Box<Expr>,
        property: Property,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Array(Vec<Expr>),
    Object(Vec<(String, Expr)>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    /// `.name` access on a composite base.
    Named(String),
    /// `[expr]` access.
    Computed(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    And,
    Or,
}

/// A lexing or parsing failure. The evaluator reports these uniformly as a
/// failure to parse the whole expression, so only the message survives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprError {
    pub message: String,
}

impl ExprError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ExprError {}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    True,
    False,
    Null,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Not,
    EqEq,
    NotEq,
    Gt,
    Ge,
    Lt,
    Le,
    AndAnd,
    OrOr,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Dot,
}

fn tokenize(source: &str) -> Result<Vec<Token>, ExprError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '[' => {
                tokens.push(Token::LBracket);
                i += 1;
            }
            ']' => {
                tokens.push(Token::RBracket);
                i += 1;
            }
            '{' => {
                tokens.push(Token::LBrace);
                i += 1;
            }
            '}' => {
                tokens.push(Token::RBrace);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            ':' => {
                tokens.push(Token::Colon);
                i += 1;
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            '.' => {
                // a leading-dot number like `.5`, otherwise member access
                if chars.get(i + 1).is_some_and(|c| c.is_ascii_digit()) {
                    let (token, next) = lex_number(&chars, i)?;
                    tokens.push(token);
                    i = next;
                } else {
                    tokens.push(Token::Dot);
                    i += 1;
                }
            }
            '!' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::NotEq);
                    i += 2;
                } else {
                    tokens.push(Token::Not);
                    i += 1;
                }
            }
            '=' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::EqEq);
                    i += 2;
                } else {
                    return Err(ExprError::new("Unexpected character '='"));
                }
            }
            '>' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Ge);
                    i += 2;
                } else {
                    tokens.push(Token::Gt);
                    i += 1;
                }
            }
            '<' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Le);
                    i += 2;
                } else {
                    tokens.push(Token::Lt);
                    i += 1;
                }
            }
            '&' => {
                if chars.get(i + 1) == Some(&'&') {
                    tokens.push(Token::AndAnd);
                    i += 2;
                } else {
                    return Err(ExprError::new("Unexpected character '&'"));
                }
            }
            '|' => {
                if chars.get(i + 1) == Some(&'|') {
                    tokens.push(Token::OrOr);
                    i += 2;
                } else {
                    return Err(ExprError::new("Unexpected character '|'"));
                }
            }
            '\'' | '"' => {
                let (token, next) = lex_string(&chars, i)?;
                tokens.push(token);
                i = next;
            }
            _ if c.is_ascii_digit() => {
                let (token, next) = lex_number(&chars, i)?;
                tokens.push(token);
                i = next;
            }
            _ if is_ident_start(c) => {
                let start = i;
                while i < chars.len() && is_ident_part(chars[i]) {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                tokens.push(match word.as_str() {
                    "true" => Token::True,
                    "false" => Token::False,
                    "null" => Token::Null,
                    _ => Token::Ident(word),
                });
            }
            _ => return Err(ExprError::new(format!("Unexpected character '{c}'"))),
        }
    }

    Ok(tokens)
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn lex_number(chars: &[char], start: usize) -> Result<(Token, usize), ExprError> {
    let mut i = start;
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    if i < chars.len() && chars[i] == '.' {
        i += 1;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
    }
    if i < chars.len() && matches!(chars[i], 'e' | 'E') {
        let mut j = i + 1;
        if j < chars.len() && matches!(chars[j], '+' | '-') {
            j += 1;
        }
        if j < chars.len() && chars[j].is_ascii_digit() {
            i = j;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
        }
    }
    let text: String = chars[start..i].iter().collect();
    match text.parse::<f64>() {
        Ok(n) => Ok((Token::Number(n), i)),
        Err(_) => Err(ExprError::new(format!("Invalid number '{text}'"))),
    }
}

fn lex_string(chars: &[char], start: usize) -> Result<(Token, usize), ExprError> {
    let quote = chars[start];
    let mut out = String::new();
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        if c == quote {
            return Ok((Token::Str(out), i + 1));
        }
        if c == '\\' {
            i += 1;
            let Some(&escaped) = chars.get(i) else {
                break;
            };
            out.push(match escaped {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                'b' => '\u{8}',
                'f' => '\u{c}',
                'v' => '\u{b}',
                other => other,
            });
            i += 1;
        } else {
            out.push(c);
            i += 1;
        }
    }
    Err(ExprError::new("Unterminated string literal"))
}

/// Parse an expression from source text.
pub fn parse_expression(source: &str) -> Result<Expr, ExprError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_or()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(ExprError::new(format!(
            "Unexpected trailing token {token:?}"
        ))),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<(), ExprError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(ExprError::new(format!(
                "Expected {token:?}, found {:?}",
                self.peek()
            )))
        }
    }

    fn parse_or(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_and()?;
        while self.eat(&Token::OrOr) {
            let right = self.parse_and()?;
            left = binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_equality()?;
        while self.eat(&Token::AndAnd) {
            let right = self.parse_equality()?;
            left = binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => BinaryOp::Eq,
                Some(Token::NotEq) => BinaryOp::Ne,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_relational()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::Ge) => BinaryOp::Ge,
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::Le) => BinaryOp::Le,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_additive()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Mod,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        let op = match self.peek() {
            Some(Token::Plus) => Some(UnaryOp::Plus),
            Some(Token::Minus) => Some(UnaryOp::Minus),
            Some(Token::Not) => Some(UnaryOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            self.pos += 1;
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, ExprError> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.eat(&Token::Dot) {
                let name = match self.advance() {
                    Some(Token::Ident(name)) => name,
                    other => {
                        return Err(ExprError::new(format!(
                            "Expected property name after '.', found {other:?}"
                        )));
                    }
                };
                // plain identifier chains stay a single dotted identifier
                expr = match expr {
                    Expr::Identifier(path) => Expr::Identifier(format!("{path}.{name}")),
                    object => Expr::Member {
                        object: Box::new(object),
                        property: Property::Named(name),
                    },
                };
            } else if self.eat(&Token::LBracket) {
                let property = self.parse_or()?;
                self.expect(&Token::RBracket)?;
                expr = Expr::Member {
                    object: Box::new(expr),
                    property: Property::Computed(Box::new(property)),
                };
            } else if self.eat(&Token::LParen) {
                let mut args = Vec::new();
                if !self.eat(&Token::RParen) {
                    loop {
                        args.push(self.parse_or()?);
                        if self.eat(&Token::Comma) {
                            continue;
                        }
                        self.expect(&Token::RParen)?;
                        break;
                    }
                }
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(Expr::Literal(Literal::Number(n))),
            Some(Token::Str(s)) => Ok(Expr::Literal(Literal::String(s))),
            Some(Token::True) => Ok(Expr::Literal(Literal::Bool(true))),
            Some(Token::False) => Ok(Expr::Literal(Literal::Bool(false))),
            Some(Token::Null) => Ok(Expr::Literal(Literal::Null)),
            Some(Token::Ident(name)) => Ok(Expr::Identifier(name)),
            Some(Token::LParen) => {
                let expr = self.parse_or()?;
                self.expect(&Token::RParen)?;
                Ok(expr)
            }
            Some(Token::LBracket) => {
                let mut elements = Vec::new();
                if !self.eat(&Token::RBracket) {
                    loop {
                        elements.push(self.parse_or()?);
                        if self.eat(&Token::Comma) {
                            continue;
                        }
                        self.expect(&Token::RBracket)?;
                        break;
                    }
                }
                Ok(Expr::Array(elements))
            }
            Some(Token::LBrace) => self.parse_object(),
            other => Err(ExprError::new(format!(
                "Expected an expression, found {other:?}"
            ))),
        }
    }

    fn parse_object(&mut self) -> Result<Expr, ExprError> {
        let mut entries = Vec::new();
        if self.eat(&Token::RBrace) {
            return Ok(Expr::Object(entries));
        }
        loop {
            let (key, is_ident) = match self.advance() {
                Some(Token::Ident(name)) => (name, true),
                Some(Token::Str(s)) => (s, false),
                Some(Token::Number(n)) => (format_number(n), false),
                other => {
                    return Err(ExprError::new(format!(
                        "Expected an object key, found {other:?}"
                    )));
                }
            };
            if self.eat(&Token::Colon) {
                let value = self.parse_or()?;
                entries.push((key, value));
            } else if is_ident {
                // shorthand entry: `{ name }`
                let value = Expr::Identifier(key.clone());
                entries.push((key, value));
            } else {
                return Err(ExprError::new("Expected ':' after object key"));
            }
            if self.eat(&Token::Comma) {
                continue;
            }
            self.expect(&Token::RBrace)?;
            break;
        }
        Ok(Expr::Object(entries))
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Expr {
        Expr::Literal(Literal::Number(n))
    }

    #[test]
    fn test_multiplication_binds_tighter_than_addition() {
        let expr = parse_expression("1 + 2 * 3").unwrap();
        assert_eq!(
            expr,
            binary(BinaryOp::Add, num(1.0), binary(BinaryOp::Mul, num(2.0), num(3.0)))
        );
    }

    #[test]
    fn test_comparison_binds_tighter_than_logical() {
        let expr = parse_expression("a > 1 && b < 2 || c").unwrap();
        match expr {
            Expr::Binary { op: BinaryOp::Or, .. } => {}
            other => panic!("expected || at the root, got {other:?}"),
        }
    }

    #[test]
    fn test_dotted_chain_stays_one_identifier() {
        let expr = parse_expression("user.address.city").unwrap();
        assert_eq!(expr, Expr::Identifier("user.address.city".to_string()));
    }

    #[test]
    fn test_computed_access_is_a_member_expression() {
        let expr = parse_expression("items[0]").unwrap();
        assert_eq!(
            expr,
            Expr::Member {
                object: Box::new(Expr::Identifier("items".to_string())),
                property: Property::Computed(Box::new(num(0.0))),
            }
        );
    }

    #[test]
    fn test_dot_access_on_composite_base() {
        let expr = parse_expression("[1, 2].length").unwrap();
        assert_eq!(
            expr,
            Expr::Member {
                object: Box::new(Expr::Array(vec![num(1.0), num(2.0)])),
                property: Property::Named("length".to_string()),
            }
        );
    }

    #[test]
    fn test_call_keeps_dotted_callee() {
        let expr = parse_expression("arr.join(\",\")").unwrap();
        assert_eq!(
            expr,
            Expr::Call {
                callee: Box::new(Expr::Identifier("arr.join".to_string())),
                args: vec![Expr::Literal(Literal::String(",".to_string()))],
            }
        );
    }

    #[test]
    fn test_object_literal_with_shorthand() {
        let expr = parse_expression("{ a: 1, \"b\": 2, c }").unwrap();
        assert_eq!(
            expr,
            Expr::Object(vec![
                ("a".to_string(), num(1.0)),
                ("b".to_string(), num(2.0)),
                ("c".to_string(), Expr::Identifier("c".to_string())),
            ])
        );
    }

    #[test]
    fn test_string_escapes() {
        let expr = parse_expression("'a\\n\\'b'").unwrap();
        assert_eq!(expr, Expr::Literal(Literal::String("a\n'b".to_string())));
    }

    #[test]
    fn test_unary_chain() {
        let expr = parse_expression("!!ok").unwrap();
        assert_eq!(
            expr,
            Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(Expr::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(Expr::Identifier("ok".to_string())),
                }),
            }
        );
    }

    #[test]
    fn test_rejects_stray_tokens() {
        assert!(parse_expression("1 +").is_err());
        assert!(parse_expression("a ==").is_err());
        assert!(parse_expression("(1").is_err());
        assert!(parse_expression("'open").is_err());
        assert!(parse_expression("(x) => x").is_err());
    }

    #[test]
    fn test_number_forms() {
        assert_eq!(parse_expression(".5").unwrap(), num(0.5));
        assert_eq!(parse_expression("1e2").unwrap(), num(100.0));
        assert_eq!(parse_expression("3.25").unwrap(), num(3.25));
    }
}
