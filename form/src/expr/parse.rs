//! Recursive descent parser for `showIf` expressions.
//!
//! Precedence, lowest first: `||`, `&&`, equality, relational, unary.

use super::ParseError;
use super::ast::{BinaryOp, Expr};
use super::lexer::{Token, TokenKind, tokenize};
use crate::value::Value;

/// Unary and parenthesis nesting allowed before the parser gives up.
pub const MAX_DEPTH: usize = 64;

/// Parse expression source into an AST.
///
/// # Errors
///
/// Returns a [`ParseError`] naming the offending token and its byte offset.
pub fn parse(source: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0, depth: 0, eof: Token::eof(source.len()) };
    let expr = parser.parse_or()?;
    let tail = parser.peek();
    if tail.kind != TokenKind::Eof {
        return Err(ParseError::at("expected end of expression", tail));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    eof: Token,
}

impl Parser {
    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_and()?;
        while self.peek().kind == TokenKind::OrOr {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = Expr::binary(BinaryOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_equality()?;
        while self.peek().kind == TokenKind::AndAnd {
            self.advance();
            let rhs = self.parse_equality()?;
            lhs = Expr::binary(BinaryOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_relational()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::Ne,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_relational()?;
            lhs = Expr::binary(op, lhs, rhs);
        }
    }

    fn parse_relational(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::Le => BinaryOp::Le,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::Ge => BinaryOp::Ge,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expr::binary(op, lhs, rhs);
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        self.depth += 1;
        let result = if self.depth > MAX_DEPTH {
            Err(ParseError::at("expression nested too deeply", self.peek()))
        } else {
            self.parse_unary_inner()
        };
        self.depth -= 1;
        result
    }

    fn parse_unary_inner(&mut self) -> Result<Expr, ParseError> {
        match self.peek().kind {
            TokenKind::Bang => {
                self.advance();
                Ok(Expr::Not(Box::new(self.parse_unary()?)))
            }
            TokenKind::Minus => {
                self.advance();
                Ok(Expr::Neg(Box::new(self.parse_unary()?)))
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.advance();
        match &token.kind {
            TokenKind::Number(number) => Ok(Expr::Literal(Value::Number(*number))),
            TokenKind::Str(text) => Ok(Expr::Literal(Value::Text(text.clone()))),
            TokenKind::True => Ok(Expr::Literal(Value::Bool(true))),
            TokenKind::False => Ok(Expr::Literal(Value::Bool(false))),
            TokenKind::Ident(name) => Ok(Expr::Ident(name.clone())),
            TokenKind::LParen => {
                let inner = self.parse_or()?;
                let close = self.advance();
                if close.kind != TokenKind::RParen {
                    return Err(ParseError::at("expected `)`", &close));
                }
                Ok(inner)
            }
            TokenKind::Eof => Err(ParseError::at("unexpected end of expression", &token)),
            _ => Err(ParseError::at("unexpected token", &token)),
        }
    }
}
