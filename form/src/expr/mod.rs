//! `showIf` expressions: a restricted boolean and relational language.
//!
//! Expression source comes from a schema document that may be shared between
//! operators and is evaluated against live field values, so the language is
//! deliberately tiny: identifiers, string/number/boolean literals, the six
//! comparison operators, `&&`, `||`, `!`, unary `-`, and parentheses. There is
//! no assignment, no call syntax, and no member access. Sources are compiled
//! once into a [`CompiledExpr`] and evaluated many times.
//!
//! Identifiers missing from the evaluation context read as
//! [`Value::Undefined`]; see [`eval`] for the coercion table.

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parse;

use std::collections::HashMap;

pub use ast::{BinaryOp, Expr};
pub use lexer::is_identifier;

use crate::value::Value;
use lexer::Token;

/// Variable bindings for one evaluation: widget name to current value.
pub type Context = HashMap<String, Value>;

/// A malformed expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at position {position} (near `{token}`)")]
pub struct ParseError {
    pub message: String,
    /// Source text of the offending token.
    pub token: String,
    /// Byte offset of the offending token.
    pub position: usize,
}

impl ParseError {
    pub(crate) fn new(message: &str, token: &str, position: usize) -> Self {
        Self { message: message.to_owned(), token: token.to_owned(), position }
    }

    pub(crate) fn at(message: &str, token: &Token) -> Self {
        Self::new(message, &token.text, token.pos)
    }
}

/// A compiled `showIf` expression.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpr {
    source: String,
    ast: Expr,
    identifiers: Vec<String>,
}

impl CompiledExpr {
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn ast(&self) -> &Expr {
        &self.ast
    }

    /// Identifiers referenced by the expression, in first-appearance order.
    #[must_use]
    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    /// Evaluate against `ctx` and reduce to truthiness.
    #[must_use]
    pub fn evaluate(&self, ctx: &Context) -> bool {
        eval::evaluate(&self.ast, ctx).truthy()
    }
}

/// Compile expression source.
///
/// # Errors
///
/// Returns a [`ParseError`] for anything outside the grammar.
pub fn compile(source: &str) -> Result<CompiledExpr, ParseError> {
    let ast = parse::parse(source)?;
    let mut identifiers = Vec::new();
    ast.collect_identifiers(&mut identifiers);
    Ok(CompiledExpr { source: source.to_owned(), ast, identifiers })
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
