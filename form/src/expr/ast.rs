//! AST types for `showIf` expressions.

use crate::value::Value;

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// String, number, or boolean literal.
    Literal(Value),
    /// Bare identifier resolved against the evaluation context.
    Ident(String),
    /// Logical negation `!x`.
    Not(Box<Expr>),
    /// Numeric negation `-x`.
    Neg(Box<Expr>),
    /// Binary comparison or logical operator.
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

/// Binary operators, comparison and logical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `==` (also written `===`)
    Eq,
    /// `!=` (also written `!==`)
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `&&`
    And,
    /// `||`
    Or,
}

impl Expr {
    pub(crate) fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Self::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) }
    }

    /// Collect identifiers in first-appearance order, without duplicates.
    pub fn collect_identifiers(&self, out: &mut Vec<String>) {
        match self {
            Self::Literal(_) => {}
            Self::Ident(name) => {
                if !out.iter().any(|seen| seen == name) {
                    out.push(name.clone());
                }
            }
            Self::Not(inner) | Self::Neg(inner) => inner.collect_identifiers(out),
            Self::Binary { lhs, rhs, .. } => {
                lhs.collect_identifiers(out);
                rhs.collect_identifiers(out);
            }
        }
    }
}
