//! Tree-walking evaluator.
//!
//! Coercion rules for mixed-type comparisons:
//!
//! | Left / right | `==` | `<` `<=` `>` `>=` |
//! |--------------|------|-------------------|
//! | undefined / any | equal only to undefined | false |
//! | same type | direct (NaN never equal) | numeric, or lexicographic for two texts |
//! | bool / text | text parsed as a flag word | numeric |
//! | number / text | text parsed as a number | numeric |
//! | bool / number | bool as 1 or 0 | numeric |
//!
//! "Numeric" converts both sides to numbers (bool 1/0, text parsed,
//! undefined NaN) and any NaN makes the comparison false.

use super::Context;
use super::ast::{BinaryOp, Expr};
use crate::value::{Value, parse_flag, parse_number};

/// Evaluate an expression. Never mutates `ctx`.
pub fn evaluate(expr: &Expr, ctx: &Context) -> Value {
    match expr {
        Expr::Literal(value) => value.clone(),
        Expr::Ident(name) => ctx.get(name).cloned().unwrap_or_default(),
        Expr::Not(inner) => Value::Bool(!evaluate(inner, ctx).truthy()),
        Expr::Neg(inner) => Value::Number(-to_number(&evaluate(inner, ctx))),
        Expr::Binary { op: BinaryOp::And, lhs, rhs } => {
            Value::Bool(evaluate(lhs, ctx).truthy() && evaluate(rhs, ctx).truthy())
        }
        Expr::Binary { op: BinaryOp::Or, lhs, rhs } => {
            Value::Bool(evaluate(lhs, ctx).truthy() || evaluate(rhs, ctx).truthy())
        }
        Expr::Binary { op, lhs, rhs } => {
            let lhs = evaluate(lhs, ctx);
            let rhs = evaluate(rhs, ctx);
            Value::Bool(compare(*op, &lhs, &rhs))
        }
    }
}

fn compare(op: BinaryOp, lhs: &Value, rhs: &Value) -> bool {
    match op {
        BinaryOp::Eq => loose_eq(lhs, rhs),
        BinaryOp::Ne => !loose_eq(lhs, rhs),
        _ => relational(op, lhs, rhs),
    }
}

#[allow(clippy::float_cmp)]
pub(crate) fn loose_eq(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Undefined, Value::Undefined) => true,
        (Value::Undefined, _) | (_, Value::Undefined) => false,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::Text(a), Value::Text(b)) => a == b,
        (Value::Bool(flag), Value::Text(text)) | (Value::Text(text), Value::Bool(flag)) => {
            parse_flag(text) == Some(*flag)
        }
        (Value::Number(number), Value::Text(text)) | (Value::Text(text), Value::Number(number)) => {
            parse_number(text).is_some_and(|parsed| parsed == *number)
        }
        (Value::Bool(flag), Value::Number(number)) | (Value::Number(number), Value::Bool(flag)) => {
            (if *flag { 1.0 } else { 0.0 }) == *number
        }
    }
}

fn relational(op: BinaryOp, lhs: &Value, rhs: &Value) -> bool {
    if let (Value::Text(a), Value::Text(b)) = (lhs, rhs) {
        return match op {
            BinaryOp::Lt => a < b,
            BinaryOp::Le => a <= b,
            BinaryOp::Gt => a > b,
            BinaryOp::Ge => a >= b,
            _ => false,
        };
    }
    let a = to_number(lhs);
    let b = to_number(rhs);
    if a.is_nan() || b.is_nan() {
        return false;
    }
    match op {
        BinaryOp::Lt => a < b,
        BinaryOp::Le => a <= b,
        BinaryOp::Gt => a > b,
        BinaryOp::Ge => a >= b,
        _ => false,
    }
}

fn to_number(value: &Value) -> f64 {
    value.as_number().unwrap_or(f64::NAN)
}
