//! Type checking and coercion helpers shared by the visitors.
//!
//! The `assert_*` helpers take an expression built from `node` and return its
//! typed payload, unifying the NULL literal to the requested type. Failures
//! report the node's text and position.

use crate::error::{VtlError, VtlResult};
use crate::expression::{DatasetExpression, Expr, TypedExpression};
use crate::model::Type;
use crate::syntax::Node;

/// Operand of an arithmetic operator
#[derive(Debug, Clone)]
pub enum NumericExpr {
    Integer(Expr<i64>),
    Number(Expr<f64>),
}

impl NumericExpr {
    /// Value-level widening of integer results to reals.
    pub fn to_number(self) -> Expr<f64> {
        match self {
            NumericExpr::Integer(expr) => expr.map(|i| Some(i as f64)),
            NumericExpr::Number(expr) => expr,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, NumericExpr::Integer(_))
    }

    pub fn into_typed(self) -> TypedExpression {
        match self {
            NumericExpr::Integer(expr) => TypedExpression::Integer(expr),
            NumericExpr::Number(expr) => TypedExpression::Number(expr),
        }
    }
}

/// `Some(n)` for finite reals; infinities and NaN become NULL.
pub fn finite(n: f64) -> Option<f64> {
    n.is_finite().then_some(n)
}

pub fn is_null(expr: &TypedExpression) -> bool {
    matches!(expr, TypedExpression::Null)
}

pub fn is_number(expr: &TypedExpression) -> bool {
    expr.static_type().map(|t| t.is_numeric()).unwrap_or(false)
}

pub fn is_integer(expr: &TypedExpression) -> bool {
    matches!(expr, TypedExpression::Integer(_))
}

fn mismatch(expected: impl std::fmt::Display, expr: &TypedExpression, node: &Node) -> VtlError {
    VtlError::type_mismatch(expected, expr.type_name(), node.to_string(), node.position)
}

/// Check that `expr` has type `expected` (NULL literal is unified to it).
pub fn assert_type(
    expr: TypedExpression,
    expected: Type,
    node: &Node,
) -> VtlResult<TypedExpression> {
    match expr.static_type() {
        None if expected != Type::Dataset => TypedExpression::typed_null(expected),
        Some(actual) if actual == expected => Ok(expr),
        _ => Err(mismatch(expected, &expr, node)),
    }
}

/// Check that `expr` is numeric. The NULL literal becomes an Integer NULL.
pub fn assert_number(expr: TypedExpression, node: &Node) -> VtlResult<NumericExpr> {
    match expr {
        TypedExpression::Null => Ok(NumericExpr::Integer(Expr::null())),
        TypedExpression::Integer(e) => Ok(NumericExpr::Integer(e)),
        TypedExpression::Number(e) => Ok(NumericExpr::Number(e)),
        other => Err(mismatch("a numeric type", &other, node)),
    }
}

pub fn assert_integer(expr: TypedExpression, node: &Node) -> VtlResult<Expr<i64>> {
    match expr {
        TypedExpression::Null => Ok(Expr::null()),
        TypedExpression::Integer(e) => Ok(e),
        other => Err(mismatch(Type::Integer, &other, node)),
    }
}

pub fn assert_boolean(expr: TypedExpression, node: &Node) -> VtlResult<Expr<bool>> {
    match expr {
        TypedExpression::Null => Ok(Expr::null()),
        TypedExpression::Boolean(e) => Ok(e),
        other => Err(mismatch(Type::Boolean, &other, node)),
    }
}

pub fn assert_string(expr: TypedExpression, node: &Node) -> VtlResult<Expr<String>> {
    match expr {
        TypedExpression::Null => Ok(Expr::null()),
        TypedExpression::String(e) => Ok(e),
        other => Err(mismatch(Type::String, &other, node)),
    }
}

pub fn assert_dataset(expr: TypedExpression, node: &Node) -> VtlResult<DatasetExpression> {
    match expr {
        TypedExpression::Dataset(e) => Ok(e),
        other => Err(mismatch(Type::Dataset, &other, node)),
    }
}

/// Whether values of the two static types may be compared.
///
/// Identical types, a numeric pair, or a NULL literal on either side.
pub fn comparable(left: Option<Type>, right: Option<Type>) -> bool {
    match (left, right) {
        (None, _) | (_, None) => true,
        (Some(Type::Dataset), _) | (_, Some(Type::Dataset)) => false,
        (Some(l), Some(r)) => l == r || (l.is_numeric() && r.is_numeric()),
    }
}
