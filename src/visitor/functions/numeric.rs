//! Numeric functions.
//!
//! Results outside a function's domain (the log of a negative number, a
//! modulo by zero, a non-finite power) resolve to NULL.

use crate::error::{VtlError, VtlResult};
use crate::expression::resolvable::zip_with;
use crate::expression::type_checking::{assert_integer, assert_number, finite, NumericExpr};
use crate::expression::{Expr, TypedExpression};
use crate::syntax::Node;
use crate::visitor::functions::{check_arity, resolve_or};
use crate::visitor::ExpressionVisitor;

/// Reals to integers, NULL when out of range
fn to_integer(n: f64) -> Option<i64> {
    (n.is_finite() && n >= i64::MIN as f64 && n < i64::MAX as f64).then(|| n as i64)
}

fn round_to(n: f64, digits: i64, op: fn(f64) -> f64) -> Option<f64> {
    let digits = i32::try_from(digits).ok()?;
    let factor = 10f64.powi(digits);
    finite(op(n * factor) / factor)
}

pub struct NumericFunctionsVisitor<'v, 'a> {
    visitor: &'v ExpressionVisitor<'a>,
}

impl<'v, 'a> NumericFunctionsVisitor<'v, 'a> {
    pub fn new(visitor: &'v ExpressionVisitor<'a>) -> Self {
        Self { visitor }
    }

    fn number_arg(&self, node: &Node) -> VtlResult<NumericExpr> {
        assert_number(self.visitor.visit(node)?, node)
    }

    pub fn visit(&self, name: &str, args: &[Node]) -> VtlResult<TypedExpression> {
        match name {
            "ceil" | "floor" => {
                check_arity(name, args, 1, 1)?;
                let expr = match self.number_arg(&args[0])? {
                    NumericExpr::Integer(i) => i,
                    NumericExpr::Number(n) if name == "ceil" => n.map(|n| to_integer(n.ceil())),
                    NumericExpr::Number(n) => n.map(|n| to_integer(n.floor())),
                };
                Ok(TypedExpression::Integer(expr))
            }
            "abs" => {
                check_arity(name, args, 1, 1)?;
                Ok(match self.number_arg(&args[0])? {
                    NumericExpr::Integer(i) => TypedExpression::Integer(i.map(|i| i.checked_abs())),
                    NumericExpr::Number(n) => TypedExpression::Number(n.map(|n| Some(n.abs()))),
                })
            }
            "exp" | "ln" | "sqrt" => {
                check_arity(name, args, 1, 1)?;
                let n = self.number_arg(&args[0])?.to_number();
                let expr = match name {
                    "exp" => n.map(|n| finite(n.exp())),
                    "ln" => n.map(|n| if n > 0.0 { finite(n.ln()) } else { None }),
                    _ => n.map(|n| if n >= 0.0 { Some(n.sqrt()) } else { None }),
                };
                Ok(TypedExpression::Number(expr))
            }
            "round" | "trunc" => {
                check_arity(name, args, 1, 2)?;
                let n = self.number_arg(&args[0])?.to_number();
                let digits = args
                    .get(1)
                    .map(|node| assert_integer(self.visitor.visit(node)?, node))
                    .transpose()?;
                let op: fn(f64) -> f64 = if name == "round" { f64::round } else { f64::trunc };
                Ok(TypedExpression::Number(Expr::new(move |context| {
                    let (Some(n), Some(digits)) =
                        (n.resolve(context)?, resolve_or(&digits, 0, context)?)
                    else {
                        return Ok(None);
                    };
                    Ok(round_to(n, digits, op))
                })))
            }
            "mod" => {
                check_arity(name, args, 2, 2)?;
                let a = self.number_arg(&args[0])?;
                let b = self.number_arg(&args[1])?;
                Ok(match (a, b) {
                    (NumericExpr::Integer(a), NumericExpr::Integer(b)) => {
                        TypedExpression::Integer(zip_with(a, b, |a, b| a.checked_rem(b)))
                    }
                    (a, b) => TypedExpression::Number(zip_with(
                        a.to_number(),
                        b.to_number(),
                        |a, b| if b == 0.0 { None } else { Some(a % b) },
                    )),
                })
            }
            "power" => {
                check_arity(name, args, 2, 2)?;
                let base = self.number_arg(&args[0])?.to_number();
                let exponent = self.number_arg(&args[1])?.to_number();
                Ok(TypedExpression::Number(zip_with(base, exponent, |a, b| {
                    finite(a.powf(b))
                })))
            }
            "log" => {
                check_arity(name, args, 2, 2)?;
                let n = self.number_arg(&args[0])?.to_number();
                let base = self.number_arg(&args[1])?.to_number();
                Ok(TypedExpression::Number(zip_with(n, base, |n, base| {
                    if n <= 0.0 || base <= 0.0 || base == 1.0 {
                        None
                    } else {
                        finite(n.log(base))
                    }
                })))
            }
            _ => Err(VtlError::unsupported(name, None)),
        }
    }
}
