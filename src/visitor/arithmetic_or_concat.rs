use crate::error::VtlResult;
use crate::expression::resolvable::zip_with;
use crate::expression::type_checking::{assert_number, assert_string, finite, NumericExpr};
use crate::expression::TypedExpression;
use crate::syntax::{AdditiveOperator, Node};
use crate::visitor::ExpressionVisitor;

/// Addition, subtraction and string concatenation.
pub struct ArithmeticOrConcatVisitor<'v, 'a> {
    visitor: &'v ExpressionVisitor<'a>,
}

impl<'v, 'a> ArithmeticOrConcatVisitor<'v, 'a> {
    pub fn new(visitor: &'v ExpressionVisitor<'a>) -> Self {
        Self { visitor }
    }

    pub fn visit_arithmetic_or_concat(
        &self,
        op: AdditiveOperator,
        left: &Node,
        right: &Node,
    ) -> VtlResult<TypedExpression> {
        let left_expr = self.visitor.visit(left)?;
        let right_expr = self.visitor.visit(right)?;

        if op == AdditiveOperator::Concat {
            let l = assert_string(left_expr, left)?;
            let r = assert_string(right_expr, right)?;
            return Ok(TypedExpression::String(zip_with(l, r, |a, b| {
                Some(a + &b)
            })));
        }

        let l = assert_number(left_expr, left)?;
        let r = assert_number(right_expr, right)?;
        let subtract = op == AdditiveOperator::Minus;
        Ok(match (l, r) {
            (NumericExpr::Integer(a), NumericExpr::Integer(b)) => {
                TypedExpression::Integer(zip_with(a, b, move |a, b| {
                    if subtract {
                        a.checked_sub(b)
                    } else {
                        a.checked_add(b)
                    }
                }))
            }
            (l, r) => TypedExpression::Number(zip_with(
                l.to_number(),
                r.to_number(),
                move |a, b| finite(if subtract { a - b } else { a + b }),
            )),
        })
    }
}
