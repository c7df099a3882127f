use crate::error::VtlResult;
use crate::expression::resolvable::zip_with;
use crate::expression::type_checking::{assert_number, finite, NumericExpr};
use crate::expression::TypedExpression;
use crate::syntax::{ArithmeticOperator, Node};
use crate::visitor::ExpressionVisitor;

/// Multiplication and division.
pub struct ArithmeticVisitor<'v, 'a> {
    visitor: &'v ExpressionVisitor<'a>,
}

impl<'v, 'a> ArithmeticVisitor<'v, 'a> {
    pub fn new(visitor: &'v ExpressionVisitor<'a>) -> Self {
        Self { visitor }
    }

    pub fn visit_arithmetic(
        &self,
        op: ArithmeticOperator,
        left: &Node,
        right: &Node,
    ) -> VtlResult<TypedExpression> {
        let l = assert_number(self.visitor.visit(left)?, left)?;
        let r = assert_number(self.visitor.visit(right)?, right)?;
        Ok(match op {
            ArithmeticOperator::Mul => multiply(l, r),
            ArithmeticOperator::Div => divide(l, r),
        })
    }
}

/// Integer when both sides are, Number otherwise. Overflow and non-finite
/// results resolve to NULL.
fn multiply(l: NumericExpr, r: NumericExpr) -> TypedExpression {
    match (l, r) {
        (NumericExpr::Integer(a), NumericExpr::Integer(b)) => {
            TypedExpression::Integer(zip_with(a, b, |a, b| a.checked_mul(b)))
        }
        (l, r) => TypedExpression::Number(zip_with(l.to_number(), r.to_number(), |a, b| {
            finite(a * b)
        })),
    }
}

/// Always Number. Division by zero resolves to NULL.
fn divide(l: NumericExpr, r: NumericExpr) -> TypedExpression {
    TypedExpression::Number(zip_with(l.to_number(), r.to_number(), |a, b| {
        if b == 0.0 {
            None
        } else {
            finite(a / b)
        }
    }))
}
