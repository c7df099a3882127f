use crate::error::VtlResult;
use crate::expression::type_checking::{assert_boolean, assert_number, NumericExpr};
use crate::expression::TypedExpression;
use crate::syntax::{Node, UnaryOperator};
use crate::visitor::ExpressionVisitor;

pub struct UnaryVisitor<'v, 'a> {
    visitor: &'v ExpressionVisitor<'a>,
}

impl<'v, 'a> UnaryVisitor<'v, 'a> {
    pub fn new(visitor: &'v ExpressionVisitor<'a>) -> Self {
        Self { visitor }
    }

    pub fn visit_unary(&self, op: UnaryOperator, operand: &Node) -> VtlResult<TypedExpression> {
        let expr = self.visitor.visit(operand)?;
        match op {
            UnaryOperator::Not => {
                let b = assert_boolean(expr, operand)?;
                Ok(TypedExpression::Boolean(b.map(|b| Some(!b))))
            }
            UnaryOperator::Plus => Ok(assert_number(expr, operand)?.into_typed()),
            UnaryOperator::Minus => Ok(match assert_number(expr, operand)? {
                NumericExpr::Integer(i) => TypedExpression::Integer(i.map(|i| i.checked_neg())),
                NumericExpr::Number(n) => TypedExpression::Number(n.map(|n| Some(-n))),
            }),
        }
    }
}
