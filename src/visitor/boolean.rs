use crate::error::VtlResult;
use crate::expression::type_checking::assert_boolean;
use crate::expression::{Expr, TypedExpression};
use crate::syntax::{BooleanOperator, Node};
use crate::visitor::ExpressionVisitor;

/// AND, OR and XOR with three-valued logic.
pub struct BooleanVisitor<'v, 'a> {
    visitor: &'v ExpressionVisitor<'a>,
}

impl<'v, 'a> BooleanVisitor<'v, 'a> {
    pub fn new(visitor: &'v ExpressionVisitor<'a>) -> Self {
        Self { visitor }
    }

    pub fn visit_boolean(
        &self,
        op: BooleanOperator,
        left: &Node,
        right: &Node,
    ) -> VtlResult<TypedExpression> {
        let l = assert_boolean(self.visitor.visit(left)?, left)?;
        let r = assert_boolean(self.visitor.visit(right)?, right)?;

        let expr = match op {
            // NULL AND false = false, NULL AND true = NULL
            BooleanOperator::And => Expr::new(move |context| {
                let lv = l.resolve(context)?;
                if lv == Some(false) {
                    return Ok(Some(false));
                }
                Ok(match (lv, r.resolve(context)?) {
                    (_, Some(false)) => Some(false),
                    (Some(true), Some(true)) => Some(true),
                    _ => None,
                })
            }),
            // NULL OR true = true, NULL OR false = NULL
            BooleanOperator::Or => Expr::new(move |context| {
                let lv = l.resolve(context)?;
                if lv == Some(true) {
                    return Ok(Some(true));
                }
                Ok(match (lv, r.resolve(context)?) {
                    (_, Some(true)) => Some(true),
                    (Some(false), Some(false)) => Some(false),
                    _ => None,
                })
            }),
            BooleanOperator::Xor => {
                crate::expression::resolvable::zip_with(l, r, |a, b| Some(a ^ b))
            }
        };
        Ok(TypedExpression::Boolean(expr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::InMemoryProcessingEngine;
    use crate::error::VtlError;
    use crate::model::{Bindings, Value};

    fn eval(node: Node) -> VtlResult<Value> {
        let bindings = Bindings::new();
        let engine = InMemoryProcessingEngine::new();
        ExpressionVisitor::new(&bindings, &engine)
            .visit(&node)?
            .resolve(&bindings)
    }

    fn literal(value: Option<bool>) -> Node {
        match value {
            Some(b) => Node::boolean(b),
            None => Node::null(),
        }
    }

    #[test]
    fn test_truth_tables() -> VtlResult<()> {
        let values = [Some(true), Some(false), None];
        for a in values {
            for b in values {
                let and = match (a, b) {
                    (Some(false), _) | (_, Some(false)) => Some(false),
                    (Some(true), Some(true)) => Some(true),
                    _ => None,
                };
                let or = match (a, b) {
                    (Some(true), _) | (_, Some(true)) => Some(true),
                    (Some(false), Some(false)) => Some(false),
                    _ => None,
                };
                let xor = match (a, b) {
                    (Some(x), Some(y)) => Some(x ^ y),
                    _ => None,
                };
                assert_eq!(eval(Node::and(literal(a), literal(b)))?, Value::from(and));
                assert_eq!(eval(Node::or(literal(a), literal(b)))?, Value::from(or));
                assert_eq!(eval(Node::xor(literal(a), literal(b)))?, Value::from(xor));
            }
        }
        Ok(())
    }

    #[test]
    fn test_operands_must_be_boolean() {
        let err = eval(Node::and(Node::boolean(true), Node::integer(1).at(1, 10))).unwrap_err();
        assert!(matches!(err, VtlError::TypeMismatch { .. }));
        assert_eq!(err.position(), Some(crate::syntax::Position::new(1, 10)));
    }
}
