use crate::error::{VtlError, VtlResult};
use crate::expression::type_checking::comparable;
use crate::expression::{Expr, TypedExpression};
use crate::model::Value;
use crate::syntax::{ComparisonOperator, Literal, Node};
use crate::visitor::constant::literal_value;
use crate::visitor::ExpressionVisitor;
use std::cmp::Ordering;

/// Comparison operators and IN / NOT IN lists.
pub struct ComparisonVisitor<'v, 'a> {
    visitor: &'v ExpressionVisitor<'a>,
}

impl<'v, 'a> ComparisonVisitor<'v, 'a> {
    pub fn new(visitor: &'v ExpressionVisitor<'a>) -> Self {
        Self { visitor }
    }

    pub fn visit_comparison(
        &self,
        op: ComparisonOperator,
        left: &Node,
        right: &Node,
    ) -> VtlResult<TypedExpression> {
        let l = self.visitor.visit(left)?;
        let r = self.visitor.visit(right)?;
        if !comparable(l.static_type(), r.static_type()) {
            return Err(VtlError::type_mismatch(
                l.type_name(),
                r.type_name(),
                format!("{} {} {}", left, op, right),
                right.position,
            ));
        }

        Ok(TypedExpression::Boolean(Expr::new(move |context| {
            let lv = l.resolve(context)?;
            let rv = r.resolve(context)?;
            Ok(lv.compare(&rv).map(|ordering| match op {
                ComparisonOperator::Eq => ordering == Ordering::Equal,
                ComparisonOperator::Ne => ordering != Ordering::Equal,
                ComparisonOperator::Lt => ordering == Ordering::Less,
                ComparisonOperator::Le => ordering != Ordering::Greater,
                ComparisonOperator::Gt => ordering == Ordering::Greater,
                ComparisonOperator::Ge => ordering != Ordering::Less,
            }))
        })))
    }

    pub fn visit_in_not_in(
        &self,
        negated: bool,
        operand: &Node,
        list: &[Literal],
    ) -> VtlResult<TypedExpression> {
        let expr = self.visitor.visit(operand)?;
        let values: Vec<Value> = list.iter().map(literal_value).collect();
        for value in &values {
            if !comparable(expr.static_type(), value.data_type()) {
                return Err(VtlError::type_mismatch(
                    expr.type_name(),
                    value.type_name(),
                    format!("{} in list", operand),
                    operand.position,
                ));
            }
        }

        Ok(TypedExpression::Boolean(Expr::new(move |context| {
            let value = expr.resolve(context)?;
            if value.is_null() {
                return Ok(None);
            }
            let found = values
                .iter()
                .any(|candidate| value.compare(candidate) == Some(Ordering::Equal));
            Ok(Some(found != negated))
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::InMemoryProcessingEngine;
    use crate::model::Bindings;

    fn build(node: Node) -> VtlResult<TypedExpression> {
        let bindings = Bindings::new();
        let engine = InMemoryProcessingEngine::new();
        ExpressionVisitor::new(&bindings, &engine).visit(&node)
    }

    fn eval(node: Node) -> VtlResult<Value> {
        build(node)?.resolve(&Bindings::new())
    }

    #[test]
    fn test_comparisons() -> VtlResult<()> {
        use ComparisonOperator::*;
        let cases = vec![
            (Eq, Node::integer(1), Node::number(1.0), Value::Boolean(true)),
            (Ne, Node::string("a"), Node::string("b"), Value::Boolean(true)),
            (Lt, Node::integer(1), Node::integer(2), Value::Boolean(true)),
            (Le, Node::integer(2), Node::integer(2), Value::Boolean(true)),
            (Gt, Node::number(1.5), Node::integer(2), Value::Boolean(false)),
            (Ge, Node::string("b"), Node::string("a"), Value::Boolean(true)),
            (Eq, Node::null(), Node::integer(1), Value::Null),
            (Lt, Node::integer(1), Node::null(), Value::Null),
        ];
        for (op, left, right, expected) in cases {
            assert_eq!(eval(Node::compare(op, left, right))?, expected);
        }
        Ok(())
    }

    #[test]
    fn test_incomparable_types() {
        let err = build(Node::compare(
            ComparisonOperator::Eq,
            Node::string("a"),
            Node::integer(1).at(1, 7),
        ))
        .unwrap_err();
        assert!(matches!(err, VtlError::TypeMismatch { .. }));
        assert_eq!(err.position(), Some(crate::syntax::Position::new(1, 7)));
    }

    #[test]
    fn test_in_not_in() -> VtlResult<()> {
        let list = vec![Literal::Integer(1), Literal::Integer(2)];
        assert_eq!(
            eval(Node::in_list(Node::integer(2), list.clone(), false))?,
            Value::Boolean(true)
        );
        assert_eq!(
            eval(Node::in_list(Node::integer(3), list.clone(), true))?,
            Value::Boolean(true)
        );
        assert_eq!(
            eval(Node::in_list(Node::null(), list.clone(), false))?,
            Value::Null
        );
        assert!(matches!(
            build(Node::in_list(Node::string("a"), list, false)),
            Err(VtlError::TypeMismatch { .. })
        ));
        Ok(())
    }
}
