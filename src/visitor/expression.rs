//! Top-level expression dispatcher.

use crate::engine::ProcessingEngine;
use crate::error::VtlResult;
use crate::expression::TypedExpression;
use crate::model::Scope;
use crate::syntax::{Node, NodeKind};
use crate::visitor::arithmetic::ArithmeticVisitor;
use crate::visitor::arithmetic_or_concat::ArithmeticOrConcatVisitor;
use crate::visitor::boolean::BooleanVisitor;
use crate::visitor::clause::ClauseVisitor;
use crate::visitor::comparison::ComparisonVisitor;
use crate::visitor::constant::ConstantVisitor;
use crate::visitor::functions::{FunctionsVisitor, JoinFunctionsVisitor};
use crate::visitor::if_expr::IfVisitor;
use crate::visitor::unary::UnaryVisitor;
use crate::visitor::var_id::VarIdVisitor;

/// Builds typed expressions from syntax nodes.
///
/// Names are looked up in `scope` at construction; the resulting expressions
/// read their values from whatever context they are resolved against.
#[derive(Clone, Copy)]
pub struct ExpressionVisitor<'a> {
    scope: &'a dyn Scope,
    engine: &'a dyn ProcessingEngine,
}

impl<'a> ExpressionVisitor<'a> {
    pub fn new(scope: &'a dyn Scope, engine: &'a dyn ProcessingEngine) -> Self {
        Self { scope, engine }
    }

    pub fn scope(&self) -> &'a dyn Scope {
        self.scope
    }

    pub fn engine(&self) -> &'a dyn ProcessingEngine {
        self.engine
    }

    /// A dispatcher sharing this one's engine but looking names up in `scope`.
    pub fn with_scope<'b>(&self, scope: &'b dyn Scope) -> ExpressionVisitor<'b>
    where
        'a: 'b,
    {
        ExpressionVisitor {
            scope,
            engine: self.engine,
        }
    }

    /// Visit `node`, attaching its position to errors raised while building
    /// or resolving the result.
    pub fn visit(&self, node: &Node) -> VtlResult<TypedExpression> {
        let expression = match &node.kind {
            NodeKind::Constant(literal) => Ok(ConstantVisitor.visit_constant(literal)),
            NodeKind::VarId(name) => VarIdVisitor::new(self.scope).visit_var_id(name),
            NodeKind::Boolean { op, left, right } => {
                BooleanVisitor::new(self).visit_boolean(*op, left, right)
            }
            NodeKind::Arithmetic { op, left, right } => {
                ArithmeticVisitor::new(self).visit_arithmetic(*op, left, right)
            }
            NodeKind::ArithmeticOrConcat { op, left, right } => {
                ArithmeticOrConcatVisitor::new(self).visit_arithmetic_or_concat(*op, left, right)
            }
            NodeKind::Unary { op, operand } => UnaryVisitor::new(self).visit_unary(*op, operand),
            NodeKind::Parenthesis(inner) => self.visit(inner),
            NodeKind::Comparison { op, left, right } => {
                ComparisonVisitor::new(self).visit_comparison(*op, left, right)
            }
            NodeKind::InNotIn {
                negated,
                operand,
                list,
            } => ComparisonVisitor::new(self).visit_in_not_in(*negated, operand, list),
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            } => IfVisitor::new(self).visit_if(condition, then_branch, else_branch),
            NodeKind::Function {
                category,
                name,
                args,
            } => FunctionsVisitor::new(self).visit_function(*category, name, args),
            NodeKind::Join {
                kind,
                operands,
                using,
            } => JoinFunctionsVisitor::new(self).visit_join(*kind, operands, using),
            NodeKind::Clause { dataset, clause } => {
                ClauseVisitor::new(self).visit_clause(dataset, clause)
            }
        };
        Ok(expression
            .map_err(|err| err.at(node.position))?
            .located(node.position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::InMemoryProcessingEngine;
    use crate::error::VtlError;
    use crate::model::{Bindings, Value};
    use crate::syntax::FunctionCategory;

    #[test]
    fn test_visit_parenthesis_and_constants() -> VtlResult<()> {
        let bindings = Bindings::new();
        let engine = InMemoryProcessingEngine::new();
        let visitor = ExpressionVisitor::new(&bindings, &engine);

        let expr = visitor.visit(&Node::parenthesis(Node::integer(7)))?;
        assert_eq!(expr.resolve(&bindings)?, Value::Integer(7));

        let expr = visitor.visit(&Node::null())?;
        assert!(expr.static_type().is_none());
        Ok(())
    }

    #[test]
    fn test_errors_carry_position() {
        let bindings = Bindings::new();
        let engine = InMemoryProcessingEngine::new();
        let visitor = ExpressionVisitor::new(&bindings, &engine);

        let node = Node::function(FunctionCategory::String, "frobnicate", vec![]).at(3, 9);
        let err = visitor.visit(&node).unwrap_err();
        assert!(matches!(err, VtlError::UnsupportedOperator { .. }));
        assert_eq!(err.position(), Some(crate::syntax::Position::new(3, 9)));
    }
}
