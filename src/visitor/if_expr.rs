use crate::error::{At, VtlError, VtlResult};
use crate::expression::type_checking::{assert_boolean, assert_type, is_null};
use crate::expression::{DatasetExpression, Expr, TypedExpression};
use crate::model::Type;
use crate::syntax::Node;
use crate::visitor::ExpressionVisitor;

/// `if condition then a else b`.
///
/// Only the selected branch is resolved. A condition resolving to NULL
/// selects the else branch.
pub struct IfVisitor<'v, 'a> {
    visitor: &'v ExpressionVisitor<'a>,
}

impl<'v, 'a> IfVisitor<'v, 'a> {
    pub fn new(visitor: &'v ExpressionVisitor<'a>) -> Self {
        Self { visitor }
    }

    pub fn visit_if(
        &self,
        condition: &Node,
        then_branch: &Node,
        else_branch: &Node,
    ) -> VtlResult<TypedExpression> {
        let condition_expr = self.visitor.visit(condition)?;
        if is_null(&condition_expr) {
            return TypedExpression::typed_null(Type::Boolean);
        }
        let condition_expr = assert_boolean(condition_expr, condition)?;

        let mut then_expr = self.visitor.visit(then_branch)?;
        let mut else_expr = self.visitor.visit(else_branch)?;

        // Unify a NULL branch with the other one
        match (then_expr.static_type(), else_expr.static_type()) {
            (Some(t), None) => else_expr = assert_type(else_expr, t, else_branch)?,
            (None, Some(t)) => then_expr = assert_type(then_expr, t, then_branch)?,
            _ => {}
        }

        if let (TypedExpression::Dataset(then_ds), TypedExpression::Dataset(else_ds)) =
            (&then_expr, &else_expr)
        {
            return conditional_dataset(condition_expr, then_ds.clone(), else_ds.clone(), else_branch);
        }

        match (then_expr.static_type(), else_expr.static_type()) {
            (None, None) => Ok(TypedExpression::Null),
            (Some(then_type), Some(else_type)) if then_type != else_type => {
                Err(VtlError::BranchTypeMismatch {
                    then_type,
                    else_type,
                    context: format!("if {} then {} else {}", condition, then_branch, else_branch),
                    at: At(else_branch.position),
                })
            }
            (Some(data_type), _) | (_, Some(data_type)) => {
                TypedExpression::with_type_casting(data_type, move |target, context| {
                    let branch = if condition_expr.resolve(context)? == Some(true) {
                        &then_expr
                    } else {
                        &else_expr
                    };
                    branch.resolve(context)?.cast_to(target)
                })
            }
        }
    }
}

fn conditional_dataset(
    condition: Expr<bool>,
    then_ds: DatasetExpression,
    else_ds: DatasetExpression,
    else_branch: &Node,
) -> VtlResult<TypedExpression> {
    if !then_ds.structure().is_compatible_with(else_ds.structure()) {
        return Err(VtlError::structure_mismatch(format!(
            "branches of a conditional have different structures ({})",
            else_branch
        ))
        .at(else_branch.position));
    }
    let structure = then_ds.structure().clone();
    Ok(TypedExpression::Dataset(DatasetExpression::new(
        structure,
        move |context| {
            if condition.resolve(context)? == Some(true) {
                then_ds.resolve(context)
            } else {
                else_ds.resolve(context)
            }
        },
    )))
}
