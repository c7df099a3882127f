//! Comparison functions: `between`, `match_characters` and `isnull`.

use crate::error::{VtlError, VtlResult};
use crate::expression::type_checking::{assert_string, comparable};
use crate::expression::{Expr, TypedExpression};
use crate::syntax::Node;
use crate::visitor::functions::{check_arity, PatternArg};
use crate::visitor::ExpressionVisitor;
use std::cmp::Ordering;

pub struct ComparisonFunctionsVisitor<'v, 'a> {
    visitor: &'v ExpressionVisitor<'a>,
}

impl<'v, 'a> ComparisonFunctionsVisitor<'v, 'a> {
    pub fn new(visitor: &'v ExpressionVisitor<'a>) -> Self {
        Self { visitor }
    }

    pub fn visit(&self, name: &str, args: &[Node]) -> VtlResult<TypedExpression> {
        match name {
            "between" => {
                check_arity(name, args, 3, 3)?;
                let operand = self.visitor.visit(&args[0])?;
                let from = self.visitor.visit(&args[1])?;
                let to = self.visitor.visit(&args[2])?;
                for (bound, node) in [(&from, &args[1]), (&to, &args[2])] {
                    if !comparable(operand.static_type(), bound.static_type()) {
                        return Err(VtlError::type_mismatch(
                            operand.type_name(),
                            bound.type_name(),
                            format!("between({}, {}, {})", args[0], args[1], args[2]),
                            node.position,
                        ));
                    }
                }
                Ok(TypedExpression::Boolean(Expr::new(move |context| {
                    let value = operand.resolve(context)?;
                    let low = value.compare(&from.resolve(context)?);
                    let high = value.compare(&to.resolve(context)?);
                    Ok(match (low, high) {
                        (Some(low), Some(high)) => {
                            Some(low != Ordering::Less && high != Ordering::Greater)
                        }
                        _ => None,
                    })
                })))
            }
            "match_characters" => {
                check_arity(name, args, 2, 2)?;
                let s = assert_string(self.visitor.visit(&args[0])?, &args[0])?;
                let pattern = assert_string(self.visitor.visit(&args[1])?, &args[1])?;
                let pattern = PatternArg::new(&args[1], pattern, true);
                Ok(TypedExpression::Boolean(Expr::new(move |context| {
                    let (Some(s), Some(regex)) = (s.resolve(context)?, pattern.resolve(context)?)
                    else {
                        return Ok(None);
                    };
                    Ok(Some(regex.is_match(&s)))
                })))
            }
            "isnull" => {
                check_arity(name, args, 1, 1)?;
                let operand = self.visitor.visit(&args[0])?;
                if operand.static_type() == Some(crate::model::Type::Dataset) {
                    return Err(VtlError::type_mismatch(
                        "a scalar type",
                        operand.type_name(),
                        format!("isnull({})", args[0]),
                        args[0].position,
                    ));
                }
                Ok(TypedExpression::Boolean(Expr::new(move |context| {
                    Ok(Some(operand.resolve(context)?.is_null()))
                })))
            }
            _ => Err(VtlError::unsupported(name, None)),
        }
    }
}
