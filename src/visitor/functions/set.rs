use crate::error::{VtlError, VtlResult};
use crate::expression::type_checking::assert_dataset;
use crate::expression::TypedExpression;
use crate::syntax::Node;
use crate::visitor::functions::check_arity;
use crate::visitor::ExpressionVisitor;
use log::debug;

/// Set operations over datasets.
pub struct SetFunctionsVisitor<'v, 'a> {
    visitor: &'v ExpressionVisitor<'a>,
}

impl<'v, 'a> SetFunctionsVisitor<'v, 'a> {
    pub fn new(visitor: &'v ExpressionVisitor<'a>) -> Self {
        Self { visitor }
    }

    pub fn visit(&self, name: &str, args: &[Node]) -> VtlResult<TypedExpression> {
        match name {
            "union" => self.visit_union(args),
            _ => Err(VtlError::unsupported(name, None)),
        }
    }

    fn visit_union(&self, args: &[Node]) -> VtlResult<TypedExpression> {
        check_arity("union", args, 1, usize::MAX)?;
        let mut datasets = Vec::with_capacity(args.len());
        for arg in args {
            datasets.push(assert_dataset(self.visitor.visit(arg)?, arg)?);
        }

        let first = datasets[0].structure().clone();
        for (dataset, arg) in datasets.iter().zip(args).skip(1) {
            if !dataset.structure().is_compatible_with(&first) {
                return Err(VtlError::structure_mismatch(format!(
                    "{} is not compatible with {}",
                    arg, args[0]
                ))
                .at(arg.position));
            }
        }
        debug!("union of {} datasets", datasets.len());
        Ok(TypedExpression::Dataset(
            self.visitor.engine().execute_union(datasets)?,
        ))
    }
}
