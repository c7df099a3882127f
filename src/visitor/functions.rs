//! Built-in function visitors.
//!
//! Function nodes carry their family; each family has its own visitor
//! dispatching on the function name to a builder that checks arity and
//! argument types. Unknown names fail with `UnsupportedOperator`.

pub mod comparison;
pub mod distance;
pub mod join;
pub mod numeric;
pub mod set;
pub mod string;

pub use comparison::ComparisonFunctionsVisitor;
pub use distance::DistanceFunctionsVisitor;
pub use join::JoinFunctionsVisitor;
pub use numeric::NumericFunctionsVisitor;
pub use set::SetFunctionsVisitor;
pub use string::StringFunctionsVisitor;

use crate::error::{At, VtlError, VtlResult};
use crate::expression::{Expr, Scalar, TypedExpression};
use crate::model::Context;
use crate::syntax::{FunctionCategory, Literal, Node, NodeKind};
use crate::visitor::ExpressionVisitor;
use regex::Regex;

/// Fail with `ArgumentCount` unless `min <= args.len() <= max`.
pub(crate) fn check_arity(name: &str, args: &[Node], min: usize, max: usize) -> VtlResult<()> {
    if (min..=max).contains(&args.len()) {
        return Ok(());
    }
    let expected = if min == max {
        min.to_string()
    } else if max == usize::MAX {
        format!("at least {}", min)
    } else {
        format!("{} to {}", min, max)
    };
    Err(VtlError::ArgumentCount {
        function: name.to_string(),
        expected,
        actual: args.len(),
        at: At(None),
    })
}

/// Resolve an optional argument, substituting `default` when it was omitted.
pub(crate) fn resolve_or<T: Scalar>(
    expr: &Option<Expr<T>>,
    default: T,
    context: &dyn Context,
) -> VtlResult<Option<T>> {
    match expr {
        Some(expr) => expr.resolve(context),
        None => Ok(Some(default)),
    }
}

fn compile_pattern(pattern: &str, whole: bool) -> VtlResult<Regex> {
    let source = if whole {
        format!("^(?:{})$", pattern)
    } else {
        pattern.to_string()
    };
    Regex::new(&source)
        .map_err(|err| VtlError::resolution(format!("invalid pattern '{}': {}", pattern, err)))
}

/// Regular expression argument.
///
/// A string literal is compiled once, when the call is built; any other
/// pattern is compiled each time it resolves. Invalid patterns fail with
/// `ResolutionFailure` on resolution either way. With `whole` set the pattern
/// must match the entire input.
#[derive(Debug, Clone)]
pub(crate) struct PatternArg {
    expr: Expr<String>,
    literal: Option<VtlResult<Regex>>,
    whole: bool,
}

impl PatternArg {
    pub(crate) fn new(node: &Node, expr: Expr<String>, whole: bool) -> Self {
        let literal = match &node.kind {
            NodeKind::Constant(Literal::String(pattern)) => Some(compile_pattern(pattern, whole)),
            _ => None,
        };
        Self {
            expr,
            literal,
            whole,
        }
    }

    pub(crate) fn resolve(&self, context: &dyn Context) -> VtlResult<Option<Regex>> {
        if let Some(compiled) = &self.literal {
            return compiled.clone().map(Some);
        }
        self.expr
            .resolve(context)?
            .map(|pattern| compile_pattern(&pattern, self.whole))
            .transpose()
    }
}

pub struct FunctionsVisitor<'v, 'a> {
    visitor: &'v ExpressionVisitor<'a>,
}

impl<'v, 'a> FunctionsVisitor<'v, 'a> {
    pub fn new(visitor: &'v ExpressionVisitor<'a>) -> Self {
        Self { visitor }
    }

    pub fn visit_function(
        &self,
        category: FunctionCategory,
        name: &str,
        args: &[Node],
    ) -> VtlResult<TypedExpression> {
        match category {
            FunctionCategory::String => StringFunctionsVisitor::new(self.visitor).visit(name, args),
            FunctionCategory::Numeric => {
                NumericFunctionsVisitor::new(self.visitor).visit(name, args)
            }
            FunctionCategory::Comparison => {
                ComparisonFunctionsVisitor::new(self.visitor).visit(name, args)
            }
            FunctionCategory::Distance => {
                DistanceFunctionsVisitor::new(self.visitor).visit(name, args)
            }
            FunctionCategory::Set => SetFunctionsVisitor::new(self.visitor).visit(name, args),
        }
    }
}
