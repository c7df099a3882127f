//! String functions.
//!
//! Positions are 1-based and count characters, not bytes.

use crate::error::{VtlError, VtlResult};
use crate::expression::type_checking::{assert_integer, assert_string};
use crate::expression::{Expr, TypedExpression};
use crate::syntax::Node;
use crate::visitor::functions::{check_arity, resolve_or, PatternArg};
use crate::visitor::ExpressionVisitor;

fn substr(s: &str, start: i64, length: i64) -> VtlResult<String> {
    if length < 0 {
        return Err(VtlError::resolution(format!(
            "substr length must not be negative, got {}",
            length
        )));
    }
    let skip = usize::try_from(start.max(1) - 1).unwrap_or(usize::MAX);
    let take = usize::try_from(length).unwrap_or(usize::MAX);
    Ok(s.chars().skip(skip).take(take).collect())
}

fn instr(s: &str, pattern: &str, start: i64, occurrence: i64) -> VtlResult<i64> {
    if occurrence < 1 {
        return Err(VtlError::resolution(format!(
            "instr occurrence must be positive, got {}",
            occurrence
        )));
    }
    if pattern.is_empty() {
        return Ok(0);
    }
    let skip = usize::try_from(start.max(1) - 1).unwrap_or(usize::MAX);
    let mut seen = 0;
    for (position, (offset, _)) in s.char_indices().enumerate().skip(skip) {
        if s[offset..].starts_with(pattern) {
            seen += 1;
            if seen == occurrence {
                return Ok(position as i64 + 1);
            }
        }
    }
    Ok(0)
}

pub struct StringFunctionsVisitor<'v, 'a> {
    visitor: &'v ExpressionVisitor<'a>,
}

impl<'v, 'a> StringFunctionsVisitor<'v, 'a> {
    pub fn new(visitor: &'v ExpressionVisitor<'a>) -> Self {
        Self { visitor }
    }

    fn string_arg(&self, node: &Node) -> VtlResult<Expr<String>> {
        assert_string(self.visitor.visit(node)?, node)
    }

    fn integer_arg(&self, node: Option<&Node>) -> VtlResult<Option<Expr<i64>>> {
        node.map(|node| assert_integer(self.visitor.visit(node)?, node))
            .transpose()
    }

    pub fn visit(&self, name: &str, args: &[Node]) -> VtlResult<TypedExpression> {
        match name {
            "trim" | "ltrim" | "rtrim" | "upper" | "lower" => {
                check_arity(name, args, 1, 1)?;
                let s = self.string_arg(&args[0])?;
                let expr = match name {
                    "trim" => s.map(|s| Some(s.trim().to_string())),
                    "ltrim" => s.map(|s| Some(s.trim_start().to_string())),
                    "rtrim" => s.map(|s| Some(s.trim_end().to_string())),
                    "upper" => s.map(|s| Some(s.to_uppercase())),
                    _ => s.map(|s| Some(s.to_lowercase())),
                };
                Ok(TypedExpression::String(expr))
            }
            "length" => {
                check_arity(name, args, 1, 1)?;
                let s = self.string_arg(&args[0])?;
                Ok(TypedExpression::Integer(
                    s.map(|s| Some(s.chars().count() as i64)),
                ))
            }
            "substr" => {
                check_arity(name, args, 1, 3)?;
                let s = self.string_arg(&args[0])?;
                let start = self.integer_arg(args.get(1))?;
                let length = self.integer_arg(args.get(2))?;
                Ok(TypedExpression::String(Expr::new(move |context| {
                    let (Some(s), Some(start), Some(length)) = (
                        s.resolve(context)?,
                        resolve_or(&start, 1, context)?,
                        resolve_or(&length, i64::MAX, context)?,
                    ) else {
                        return Ok(None);
                    };
                    substr(&s, start, length).map(Some)
                })))
            }
            "replace" => {
                check_arity(name, args, 2, 3)?;
                let s = self.string_arg(&args[0])?;
                let pattern = PatternArg::new(&args[1], self.string_arg(&args[1])?, false);
                let replacement = args.get(2).map(|n| self.string_arg(n)).transpose()?;
                Ok(TypedExpression::String(Expr::new(move |context| {
                    let (Some(s), Some(regex), Some(replacement)) = (
                        s.resolve(context)?,
                        pattern.resolve(context)?,
                        resolve_or(&replacement, String::new(), context)?,
                    ) else {
                        return Ok(None);
                    };
                    Ok(Some(regex.replace_all(&s, replacement.as_str()).into_owned()))
                })))
            }
            "instr" => {
                check_arity(name, args, 2, 4)?;
                let s = self.string_arg(&args[0])?;
                let pattern = self.string_arg(&args[1])?;
                let start = self.integer_arg(args.get(2))?;
                let occurrence = self.integer_arg(args.get(3))?;
                Ok(TypedExpression::Integer(Expr::new(move |context| {
                    let (Some(s), Some(pattern), Some(start), Some(occurrence)) = (
                        s.resolve(context)?,
                        pattern.resolve(context)?,
                        resolve_or(&start, 1, context)?,
                        resolve_or(&occurrence, 1, context)?,
                    ) else {
                        return Ok(None);
                    };
                    instr(&s, &pattern, start, occurrence).map(Some)
                })))
            }
            _ => Err(VtlError::unsupported(name, None)),
        }
    }
}
