use crate::error::{VtlError, VtlResult};
use crate::expression::resolvable::zip_with;
use crate::expression::type_checking::assert_string;
use crate::expression::TypedExpression;
use crate::syntax::Node;
use crate::visitor::functions::check_arity;
use crate::visitor::ExpressionVisitor;

/// Edit distance counted in characters.
pub fn levenshtein(a: &str, b: &str) -> i64 {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()] as i64
}

pub struct DistanceFunctionsVisitor<'v, 'a> {
    visitor: &'v ExpressionVisitor<'a>,
}

impl<'v, 'a> DistanceFunctionsVisitor<'v, 'a> {
    pub fn new(visitor: &'v ExpressionVisitor<'a>) -> Self {
        Self { visitor }
    }

    pub fn visit(&self, name: &str, args: &[Node]) -> VtlResult<TypedExpression> {
        match name {
            "levenshtein" => {
                check_arity(name, args, 2, 2)?;
                let a = assert_string(self.visitor.visit(&args[0])?, &args[0])?;
                let b = assert_string(self.visitor.visit(&args[1])?, &args[1])?;
                Ok(TypedExpression::Integer(zip_with(a, b, |a, b| {
                    Some(levenshtein(&a, &b))
                })))
            }
            _ => Err(VtlError::unsupported(name, None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::InMemoryProcessingEngine;
    use crate::model::{Bindings, Value};
    use crate::syntax::FunctionCategory;
    use proptest::prelude::*;

    #[test]
    fn test_levenshtein() -> VtlResult<()> {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("flaw", "flaw"), 0);

        let bindings = Bindings::new();
        let engine = InMemoryProcessingEngine::new();
        let node = Node::function(
            FunctionCategory::Distance,
            "levenshtein",
            vec![Node::string("book"), Node::null()],
        );
        let expr = ExpressionVisitor::new(&bindings, &engine).visit(&node)?;
        assert_eq!(expr.resolve(&bindings)?, Value::Null);
        Ok(())
    }

    proptest! {
        #[test]
        fn levenshtein_is_symmetric_and_bounded(a in "[a-c]{0,8}", b in "[a-c]{0,8}") {
            let d = levenshtein(&a, &b);
            prop_assert_eq!(d, levenshtein(&b, &a));
            prop_assert!(d <= a.len().max(b.len()) as i64);
            prop_assert_eq!(levenshtein(&a, &a), 0);
        }
    }
}
