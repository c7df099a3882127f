use crate::expression::TypedExpression;
use crate::model::Value;
use crate::syntax::Literal;

/// Literal value of a constant node
pub fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Null => Value::Null,
        Literal::Integer(i) => Value::Integer(*i),
        Literal::Number(n) => Value::Number(*n),
        Literal::Boolean(b) => Value::Boolean(*b),
        Literal::String(s) => Value::String(s.clone()),
    }
}

pub struct ConstantVisitor;

impl ConstantVisitor {
    pub fn visit_constant(&self, literal: &Literal) -> TypedExpression {
        TypedExpression::constant(literal_value(literal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VtlResult;
    use crate::model::{Bindings, Type};

    #[test]
    fn test_constants() -> VtlResult<()> {
        let bindings = Bindings::new();
        let cases = vec![
            (Literal::Integer(1), Some(Type::Integer), Value::Integer(1)),
            (Literal::Number(1.5), Some(Type::Number), Value::Number(1.5)),
            (Literal::Boolean(true), Some(Type::Boolean), Value::Boolean(true)),
            (Literal::String("a".into()), Some(Type::String), Value::from("a")),
            (Literal::Null, None, Value::Null),
        ];
        for (literal, data_type, value) in cases {
            let expr = ConstantVisitor.visit_constant(&literal);
            assert_eq!(expr.static_type(), data_type);
            assert_eq!(expr.resolve(&bindings)?, value);
        }
        Ok(())
    }
}
