use crate::error::{VtlError, VtlResult};
use crate::model::{Dataset, Type};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Runtime values produced by resolving expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Number(f64),
    Boolean(bool),
    String(String),
    Dataset(Arc<Dataset>),
}

impl Value {
    /// Get the type of this value (`None` for NULL)
    pub fn data_type(&self) -> Option<Type> {
        match self {
            Value::Null => None,
            Value::Integer(_) => Some(Type::Integer),
            Value::Number(_) => Some(Type::Number),
            Value::Boolean(_) => Some(Type::Boolean),
            Value::String(_) => Some(Type::String),
            Value::Dataset(_) => Some(Type::Dataset),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value can be stored under the given type
    pub fn is_compatible_with(&self, data_type: Type) -> bool {
        match self.data_type() {
            None => true,
            Some(actual) => actual.widens_to(data_type),
        }
    }

    /// Numeric view of the value, widening integers.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Checked cast to `target`. NULL casts to anything.
    pub fn cast_to(self, target: Type) -> VtlResult<Value> {
        match (self, target) {
            (Value::Null, _) => Ok(Value::Null),
            (Value::Integer(i), Type::Number) => Ok(Value::Number(i as f64)),
            (value, target) if value.data_type() == Some(target) => Ok(value),
            (value, target) => Err(VtlError::type_mismatch(
                target,
                value.type_name(),
                "cast",
                None,
            )),
        }
    }

    /// Order two non-null values of comparable types.
    ///
    /// Integers and numbers compare numerically; other types only compare with
    /// themselves. Returns `None` for incomparable pairs or NULL operands.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (a, b) => match (a.as_number(), b.as_number()) {
                (Some(x), Some(y)) => x.partial_cmp(&y),
                _ => None,
            },
        }
    }

    pub(crate) fn type_name(&self) -> &'static str {
        match self.data_type() {
            Some(data_type) => data_type.as_str(),
            None => "Null",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Number(n) => write!(f, "{:?}", n),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Dataset(ds) => write!(f, "dataset({} rows)", ds.len()),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Dataset> for Value {
    fn from(value: Dataset) -> Self {
        Value::Dataset(Arc::new(value))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_compatibility() {
        assert!(Value::Null.is_compatible_with(Type::Integer));
        assert!(Value::Boolean(true).is_compatible_with(Type::Boolean));
        assert!(Value::Integer(42).is_compatible_with(Type::Integer));
        assert!(Value::Integer(42).is_compatible_with(Type::Number));
        assert!(Value::from("hello").is_compatible_with(Type::String));

        assert!(!Value::Number(1.5).is_compatible_with(Type::Integer));
        assert!(!Value::Boolean(true).is_compatible_with(Type::Integer));
        assert!(!Value::Integer(42).is_compatible_with(Type::String));
    }

    #[test]
    fn test_cast() -> VtlResult<()> {
        assert_eq!(Value::Integer(3).cast_to(Type::Number)?, Value::Number(3.0));
        assert_eq!(Value::Null.cast_to(Type::String)?, Value::Null);
        assert_eq!(Value::from("a").cast_to(Type::String)?, Value::from("a"));
        assert!(matches!(
            Value::Number(1.0).cast_to(Type::Integer),
            Err(VtlError::TypeMismatch { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_compare() {
        assert_eq!(
            Value::Integer(1).compare(&Value::Integer(2)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::Integer(2).compare(&Value::Number(2.0)),
            Some(Ordering::Equal)
        );
        assert_eq!(
            Value::from("b").compare(&Value::from("a")),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::Null.compare(&Value::Integer(1)), None);
        assert_eq!(Value::from("1").compare(&Value::Integer(1)), None);
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(Some(3i64)), Value::Integer(3));
        assert_eq!(Value::from(None::<bool>), Value::Null);
    }
}
