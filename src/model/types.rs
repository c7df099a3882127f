use serde::{Deserialize, Serialize};
use std::fmt;

/// Static types of VTL expressions and dataset components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Integer,
    /// Real numbers, stored as `f64`
    Number,
    Boolean,
    String,
    Dataset,
}

impl Type {
    /// Integer or Number
    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Integer | Type::Number)
    }

    /// Whether a value of `self` can be used where `target` is expected.
    ///
    /// Integer widens to Number; everything else must match exactly.
    pub fn widens_to(&self, target: Type) -> bool {
        *self == target || (*self == Type::Integer && target == Type::Number)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Type::Integer => "Integer",
            Type::Number => "Number",
            Type::Boolean => "Boolean",
            Type::String => "String",
            Type::Dataset => "Dataset",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of a component within a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Identifier,
    Measure,
    Attribute,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Identifier => f.write_str("Identifier"),
            Role::Measure => f.write_str("Measure"),
            Role::Attribute => f.write_str("Attribute"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_types() {
        assert!(Type::Integer.is_numeric());
        assert!(Type::Number.is_numeric());
        assert!(!Type::Boolean.is_numeric());
        assert!(!Type::Dataset.is_numeric());
    }

    #[test]
    fn test_widening() {
        assert!(Type::Integer.widens_to(Type::Number));
        assert!(Type::Integer.widens_to(Type::Integer));
        assert!(!Type::Number.widens_to(Type::Integer));
        assert!(!Type::String.widens_to(Type::Boolean));
    }
}
