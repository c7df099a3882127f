//! Name lookups used while building and resolving expressions.
//!
//! A [`Scope`] answers "what is this name?" while visiting the syntax tree; a
//! [`Context`] answers "what is its value?" when an expression is resolved.
//! The two may come from different sources, which is what lets one built
//! expression be resolved against many binding sets or many rows.

use crate::model::{DataPoint, DataStructure, Type, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Variable bindings supplied by the host.
pub type Bindings = HashMap<String, Value>;

/// Resolution-time lookup of variable values.
pub trait Context {
    fn get_value(&self, name: &str) -> Option<&Value>;
}

impl Context for HashMap<String, Value> {
    fn get_value(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl Context for DataPoint {
    fn get_value(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

/// Construction-time knowledge about a name.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    /// Bound to NULL, so no static type is known
    Null,
    Scalar(Type),
    Dataset(Arc<DataStructure>),
}

/// Construction-time lookup of variable declarations.
pub trait Scope {
    fn declaration(&self, name: &str) -> Option<Declaration>;
}

impl Scope for HashMap<String, Value> {
    fn declaration(&self, name: &str) -> Option<Declaration> {
        self.get(name).map(|value| match value {
            Value::Null => Declaration::Null,
            Value::Dataset(dataset) => Declaration::Dataset(dataset.structure().clone()),
            other => match other.data_type() {
                Some(data_type) => Declaration::Scalar(data_type),
                None => Declaration::Null,
            },
        })
    }
}

impl Scope for DataStructure {
    fn declaration(&self, name: &str) -> Option<Declaration> {
        self.get(name)
            .map(|component| Declaration::Scalar(component.data_type()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Component, Dataset, Role};

    #[test]
    fn test_bindings_scope() {
        let structure = DataStructure::new(vec![Component::new(
            "id",
            Type::String,
            Role::Identifier,
        )])
        .unwrap();
        let mut bindings = Bindings::new();
        bindings.insert("a".to_string(), Value::Integer(1));
        bindings.insert("n".to_string(), Value::Null);
        bindings.insert("ds".to_string(), Dataset::empty(structure.clone()).into());

        assert_eq!(
            bindings.declaration("a"),
            Some(Declaration::Scalar(Type::Integer))
        );
        assert_eq!(bindings.declaration("n"), Some(Declaration::Null));
        assert_eq!(
            bindings.declaration("ds"),
            Some(Declaration::Dataset(Arc::new(structure)))
        );
        assert_eq!(bindings.declaration("missing"), None);
        assert_eq!(bindings.get_value("a"), Some(&Value::Integer(1)));
    }

    #[test]
    fn test_structure_scope_and_row_context() {
        let structure = Arc::new(
            DataStructure::new(vec![
                Component::new("id", Type::String, Role::Identifier),
                Component::new("x", Type::Number, Role::Measure),
            ])
            .unwrap(),
        );
        assert_eq!(
            structure.declaration("x"),
            Some(Declaration::Scalar(Type::Number))
        );

        let row = DataPoint::from_map(structure, vec![("x", Value::Number(1.5))]).unwrap();
        assert_eq!(row.get_value("x"), Some(&Value::Number(1.5)));
        assert_eq!(row.get_value("id"), Some(&Value::Null));
        assert_eq!(row.get_value("y"), None);
    }
}
