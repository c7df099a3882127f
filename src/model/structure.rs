//! Components, data structures and data points.

use crate::error::{VtlError, VtlResult};
use crate::model::{Role, Type, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Anything carrying a data structure.
pub trait Structured {
    fn data_structure(&self) -> &DataStructure;

    fn column_names(&self) -> Vec<String> {
        self.data_structure().names().map(str::to_string).collect()
    }
}

/// A column of a dataset: name, type and role.
///
/// The index is assigned by the owning [`DataStructure`] and does not take
/// part in equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    name: String,
    #[serde(rename = "type")]
    data_type: Type,
    role: Role,
    #[serde(skip)]
    index: usize,
}

impl Component {
    pub fn new(name: impl Into<String>, data_type: Type, role: Role) -> Self {
        Self {
            name: name.into(),
            data_type,
            role,
            index: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> Type {
        self.data_type
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_identifier(&self) -> bool {
        self.role == Role::Identifier
    }

    /// Same type and role under a different name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self::new(name, self.data_type, self.role)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.data_type == other.data_type && self.role == other.role
    }
}

impl Eq for Component {}

impl Hash for Component {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.data_type.hash(state);
        self.role.hash(state);
    }
}

/// Ordered mapping from column name to component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataStructure {
    components: IndexMap<String, Component>,
}

impl DataStructure {
    /// Build a structure from an ordered list of components.
    ///
    /// Fails with `StructureMismatch` on duplicate names.
    pub fn new(components: impl IntoIterator<Item = Component>) -> VtlResult<Self> {
        let mut map: IndexMap<String, Component> = IndexMap::new();
        for component in components {
            if map.contains_key(component.name()) {
                return Err(VtlError::structure_mismatch(format!(
                    "duplicate component '{}'",
                    component.name()
                )));
            }
            let mut component = component;
            component.index = map.len();
            map.insert(component.name.clone(), component);
        }
        Ok(Self { components: map })
    }

    /// Build a structure from parallel name-to-type and name-to-role mappings.
    ///
    /// Column order follows `types`.
    pub fn from_types_and_roles(
        types: &IndexMap<String, Type>,
        roles: &HashMap<String, Role>,
    ) -> VtlResult<Self> {
        if types.len() != roles.len() || types.keys().any(|name| !roles.contains_key(name)) {
            return Err(VtlError::structure_mismatch(
                "type and role key sets are inconsistent",
            ));
        }
        Self::new(
            types
                .iter()
                .map(|(name, data_type)| Component::new(name.clone(), *data_type, roles[name])),
        )
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Component> {
        self.components.get(name)
    }

    pub fn get_index(&self, index: usize) -> Option<&Component> {
        self.components.get_index(index).map(|(_, component)| component)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Position of the named column
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.components.get_index_of(name)
    }

    /// Position of a component, provided this structure holds an equal one
    pub fn index_of_component(&self, component: &Component) -> Option<usize> {
        match self.components.get(component.name()) {
            Some(own) if own == component => Some(own.index),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    pub fn identifiers(&self) -> Vec<&Component> {
        self.iter().filter(|c| c.is_identifier()).collect()
    }

    /// Same component set, regardless of declaration order.
    pub fn is_compatible_with(&self, other: &DataStructure) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|component| other.get(component.name()) == Some(component))
    }
}

impl Structured for DataStructure {
    fn data_structure(&self) -> &DataStructure {
        self
    }
}

/// A row of values conforming to a data structure.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    structure: Arc<DataStructure>,
    values: Vec<Value>,
}

impl DataPoint {
    /// A row where every cell is NULL
    pub fn new(structure: Arc<DataStructure>) -> Self {
        let values = vec![Value::Null; structure.len()];
        Self { structure, values }
    }

    /// Build a row from a partial name-to-value mapping.
    ///
    /// Omitted columns are NULL; unknown names fail with `UnknownColumn`.
    pub fn from_map<K, I>(structure: Arc<DataStructure>, entries: I) -> VtlResult<Self>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mut point = Self::new(structure);
        for (name, value) in entries {
            let index = point
                .structure
                .index_of(name.as_ref())
                .ok_or_else(|| VtlError::unknown_column(name.as_ref()))?;
            point.values[index] = value;
        }
        Ok(point)
    }

    /// Build a row from values listed in structure order.
    pub fn from_values(structure: Arc<DataStructure>, values: Vec<Value>) -> VtlResult<Self> {
        if values.len() != structure.len() {
            return Err(VtlError::structure_mismatch(format!(
                "row has {} values but the structure has {} components",
                values.len(),
                structure.len()
            )));
        }
        Ok(Self { structure, values })
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.structure.index_of(name).map(|index| &self.values[index])
    }

    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn structure(&self) -> &Arc<DataStructure> {
        &self.structure
    }

    /// Column name to value, in structure order
    pub fn to_map(&self) -> IndexMap<String, Value> {
        self.structure
            .names()
            .map(str::to_string)
            .zip(self.values.iter().cloned())
            .collect()
    }
}

impl Structured for DataPoint {
    fn data_structure(&self) -> &DataStructure {
        &self.structure
    }
}
