use crate::error::VtlResult;
use crate::model::{DataPoint, DataStructure, Structured, Value};
use indexmap::IndexMap;
use std::sync::Arc;

/// In-memory dataset: a structure plus the rows conforming to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    structure: Arc<DataStructure>,
    points: Vec<DataPoint>,
}

impl Dataset {
    /// Build a dataset from rows listed in structure order
    pub fn new(structure: DataStructure, rows: Vec<Vec<Value>>) -> VtlResult<Self> {
        let structure = Arc::new(structure);
        let points = rows
            .into_iter()
            .map(|row| DataPoint::from_values(structure.clone(), row))
            .collect::<VtlResult<Vec<_>>>()?;
        Ok(Self { structure, points })
    }

    /// Build a dataset from partial name-to-value rows
    pub fn from_rows<K, R>(structure: DataStructure, rows: Vec<R>) -> VtlResult<Self>
    where
        K: AsRef<str>,
        R: IntoIterator<Item = (K, Value)>,
    {
        let structure = Arc::new(structure);
        let points = rows
            .into_iter()
            .map(|row| DataPoint::from_map(structure.clone(), row))
            .collect::<VtlResult<Vec<_>>>()?;
        Ok(Self { structure, points })
    }

    /// Assemble a dataset from points already bound to `structure`.
    pub(crate) fn from_points(structure: Arc<DataStructure>, points: Vec<DataPoint>) -> Self {
        debug_assert!(points.iter().all(|p| p.structure() == &structure));
        Self { structure, points }
    }

    pub fn empty(structure: DataStructure) -> Self {
        Self {
            structure: Arc::new(structure),
            points: Vec::new(),
        }
    }

    pub fn structure(&self) -> &Arc<DataStructure> {
        &self.structure
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn data_as_maps(&self) -> Vec<IndexMap<String, Value>> {
        self.points.iter().map(DataPoint::to_map).collect()
    }

    pub fn data_as_lists(&self) -> Vec<Vec<Value>> {
        self.points.iter().map(|p| p.values().to_vec()).collect()
    }
}

impl Structured for Dataset {
    fn data_structure(&self) -> &DataStructure {
        &self.structure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Component, Role, Type};

    #[test]
    fn test_dataset_from_rows() -> VtlResult<()> {
        let structure = DataStructure::new(vec![
            Component::new("name", Type::String, Role::Identifier),
            Component::new("age", Type::Integer, Role::Measure),
        ])?;
        let dataset = Dataset::from_rows(
            structure,
            vec![
                vec![("name", Value::from("Hadrien")), ("age", Value::Integer(10))],
                vec![("name", Value::from("Nico"))],
            ],
        )?;

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.column_names(), vec!["name", "age"]);
        assert_eq!(
            dataset.data_as_lists(),
            vec![
                vec![Value::from("Hadrien"), Value::Integer(10)],
                vec![Value::from("Nico"), Value::Null],
            ]
        );
        assert_eq!(dataset.data_as_maps()[1]["age"], Value::Null);
        Ok(())
    }
}
