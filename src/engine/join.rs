//! Join planning and execution.
//!
//! A join over `n` aliased operands is folded left to right as `n - 1`
//! pairwise steps. Each step appends the right operand's columns, minus the
//! join components, to the accumulated row. Matching uses a hash table built
//! from the right operand, keyed by [`GroupKey`].

use crate::engine::GroupKey;
use crate::error::{VtlError, VtlResult};
use crate::expression::DatasetExpression;
use crate::model::{Component, DataPoint, DataStructure, Dataset, Value};
use crate::syntax::JoinKind;
use indexmap::IndexMap;
use std::sync::Arc;

/// One pairwise step of a join
#[derive(Debug, Clone)]
struct JoinStep {
    /// Accumulated structure after this step
    structure: Arc<DataStructure>,
    /// Join component positions in the accumulated row
    left_keys: Vec<usize>,
    /// Join component positions in the right operand
    right_keys: Vec<usize>,
    /// Right operand columns appended to the accumulated row
    right_columns: Vec<usize>,
}

/// Output structure and column layout of a join, computed before any row is read.
#[derive(Debug, Clone)]
pub struct JoinPlan {
    kind: JoinKind,
    keys: Vec<String>,
    steps: Vec<JoinStep>,
    structure: Arc<DataStructure>,
}

impl JoinPlan {
    pub fn new(
        kind: JoinKind,
        datasets: &IndexMap<String, DatasetExpression>,
        components: &[Component],
    ) -> VtlResult<Self> {
        let mut operands = datasets.iter();
        let Some((_, first)) = operands.next() else {
            return Err(VtlError::structure_mismatch(format!(
                "{} requires at least one dataset",
                kind
            )));
        };

        let components = match kind {
            JoinKind::Cross => &[][..],
            _ => components,
        };
        // Join components must agree on name, type and role in every operand
        for (alias, dataset) in datasets {
            for component in components {
                match dataset.structure().get(component.name()) {
                    None => {
                        return Err(VtlError::unknown_column(format!(
                            "{}#{}",
                            alias,
                            component.name()
                        )))
                    }
                    Some(actual) if actual != component => {
                        return Err(VtlError::structure_mismatch(format!(
                            "join component '{}' of '{}' is {} {}, expected {} {}",
                            component.name(),
                            alias,
                            actual.role(),
                            actual.data_type(),
                            component.role(),
                            component.data_type()
                        )))
                    }
                    Some(_) => {}
                }
            }
        }
        let keys: Vec<String> = components.iter().map(|c| c.name().to_string()).collect();

        let mut accumulated: Vec<Component> = first.structure().iter().cloned().collect();
        let mut current = first.structure().clone();
        let mut steps = Vec::new();

        for (alias, dataset) in operands {
            let right = dataset.structure();
            let mut right_columns = Vec::new();
            for component in right.iter() {
                if keys.iter().any(|key| key == component.name()) {
                    continue;
                }
                let mut column = component.clone();
                if accumulated.iter().any(|c| c.name() == column.name()) {
                    if kind != JoinKind::Cross {
                        return Err(VtlError::structure_mismatch(format!(
                            "column '{}' of '{}' is already defined by another dataset",
                            column.name(),
                            alias
                        )));
                    }
                    column = column.renamed(format!("{}#{}", alias, column.name()));
                }
                right_columns.push(component.index());
                accumulated.push(column);
            }

            let left_keys = keys
                .iter()
                .map(|key| {
                    current
                        .index_of(key)
                        .ok_or_else(|| VtlError::unknown_column(key.clone()))
                })
                .collect::<VtlResult<Vec<_>>>()?;
            let right_keys = keys
                .iter()
                .map(|key| {
                    right
                        .index_of(key)
                        .ok_or_else(|| VtlError::unknown_column(key.clone()))
                })
                .collect::<VtlResult<Vec<_>>>()?;

            let structure = Arc::new(DataStructure::new(accumulated.clone())?);
            steps.push(JoinStep {
                structure: structure.clone(),
                left_keys,
                right_keys,
                right_columns,
            });
            current = structure;
        }

        Ok(Self {
            kind,
            keys,
            steps,
            structure: current,
        })
    }

    pub fn structure(&self) -> &Arc<DataStructure> {
        &self.structure
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

fn key_of(values: &[Value], positions: &[usize]) -> GroupKey {
    GroupKey(
        positions
            .iter()
            .map(|&i| values.get(i).cloned().unwrap_or(Value::Null))
            .collect(),
    )
}

fn combine(left: &[Value], right: Option<&DataPoint>, step: &JoinStep) -> Vec<Value> {
    let mut row = Vec::with_capacity(step.structure.len());
    row.extend_from_slice(left);
    for &i in &step.right_columns {
        let value = right
            .and_then(|point| point.get_index(i))
            .cloned()
            .unwrap_or(Value::Null);
        row.push(value);
    }
    row
}

fn join_step(kind: JoinKind, step: &JoinStep, left: Vec<Vec<Value>>, right: &Dataset) -> Vec<Vec<Value>> {
    let mut rows = Vec::new();

    if kind == JoinKind::Cross {
        for l in &left {
            for r in right.points() {
                rows.push(combine(l, Some(r), step));
            }
        }
        return rows;
    }

    let mut table: IndexMap<GroupKey, Vec<usize>> = IndexMap::new();
    for (i, point) in right.points().iter().enumerate() {
        table
            .entry(key_of(point.values(), &step.right_keys))
            .or_default()
            .push(i);
    }

    let mut matched = vec![false; right.len()];
    for l in &left {
        match table.get(&key_of(l, &step.left_keys)) {
            Some(matches) => {
                for &i in matches {
                    matched[i] = true;
                    rows.push(combine(l, right.points().get(i), step));
                }
            }
            None if kind != JoinKind::Inner => rows.push(combine(l, None, step)),
            None => {}
        }
    }

    if kind == JoinKind::Full {
        let left_width = step.structure.len() - step.right_columns.len();
        for (i, point) in right.points().iter().enumerate() {
            if matched[i] {
                continue;
            }
            let mut l = vec![Value::Null; left_width];
            for (&li, &ri) in step.left_keys.iter().zip(&step.right_keys) {
                l[li] = point.get_index(ri).cloned().unwrap_or(Value::Null);
            }
            rows.push(combine(&l, Some(point), step));
        }
    }
    rows
}

/// Run `plan` over resolved operands, given in plan order.
pub fn execute(plan: &JoinPlan, inputs: &[Arc<Dataset>]) -> VtlResult<Dataset> {
    let Some((first, rest)) = inputs.split_first() else {
        return Err(VtlError::structure_mismatch("join requires at least one dataset"));
    };
    let mut rows = first.data_as_lists();
    for (step, right) in plan.steps.iter().zip(rest) {
        rows = join_step(plan.kind, step, rows, right);
    }
    let points = rows
        .into_iter()
        .map(|values| DataPoint::from_values(plan.structure.clone(), values))
        .collect::<VtlResult<Vec<_>>>()?;
    Ok(Dataset::from_points(plan.structure.clone(), points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{InMemoryProcessingEngine, ProcessingEngine};
    use crate::model::{Bindings, Role, Structured, Type};

    fn dataset(measure: &str, rows: Vec<(&str, i64)>) -> DatasetExpression {
        let structure = DataStructure::new(vec![
            Component::new("id", Type::String, Role::Identifier),
            Component::new(measure, Type::Integer, Role::Measure),
        ])
        .unwrap();
        let rows = rows
            .into_iter()
            .map(|(id, v)| vec![Value::from(id), Value::Integer(v)])
            .collect();
        DatasetExpression::constant(Arc::new(Dataset::new(structure, rows).unwrap()))
    }

    fn operands() -> IndexMap<String, DatasetExpression> {
        let mut datasets = IndexMap::new();
        datasets.insert("a".to_string(), dataset("x", vec![("1", 10), ("2", 20)]));
        datasets.insert("b".to_string(), dataset("y", vec![("2", 200), ("3", 300)]));
        datasets
    }

    fn id() -> Vec<Component> {
        vec![Component::new("id", Type::String, Role::Identifier)]
    }

    #[test]
    fn test_inner_and_left_join() -> VtlResult<()> {
        let engine = InMemoryProcessingEngine::new();

        let inner = engine.execute_inner_join(operands(), id())?;
        assert_eq!(inner.column_names(), vec!["id", "x", "y"]);
        let rows = inner.resolve(&Bindings::new())?.data_as_lists();
        assert_eq!(
            rows,
            vec![vec![Value::from("2"), Value::Integer(20), Value::Integer(200)]]
        );

        let left = engine.execute_left_join(operands(), id())?;
        let rows = left.resolve(&Bindings::new())?.data_as_lists();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            vec![Value::from("1"), Value::Integer(10), Value::Null]
        );
        Ok(())
    }

    #[test]
    fn test_full_join_keeps_unmatched_keys() -> VtlResult<()> {
        let engine = InMemoryProcessingEngine::new();
        let full = engine.execute_full_join(operands(), id())?;
        let rows = full.resolve(&Bindings::new())?.data_as_lists();
        assert_eq!(
            rows,
            vec![
                vec![Value::from("1"), Value::Integer(10), Value::Null],
                vec![Value::from("2"), Value::Integer(20), Value::Integer(200)],
                vec![Value::from("3"), Value::Null, Value::Integer(300)],
            ]
        );
        Ok(())
    }

    #[test]
    fn test_cross_join_qualifies_clashing_columns() -> VtlResult<()> {
        let engine = InMemoryProcessingEngine::new();
        let cross = engine.execute_cross_join(operands(), Vec::new())?;
        assert_eq!(cross.column_names(), vec!["id", "x", "b#id", "y"]);
        let rows = cross.resolve(&Bindings::new())?.data_as_lists();
        assert_eq!(rows.len(), 4);
        assert_eq!(
            rows[1],
            vec![
                Value::from("1"),
                Value::Integer(10),
                Value::from("3"),
                Value::Integer(300)
            ]
        );
        Ok(())
    }

    #[test]
    fn test_join_structure_errors() {
        let engine = InMemoryProcessingEngine::new();

        let mut clashing = IndexMap::new();
        clashing.insert("a".to_string(), dataset("x", vec![]));
        clashing.insert("b".to_string(), dataset("x", vec![]));
        assert!(matches!(
            engine.execute_inner_join(clashing, id()),
            Err(VtlError::StructureMismatch { .. })
        ));

        let missing = vec![Component::new("code", Type::String, Role::Identifier)];
        assert!(matches!(
            engine.execute_left_join(operands(), missing),
            Err(VtlError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_join_components_must_agree_on_type() {
        let engine = InMemoryProcessingEngine::new();
        let integer_ids = DataStructure::new(vec![
            Component::new("id", Type::Integer, Role::Identifier),
            Component::new("y", Type::Integer, Role::Measure),
        ])
        .unwrap();
        let right = Dataset::new(integer_ids, vec![vec![Value::Integer(1), Value::Integer(2)]]).unwrap();

        let mismatched = || {
            let mut datasets = IndexMap::new();
            datasets.insert("ds1".to_string(), dataset("x", vec![("1", 1)]));
            datasets.insert(
                "ds2".to_string(),
                DatasetExpression::constant(Arc::new(right.clone())),
            );
            datasets
        };

        for result in [
            engine.execute_full_join(mismatched(), id()),
            engine.execute_inner_join(mismatched(), id()),
            engine.execute_left_join(mismatched(), id()),
        ] {
            let err = result.unwrap_err();
            assert!(matches!(err, VtlError::StructureMismatch { .. }));
            assert!(err.to_string().contains("ds2"));
        }

        // a role mismatch on the key is rejected as well
        let measure_id = vec![Component::new("id", Type::String, Role::Measure)];
        assert!(matches!(
            engine.execute_inner_join(operands(), measure_id),
            Err(VtlError::StructureMismatch { .. })
        ));

        // cross joins have no join components to compare
        assert!(engine.execute_cross_join(mismatched(), id()).is_ok());
    }
}
