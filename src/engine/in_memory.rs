//! In-memory processing engine.
//!
//! Every operation materialises its input datasets when resolved and builds
//! the output rows eagerly. Row order is preserved by calc, filter, rename and
//! project; union concatenates in argument order; aggr emits groups in
//! first-seen order.

use crate::engine::join::{self, JoinPlan};
use crate::engine::{GroupKey, KeyExtractor, ProcessingEngine};
use crate::error::{VtlError, VtlResult};
use crate::expression::{AggregationExpression, DatasetExpression, Expr, TypedExpression};
use crate::model::{Component, DataPoint, DataStructure, Dataset, Role, Type, Value};
use crate::syntax::JoinKind;
use indexmap::IndexMap;
use log::{debug, trace};
use std::collections::HashMap;
use std::sync::Arc;

/// Where an output cell of a calc comes from
#[derive(Debug, Clone)]
enum CellSource {
    Column(usize),
    Computed(TypedExpression),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InMemoryProcessingEngine;

impl InMemoryProcessingEngine {
    pub fn new() -> Self {
        Self
    }

    fn join(
        &self,
        kind: JoinKind,
        datasets: IndexMap<String, DatasetExpression>,
        components: Vec<Component>,
    ) -> VtlResult<DatasetExpression> {
        let plan = JoinPlan::new(kind, &datasets, &components)?;
        debug!(
            "planned {} of {} datasets on {:?}",
            kind,
            datasets.len(),
            plan.keys()
        );
        let structure = plan.structure().clone();
        let operands: Vec<DatasetExpression> = datasets.into_values().collect();
        Ok(DatasetExpression::new(structure, move |context| {
            let inputs = operands
                .iter()
                .map(|operand| operand.resolve(context))
                .collect::<VtlResult<Vec<_>>>()?;
            let result = join::execute(&plan, &inputs)?;
            trace!("{} produced {} rows", kind, result.len());
            Ok(Arc::new(result))
        }))
    }
}

impl ProcessingEngine for InMemoryProcessingEngine {
    fn execute_calc(
        &self,
        dataset: DatasetExpression,
        expressions: IndexMap<String, TypedExpression>,
        roles: HashMap<String, Role>,
    ) -> VtlResult<DatasetExpression> {
        let input = dataset.structure().clone();
        let mut components: Vec<Component> = input.iter().cloned().collect();
        let mut sources: Vec<CellSource> = (0..input.len()).map(CellSource::Column).collect();

        for (name, expression) in expressions {
            let data_type = match expression.static_type() {
                Some(Type::Dataset) | None => {
                    return Err(VtlError::type_mismatch(
                        "a scalar type",
                        expression.type_name(),
                        format!("calc {}", name),
                        None,
                    ))
                }
                Some(data_type) => data_type,
            };
            match input.index_of(&name) {
                Some(index) => {
                    let role = roles
                        .get(&name)
                        .copied()
                        .unwrap_or_else(|| components[index].role());
                    components[index] = Component::new(name, data_type, role);
                    sources[index] = CellSource::Computed(expression);
                }
                None => {
                    let role = roles.get(&name).copied().unwrap_or(Role::Measure);
                    components.push(Component::new(name, data_type, role));
                    sources.push(CellSource::Computed(expression));
                }
            }
        }

        let structure = Arc::new(DataStructure::new(components)?);
        debug!("planned calc producing {:?}", structure.names().collect::<Vec<_>>());
        let output = structure.clone();
        Ok(DatasetExpression::new(structure, move |context| {
            let dataset = dataset.resolve(context)?;
            let mut points = Vec::with_capacity(dataset.len());
            for point in dataset.points() {
                let mut values = Vec::with_capacity(sources.len());
                for (index, source) in sources.iter().enumerate() {
                    let value = match source {
                        CellSource::Column(i) => point.get_index(*i).cloned().unwrap_or(Value::Null),
                        CellSource::Computed(expression) => {
                            let data_type = output
                                .get_index(index)
                                .map(Component::data_type)
                                .unwrap_or(Type::String);
                            expression.resolve(point)?.cast_to(data_type)?
                        }
                    };
                    values.push(value);
                }
                points.push(DataPoint::from_values(output.clone(), values)?);
            }
            trace!("calc produced {} rows", points.len());
            Ok(Arc::new(Dataset::from_points(output.clone(), points)))
        }))
    }

    fn execute_filter(
        &self,
        dataset: DatasetExpression,
        predicate: Expr<bool>,
    ) -> VtlResult<DatasetExpression> {
        debug!("planned filter");
        let structure = dataset.structure().clone();
        let output = structure.clone();
        Ok(DatasetExpression::new(structure, move |context| {
            let dataset = dataset.resolve(context)?;
            let mut points = Vec::new();
            for point in dataset.points() {
                if predicate.resolve(point)? == Some(true) {
                    points.push(point.clone());
                }
            }
            trace!("filter kept {} of {} rows", points.len(), dataset.len());
            Ok(Arc::new(Dataset::from_points(output.clone(), points)))
        }))
    }

    fn execute_rename(
        &self,
        dataset: DatasetExpression,
        from_to: IndexMap<String, String>,
    ) -> VtlResult<DatasetExpression> {
        let input = dataset.structure().clone();
        for (from, to) in &from_to {
            if !input.contains(from) {
                return Err(VtlError::unknown_column(from.clone()));
            }
            if input.contains(to) && !from_to.contains_key(to) {
                return Err(VtlError::structure_mismatch(format!(
                    "cannot rename '{}' to '{}': column already exists",
                    from, to
                )));
            }
        }
        let structure = Arc::new(DataStructure::new(input.iter().map(|component| {
            match from_to.get(component.name()) {
                Some(to) => component.renamed(to.clone()),
                None => component.clone(),
            }
        }))?);
        debug!("planned rename {:?}", from_to);

        let output = structure.clone();
        Ok(DatasetExpression::new(structure, move |context| {
            let dataset = dataset.resolve(context)?;
            let points = dataset
                .points()
                .iter()
                .map(|point| DataPoint::from_values(output.clone(), point.values().to_vec()))
                .collect::<VtlResult<Vec<_>>>()?;
            Ok(Arc::new(Dataset::from_points(output.clone(), points)))
        }))
    }

    fn execute_project(
        &self,
        dataset: DatasetExpression,
        names: Vec<String>,
    ) -> VtlResult<DatasetExpression> {
        let input = dataset.structure().clone();
        let mut indexes = Vec::with_capacity(names.len());
        let mut components = Vec::with_capacity(names.len());
        for name in &names {
            let component = input
                .get(name)
                .ok_or_else(|| VtlError::unknown_column(name.clone()))?;
            indexes.push(component.index());
            components.push(component.clone());
        }
        let structure = Arc::new(DataStructure::new(components)?);
        debug!("planned project {:?}", names);

        let output = structure.clone();
        Ok(DatasetExpression::new(structure, move |context| {
            let dataset = dataset.resolve(context)?;
            let points = dataset
                .points()
                .iter()
                .map(|point| {
                    let values = indexes
                        .iter()
                        .map(|&i| point.get_index(i).cloned().unwrap_or(Value::Null))
                        .collect();
                    DataPoint::from_values(output.clone(), values)
                })
                .collect::<VtlResult<Vec<_>>>()?;
            Ok(Arc::new(Dataset::from_points(output.clone(), points)))
        }))
    }

    fn execute_union(&self, datasets: Vec<DatasetExpression>) -> VtlResult<DatasetExpression> {
        let Some(first) = datasets.first() else {
            return Err(VtlError::structure_mismatch("union requires at least one dataset"));
        };
        let structure = first.structure().clone();

        // Column positions of each operand, in the first operand's order
        let mut layouts = Vec::with_capacity(datasets.len());
        for (position, dataset) in datasets.iter().enumerate() {
            if !dataset.structure().is_compatible_with(&structure) {
                return Err(VtlError::structure_mismatch(format!(
                    "dataset at position {} is not compatible with the first dataset",
                    position + 1
                )));
            }
            let layout = structure
                .names()
                .map(|name| dataset.structure().index_of(name).unwrap_or_default())
                .collect::<Vec<_>>();
            layouts.push(layout);
        }
        debug!("planned union of {} datasets", datasets.len());

        let output = structure.clone();
        Ok(DatasetExpression::new(structure, move |context| {
            let mut points = Vec::new();
            for (dataset, layout) in datasets.iter().zip(&layouts) {
                let dataset = dataset.resolve(context)?;
                for point in dataset.points() {
                    let values = layout
                        .iter()
                        .map(|&i| point.get_index(i).cloned().unwrap_or(Value::Null))
                        .collect();
                    points.push(DataPoint::from_values(output.clone(), values)?);
                }
            }
            trace!("union produced {} rows", points.len());
            Ok(Arc::new(Dataset::from_points(output.clone(), points)))
        }))
    }

    fn execute_aggr(
        &self,
        dataset: DatasetExpression,
        structure: DataStructure,
        aggregations: IndexMap<String, AggregationExpression>,
        key_extractor: KeyExtractor,
    ) -> VtlResult<DatasetExpression> {
        let input = dataset.structure().clone();
        let mut carried = false;
        for component in structure.iter() {
            if aggregations.contains_key(component.name()) {
                continue;
            }
            if !input.contains(component.name()) {
                return Err(VtlError::unknown_column(component.name()));
            }
            carried = true;
        }
        if let Some(name) = aggregations.keys().find(|name| !structure.contains(name)) {
            return Err(VtlError::structure_mismatch(format!(
                "aggregation '{}' is not part of the result structure",
                name
            )));
        }
        debug!(
            "planned aggr of {:?}",
            aggregations.keys().collect::<Vec<_>>()
        );

        let structure = Arc::new(structure);
        let output = structure.clone();
        Ok(DatasetExpression::new(structure, move |context| {
            let dataset = dataset.resolve(context)?;
            let mut groups: IndexMap<GroupKey, Vec<&DataPoint>> = IndexMap::new();
            for point in dataset.points() {
                groups
                    .entry(GroupKey(key_extractor(point)))
                    .or_default()
                    .push(point);
            }
            // A global aggregate over no rows still yields one row
            if groups.is_empty() && !carried {
                groups.insert(GroupKey(Vec::new()), Vec::new());
            }

            let mut points = Vec::with_capacity(groups.len());
            for rows in groups.values() {
                let mut values = Vec::with_capacity(output.len());
                for component in output.iter() {
                    let value = match aggregations.get(component.name()) {
                        Some(aggregation) => aggregation.collect(rows.iter().copied())?,
                        None => rows
                            .first()
                            .and_then(|row| row.get(component.name()))
                            .cloned()
                            .unwrap_or(Value::Null),
                    };
                    values.push(value.cast_to(component.data_type())?);
                }
                points.push(DataPoint::from_values(output.clone(), values)?);
            }
            trace!("aggr produced {} groups", points.len());
            Ok(Arc::new(Dataset::from_points(output.clone(), points)))
        }))
    }

    fn execute_left_join(
        &self,
        datasets: IndexMap<String, DatasetExpression>,
        components: Vec<Component>,
    ) -> VtlResult<DatasetExpression> {
        self.join(JoinKind::Left, datasets, components)
    }

    fn execute_inner_join(
        &self,
        datasets: IndexMap<String, DatasetExpression>,
        components: Vec<Component>,
    ) -> VtlResult<DatasetExpression> {
        self.join(JoinKind::Inner, datasets, components)
    }

    fn execute_full_join(
        &self,
        datasets: IndexMap<String, DatasetExpression>,
        components: Vec<Component>,
    ) -> VtlResult<DatasetExpression> {
        self.join(JoinKind::Full, datasets, components)
    }

    fn execute_cross_join(
        &self,
        datasets: IndexMap<String, DatasetExpression>,
        components: Vec<Component>,
    ) -> VtlResult<DatasetExpression> {
        self.join(JoinKind::Cross, datasets, components)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::key_by;
    use crate::model::{Bindings, Context, Structured};
    use crate::syntax::AggregateOperator;

    fn people() -> DatasetExpression {
        let structure = DataStructure::new(vec![
            Component::new("id", Type::String, Role::Identifier),
            Component::new("age", Type::Integer, Role::Measure),
            Component::new("sex", Type::String, Role::Attribute),
        ])
        .unwrap();
        let dataset = Dataset::new(
            structure,
            vec![
                vec![Value::from("Hadrien"), Value::Integer(10), Value::from("M")],
                vec![Value::from("Nico"), Value::Integer(11), Value::from("M")],
                vec![Value::from("Franck"), Value::Integer(12), Value::from("F")],
            ],
        )
        .unwrap();
        DatasetExpression::constant(Arc::new(dataset))
    }

    fn column<T: crate::expression::Scalar>(name: &'static str) -> Expr<T> {
        Expr::from_values(move |context: &dyn Context| {
            Ok(context.get_value(name).cloned().unwrap_or(Value::Null))
        })
    }

    #[test]
    fn test_calc_replaces_and_appends() -> VtlResult<()> {
        let engine = InMemoryProcessingEngine::new();
        let mut expressions = IndexMap::new();
        expressions.insert(
            "age".to_string(),
            TypedExpression::Integer(column::<i64>("age").map(|a| Some(a * 2))),
        );
        expressions.insert(
            "adult".to_string(),
            TypedExpression::Boolean(column::<i64>("age").map(|a| Some(a >= 11))),
        );
        let mut roles = HashMap::new();
        roles.insert("adult".to_string(), Role::Attribute);

        let result = engine.execute_calc(people(), expressions, roles)?;
        assert_eq!(result.column_names(), vec!["id", "age", "sex", "adult"]);
        assert_eq!(result.structure().get("adult").map(|c| c.role()), Some(Role::Attribute));
        assert_eq!(result.structure().get("age").map(|c| c.role()), Some(Role::Measure));

        let dataset = result.resolve(&Bindings::new())?;
        assert_eq!(
            dataset.data_as_lists()[0],
            vec![
                Value::from("Hadrien"),
                Value::Integer(20),
                Value::from("M"),
                Value::Boolean(false)
            ]
        );
        Ok(())
    }

    #[test]
    fn test_filter_drops_false_and_null() -> VtlResult<()> {
        let engine = InMemoryProcessingEngine::new();
        let predicate = column::<i64>("age").map(|a| if a == 11 { None } else { Some(a > 10) });
        let result = engine.execute_filter(people(), predicate)?;
        let dataset = result.resolve(&Bindings::new())?;
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.points()[0].get("id"), Some(&Value::from("Franck")));
        Ok(())
    }

    #[test]
    fn test_rename_and_project() -> VtlResult<()> {
        let engine = InMemoryProcessingEngine::new();
        let mut from_to = IndexMap::new();
        from_to.insert("age".to_string(), "years".to_string());
        let renamed = engine.execute_rename(people(), from_to)?;
        assert_eq!(renamed.column_names(), vec!["id", "years", "sex"]);

        let projected =
            engine.execute_project(renamed, vec!["years".to_string(), "id".to_string()])?;
        let dataset = projected.resolve(&Bindings::new())?;
        assert_eq!(
            dataset.data_as_lists()[2],
            vec![Value::Integer(12), Value::from("Franck")]
        );
        Ok(())
    }

    #[test]
    fn test_rename_errors() {
        let engine = InMemoryProcessingEngine::new();
        let mut from_to = IndexMap::new();
        from_to.insert("missing".to_string(), "x".to_string());
        assert!(matches!(
            engine.execute_rename(people(), from_to),
            Err(VtlError::UnknownColumn { .. })
        ));

        let mut from_to = IndexMap::new();
        from_to.insert("age".to_string(), "sex".to_string());
        assert!(matches!(
            engine.execute_rename(people(), from_to),
            Err(VtlError::StructureMismatch { .. })
        ));

        assert!(matches!(
            engine.execute_project(people(), vec!["nope".to_string()]),
            Err(VtlError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_union_reorders_columns() -> VtlResult<()> {
        let engine = InMemoryProcessingEngine::new();
        let reordered = engine.execute_project(
            people(),
            vec!["sex".to_string(), "id".to_string(), "age".to_string()],
        )?;
        let result = engine.execute_union(vec![people(), reordered])?;
        let dataset = result.resolve(&Bindings::new())?;
        let original = people().resolve(&Bindings::new())?.data_as_lists();
        let expected: Vec<Vec<Value>> = original.iter().chain(&original).cloned().collect();
        assert_eq!(dataset.column_names(), vec!["id", "age", "sex"]);
        assert_eq!(dataset.data_as_lists(), expected);
        Ok(())
    }

    #[test]
    fn test_union_rejects_incompatible() -> VtlResult<()> {
        let engine = InMemoryProcessingEngine::new();
        let narrow = engine.execute_project(people(), vec!["id".to_string()])?;
        let err = engine.execute_union(vec![people(), people(), narrow]).unwrap_err();
        assert!(err.to_string().contains("position 3"));
        Ok(())
    }

    #[test]
    fn test_aggr_groups_in_first_seen_order() -> VtlResult<()> {
        let engine = InMemoryProcessingEngine::new();
        let input = people();
        let structure = DataStructure::new(vec![
            Component::new("sex", Type::String, Role::Identifier),
            Component::new("total", Type::Integer, Role::Measure),
            Component::new("n", Type::Integer, Role::Measure),
        ])?;
        let mut aggregations = IndexMap::new();
        aggregations.insert(
            "total".to_string(),
            AggregationExpression::new(
                AggregateOperator::Sum,
                Some(TypedExpression::Integer(column::<i64>("age"))),
            )?,
        );
        aggregations.insert(
            "n".to_string(),
            AggregationExpression::new(AggregateOperator::Count, None)?,
        );
        let key = key_by(&["sex".to_string()], input.structure())?;

        let result = engine.execute_aggr(input, structure, aggregations, key)?;
        let dataset = result.resolve(&Bindings::new())?;
        assert_eq!(
            dataset.data_as_lists(),
            vec![
                vec![Value::from("M"), Value::Integer(21), Value::Integer(2)],
                vec![Value::from("F"), Value::Integer(12), Value::Integer(1)],
            ]
        );
        Ok(())
    }

    #[test]
    fn test_global_aggr_over_empty_dataset() -> VtlResult<()> {
        let engine = InMemoryProcessingEngine::new();
        let empty = engine.execute_filter(people(), Expr::constant(Some(false)))?;
        let structure =
            DataStructure::new(vec![Component::new("n", Type::Integer, Role::Measure)])?;
        let mut aggregations = IndexMap::new();
        aggregations.insert(
            "n".to_string(),
            AggregationExpression::new(AggregateOperator::Count, None)?,
        );
        let key: KeyExtractor = Arc::new(|_: &DataPoint| Vec::new());
        let result = engine.execute_aggr(empty, structure, aggregations, key)?;
        let dataset = result.resolve(&Bindings::new())?;
        assert_eq!(dataset.data_as_lists(), vec![vec![Value::Integer(0)]]);
        Ok(())
    }
}
