use crate::engine::key_by;
use crate::error::{VtlError, VtlResult};
use crate::expression::type_checking::{assert_boolean, assert_dataset};
use crate::expression::{AggregationExpression, DatasetExpression, TypedExpression};
use crate::model::{Component, DataStructure, Role};
use crate::syntax::{AggregateItem, CalcItem, Clause, Node, RenameItem};
use crate::visitor::ExpressionVisitor;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Dataset clauses: `ds[calc ...]`, `ds[filter ...]`, `ds[rename ...]`,
/// `ds[keep ...]`, `ds[drop ...]` and `ds[aggr ... group by ...]`.
///
/// Component expressions are visited with the dataset's structure as scope
/// and resolved once per row.
pub struct ClauseVisitor<'v, 'a> {
    visitor: &'v ExpressionVisitor<'a>,
}

impl<'v, 'a> ClauseVisitor<'v, 'a> {
    pub fn new(visitor: &'v ExpressionVisitor<'a>) -> Self {
        Self { visitor }
    }

    pub fn visit_clause(&self, dataset: &Node, clause: &Clause) -> VtlResult<TypedExpression> {
        let input = assert_dataset(self.visitor.visit(dataset)?, dataset)?;
        let result = match clause {
            Clause::Calc(items) => self.visit_calc(input, items)?,
            Clause::Filter(predicate) => self.visit_filter(input, predicate)?,
            Clause::Rename(items) => self.visit_rename(input, items)?,
            Clause::Keep(names) => self.visitor.engine().execute_project(input, names.clone())?,
            Clause::Drop(names) => self.visit_drop(input, names)?,
            Clause::Aggregate { items, group_by } => self.visit_aggr(input, items, group_by)?,
        };
        Ok(TypedExpression::Dataset(result))
    }

    fn visit_calc(&self, input: DatasetExpression, items: &[CalcItem]) -> VtlResult<DatasetExpression> {
        let structure = input.structure().clone();
        let components = self.visitor.with_scope(&*structure);

        let mut expressions = IndexMap::new();
        let mut roles = HashMap::new();
        for item in items {
            let mut expression = components.visit(&item.expression)?;
            if expression.static_type().is_none() {
                // NULL takes the type of the column it replaces
                let existing = structure.get(&item.name).ok_or_else(|| {
                    VtlError::type_mismatch(
                        "a typed expression",
                        "Null",
                        format!("calc {} := {}", item.name, item.expression),
                        item.expression.position,
                    )
                })?;
                expression = TypedExpression::typed_null(existing.data_type())?;
            }
            if expressions.insert(item.name.clone(), expression).is_some() {
                return Err(VtlError::structure_mismatch(format!(
                    "'{}' is calculated more than once",
                    item.name
                )));
            }
            if let Some(role) = item.role {
                roles.insert(item.name.clone(), role);
            }
        }
        self.visitor.engine().execute_calc(input, expressions, roles)
    }

    fn visit_filter(&self, input: DatasetExpression, predicate: &Node) -> VtlResult<DatasetExpression> {
        let structure = input.structure().clone();
        let components = self.visitor.with_scope(&*structure);
        let predicate_expr = assert_boolean(components.visit(predicate)?, predicate)?;
        self.visitor.engine().execute_filter(input, predicate_expr)
    }

    fn visit_rename(&self, input: DatasetExpression, items: &[RenameItem]) -> VtlResult<DatasetExpression> {
        let mut from_to = IndexMap::new();
        for item in items {
            if from_to.insert(item.from.clone(), item.to.clone()).is_some() {
                return Err(VtlError::structure_mismatch(format!(
                    "'{}' is renamed more than once",
                    item.from
                )));
            }
        }
        self.visitor.engine().execute_rename(input, from_to)
    }

    fn visit_drop(&self, input: DatasetExpression, names: &[String]) -> VtlResult<DatasetExpression> {
        let structure = input.structure().clone();
        if let Some(missing) = names.iter().find(|name| !structure.contains(name)) {
            return Err(VtlError::unknown_column(missing.clone()));
        }
        let kept = structure
            .names()
            .filter(|name| !names.iter().any(|dropped| dropped == name))
            .map(str::to_string)
            .collect();
        self.visitor.engine().execute_project(input, kept)
    }

    fn visit_aggr(
        &self,
        input: DatasetExpression,
        items: &[AggregateItem],
        group_by: &[String],
    ) -> VtlResult<DatasetExpression> {
        let structure = input.structure().clone();
        let components = self.visitor.with_scope(&*structure);

        let mut result = Vec::with_capacity(group_by.len() + items.len());
        for name in group_by {
            let component = structure
                .get(name)
                .ok_or_else(|| VtlError::unknown_column(name.clone()))?;
            result.push(Component::new(name.clone(), component.data_type(), Role::Identifier));
        }

        let mut aggregations = IndexMap::new();
        for item in items {
            let operand = item
                .operand
                .as_ref()
                .map(|node| components.visit(node))
                .transpose()?;
            let position = item.operand.as_ref().and_then(|node| node.position);
            let aggregation =
                AggregationExpression::new(item.function, operand).map_err(|err| err.at(position))?;
            result.push(Component::new(
                item.name.clone(),
                aggregation.data_type(),
                item.role.unwrap_or(Role::Measure),
            ));
            aggregations.insert(item.name.clone(), aggregation);
        }

        let result = DataStructure::new(result)?;
        let key_extractor = key_by(group_by, &structure)?;
        self.visitor
            .engine()
            .execute_aggr(input, result, aggregations, key_extractor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::InMemoryProcessingEngine;
    use crate::model::{Bindings, Dataset, Structured, Type, Value};
    use crate::syntax::{AggregateOperator, ComparisonOperator};

    fn bindings() -> Bindings {
        let structure = DataStructure::new(vec![
            Component::new("name", Type::String, Role::Identifier),
            Component::new("age", Type::Integer, Role::Measure),
            Component::new("weight", Type::Integer, Role::Measure),
            Component::new("category", Type::String, Role::Attribute),
        ])
        .unwrap();
        let dataset = Dataset::new(
            structure,
            vec![
                vec![Value::from("Toto"), Value::Integer(30), Value::Integer(12), Value::from("A")],
                vec![Value::from("Hadrien"), Value::Integer(40), Value::Integer(1), Value::from("B")],
                vec![Value::from("Nico"), Value::Integer(50), Value::Integer(2), Value::from("A")],
            ],
        )
        .unwrap();
        let mut bindings = Bindings::new();
        bindings.insert("ds".to_string(), dataset.into());
        bindings
    }

    fn run(clause: Clause) -> VtlResult<DatasetExpression> {
        let bindings = bindings();
        let engine = InMemoryProcessingEngine::new();
        let node = Node::clause(Node::var("ds"), clause);
        match ExpressionVisitor::new(&bindings, &engine).visit(&node)? {
            TypedExpression::Dataset(dataset) => Ok(dataset),
            other => panic!("expected a dataset, got {:?}", other),
        }
    }

    #[test]
    fn test_calc() -> VtlResult<()> {
        let result = run(Clause::Calc(vec![
            CalcItem {
                name: "old".to_string(),
                role: None,
                expression: Node::compare(ComparisonOperator::Gt, Node::var("age"), Node::integer(35)),
            },
            CalcItem {
                name: "weight".to_string(),
                role: None,
                expression: Node::null(),
            },
        ]))?;
        assert_eq!(result.column_names(), vec!["name", "age", "weight", "category", "old"]);
        let rows = result.resolve(&bindings())?.data_as_maps();
        assert_eq!(rows[0]["old"], Value::Boolean(false));
        assert_eq!(rows[1]["old"], Value::Boolean(true));
        assert_eq!(rows[1]["weight"], Value::Null);
        Ok(())
    }

    #[test]
    fn test_filter_keep_drop() -> VtlResult<()> {
        let filtered = run(Clause::Filter(Box::new(Node::compare(
            ComparisonOperator::Eq,
            Node::var("category"),
            Node::string("A"),
        ))))?;
        assert_eq!(filtered.resolve(&bindings())?.len(), 2);

        let kept = run(Clause::Keep(vec!["age".to_string(), "name".to_string()]))?;
        assert_eq!(kept.column_names(), vec!["age", "name"]);

        let dropped = run(Clause::Drop(vec!["weight".to_string()]))?;
        assert_eq!(dropped.column_names(), vec!["name", "age", "category"]);

        assert!(matches!(
            run(Clause::Drop(vec!["height".to_string()])),
            Err(VtlError::UnknownColumn { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_filter_unknown_component() {
        let result = run(Clause::Filter(Box::new(Node::var("height"))));
        assert!(matches!(result, Err(VtlError::ResolutionFailure { .. })));
    }

    #[test]
    fn test_rename() -> VtlResult<()> {
        let renamed = run(Clause::Rename(vec![RenameItem {
            from: "age".to_string(),
            to: "years".to_string(),
        }]))?;
        assert_eq!(renamed.column_names(), vec!["name", "years", "weight", "category"]);
        Ok(())
    }

    #[test]
    fn test_aggr_group_by() -> VtlResult<()> {
        let result = run(Clause::Aggregate {
            items: vec![
                AggregateItem {
                    name: "sumAge".to_string(),
                    role: None,
                    function: AggregateOperator::Sum,
                    operand: Some(Node::var("age")),
                },
                AggregateItem {
                    name: "avgWeight".to_string(),
                    role: None,
                    function: AggregateOperator::Avg,
                    operand: Some(Node::var("weight")),
                },
                AggregateItem {
                    name: "count".to_string(),
                    role: None,
                    function: AggregateOperator::Count,
                    operand: None,
                },
            ],
            group_by: vec!["category".to_string()],
        })?;
        assert_eq!(result.column_names(), vec!["category", "sumAge", "avgWeight", "count"]);
        let rows = result.resolve(&bindings())?.data_as_lists();
        assert_eq!(
            rows,
            vec![
                vec![Value::from("A"), Value::Integer(80), Value::Number(7.0), Value::Integer(2)],
                vec![Value::from("B"), Value::Integer(40), Value::Number(1.0), Value::Integer(1)],
            ]
        );
        Ok(())
    }

    #[test]
    fn test_aggr_rejects_non_numeric_sum() {
        let result = run(Clause::Aggregate {
            items: vec![AggregateItem {
                name: "s".to_string(),
                role: None,
                function: AggregateOperator::Sum,
                operand: Some(Node::var("name")),
            }],
            group_by: vec![],
        });
        assert!(matches!(result, Err(VtlError::TypeMismatch { .. })));
    }
}
