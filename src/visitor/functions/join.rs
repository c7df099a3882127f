use crate::error::{VtlError, VtlResult};
use crate::expression::type_checking::assert_dataset;
use crate::expression::{DatasetExpression, TypedExpression};
use crate::model::Component;
use crate::syntax::{JoinKind, JoinOperand, NodeKind};
use crate::visitor::ExpressionVisitor;
use indexmap::IndexMap;

/// `left_join`, `inner_join`, `full_join` and `cross_join`.
///
/// Operands are keyed by alias; an operand without alias is keyed by its
/// variable name. Without a `using` list the join components are the
/// identifiers common to all operands.
pub struct JoinFunctionsVisitor<'v, 'a> {
    visitor: &'v ExpressionVisitor<'a>,
}

impl<'v, 'a> JoinFunctionsVisitor<'v, 'a> {
    pub fn new(visitor: &'v ExpressionVisitor<'a>) -> Self {
        Self { visitor }
    }

    pub fn visit_join(
        &self,
        kind: JoinKind,
        operands: &[JoinOperand],
        using: &[String],
    ) -> VtlResult<TypedExpression> {
        if operands.is_empty() {
            return Err(VtlError::ArgumentCount {
                function: kind.as_str().to_string(),
                expected: "at least 1".to_string(),
                actual: 0,
                at: Default::default(),
            });
        }

        let mut datasets: IndexMap<String, DatasetExpression> = IndexMap::new();
        for operand in operands {
            let node = &operand.dataset;
            let alias = match (&operand.alias, &node.kind) {
                (Some(alias), _) => alias.clone(),
                (None, NodeKind::VarId(name)) => name.clone(),
                (None, _) => node.to_string(),
            };
            let dataset = assert_dataset(self.visitor.visit(node)?, node)?;
            if datasets.insert(alias.clone(), dataset).is_some() {
                return Err(VtlError::structure_mismatch(format!(
                    "alias '{}' is used more than once",
                    alias
                ))
                .at(node.position));
            }
        }

        let components = match kind {
            JoinKind::Cross => Vec::new(),
            _ => join_components(&datasets, using)?,
        };

        let engine = self.visitor.engine();
        let result = match kind {
            JoinKind::Left => engine.execute_left_join(datasets, components),
            JoinKind::Inner => engine.execute_inner_join(datasets, components),
            JoinKind::Full => engine.execute_full_join(datasets, components),
            JoinKind::Cross => engine.execute_cross_join(datasets, components),
        }?;
        Ok(TypedExpression::Dataset(result))
    }
}

fn join_components(
    datasets: &IndexMap<String, DatasetExpression>,
    using: &[String],
) -> VtlResult<Vec<Component>> {
    let Some((_, first)) = datasets.first() else {
        return Ok(Vec::new());
    };
    if using.is_empty() {
        return Ok(first
            .structure()
            .identifiers()
            .into_iter()
            .filter(|identifier| {
                datasets
                    .values()
                    .all(|dataset| dataset.structure().get(identifier.name()) == Some(*identifier))
            })
            .cloned()
            .collect());
    }
    using
        .iter()
        .map(|name| {
            first
                .structure()
                .get(name)
                .cloned()
                .ok_or_else(|| VtlError::unknown_column(name.clone()))
        })
        .collect()
}
