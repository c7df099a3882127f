//! Dataset processing engines.
//!
//! The interpreter never touches rows itself: dataset-shaped expressions are
//! handed to a [`ProcessingEngine`], which checks the requested operation
//! against the input structures and returns a new [`DatasetExpression`] whose
//! resolver does the row work. Structural errors therefore surface when the
//! operation is requested; row work happens when the result is resolved.

pub mod in_memory;
pub mod join;
pub mod key;

pub use in_memory::InMemoryProcessingEngine;
pub use key::GroupKey;

use crate::error::{VtlError, VtlResult};
use crate::expression::{AggregationExpression, DatasetExpression, Expr, TypedExpression};
use crate::model::{Component, DataPoint, DataStructure, Role, Value};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;

/// Computes the grouping key of a row for `aggr`.
pub type KeyExtractor = Arc<dyn Fn(&DataPoint) -> Vec<Value> + Send + Sync>;

/// Key extractor reading the named columns of `structure`, in order.
pub fn key_by(names: &[String], structure: &DataStructure) -> VtlResult<KeyExtractor> {
    let indexes = names
        .iter()
        .map(|name| {
            structure
                .index_of(name)
                .ok_or_else(|| VtlError::unknown_column(name.clone()))
        })
        .collect::<VtlResult<Vec<_>>>()?;
    Ok(Arc::new(move |point: &DataPoint| {
        indexes
            .iter()
            .map(|&i| point.get_index(i).cloned().unwrap_or(Value::Null))
            .collect()
    }))
}

/// Relational operations over dataset expressions.
pub trait ProcessingEngine: Send + Sync {
    /// Add or replace columns with per-row results.
    ///
    /// New columns take the role given in `roles`, Measure by default.
    /// Replaced columns keep their position.
    fn execute_calc(
        &self,
        dataset: DatasetExpression,
        expressions: IndexMap<String, TypedExpression>,
        roles: HashMap<String, Role>,
    ) -> VtlResult<DatasetExpression>;

    /// Keep the rows for which `predicate` is true.
    fn execute_filter(
        &self,
        dataset: DatasetExpression,
        predicate: Expr<bool>,
    ) -> VtlResult<DatasetExpression>;

    /// Rename columns, `from_to` mapping old names to new names.
    fn execute_rename(
        &self,
        dataset: DatasetExpression,
        from_to: IndexMap<String, String>,
    ) -> VtlResult<DatasetExpression>;

    /// Keep the listed columns, in the listed order.
    fn execute_project(
        &self,
        dataset: DatasetExpression,
        names: Vec<String>,
    ) -> VtlResult<DatasetExpression>;

    /// Concatenate datasets with compatible structures.
    fn execute_union(&self, datasets: Vec<DatasetExpression>) -> VtlResult<DatasetExpression>;

    /// Group rows by `key_extractor` and collect each aggregation per group.
    ///
    /// Output rows conform to `structure`: aggregated columns are taken from
    /// `aggregations`, the others from the first row of the group.
    fn execute_aggr(
        &self,
        dataset: DatasetExpression,
        structure: DataStructure,
        aggregations: IndexMap<String, AggregationExpression>,
        key_extractor: KeyExtractor,
    ) -> VtlResult<DatasetExpression>;

    fn execute_left_join(
        &self,
        datasets: IndexMap<String, DatasetExpression>,
        components: Vec<Component>,
    ) -> VtlResult<DatasetExpression>;

    fn execute_inner_join(
        &self,
        datasets: IndexMap<String, DatasetExpression>,
        components: Vec<Component>,
    ) -> VtlResult<DatasetExpression>;

    fn execute_full_join(
        &self,
        datasets: IndexMap<String, DatasetExpression>,
        components: Vec<Component>,
    ) -> VtlResult<DatasetExpression>;

    fn execute_cross_join(
        &self,
        datasets: IndexMap<String, DatasetExpression>,
        components: Vec<Component>,
    ) -> VtlResult<DatasetExpression>;
}
