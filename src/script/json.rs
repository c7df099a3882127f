//! JSON interchange for bindings.
//!
//! Scalars map to JSON scalars. A dataset is an object
//! `{ "structure": [{"name", "type", "role"}], "rows": [{...}] }` where each
//! row maps column names to values; omitted columns are NULL.

use crate::error::{VtlError, VtlResult};
use crate::model::{Bindings, Component, DataPoint, DataStructure, Dataset, Value};
use serde_json::{json, Map, Number};
use std::sync::Arc;

/// Read a bindings object: each member becomes one binding.
pub fn bindings_from_json(json: &serde_json::Value) -> VtlResult<Bindings> {
    let members = json
        .as_object()
        .ok_or_else(|| VtlError::resolution("bindings must be a JSON object"))?;
    members
        .iter()
        .map(|(name, value)| {
            let value = value_from_json(value)
                .map_err(|err| VtlError::resolution(format!("binding '{}': {}", name, err)))?;
            Ok((name.clone(), value))
        })
        .collect()
}

pub fn value_from_json(json: &serde_json::Value) -> VtlResult<Value> {
    match json {
        serde_json::Value::Object(members) if members.contains_key("structure") => {
            dataset_from_json(members).map(Value::from)
        }
        other => scalar_from_json(other),
    }
}

fn scalar_from_json(json: &serde_json::Value) -> VtlResult<Value> {
    match json {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::Bool(b) => Ok(Value::Boolean(*b)),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(Value::Integer(i)),
            None => n
                .as_f64()
                .map(Value::Number)
                .ok_or_else(|| VtlError::resolution(format!("unsupported number {}", n))),
        },
        serde_json::Value::String(s) => Ok(Value::String(s.clone())),
        other => Err(VtlError::resolution(format!("unsupported JSON value {}", other))),
    }
}

fn dataset_from_json(members: &Map<String, serde_json::Value>) -> VtlResult<Dataset> {
    let components: Vec<Component> = members
        .get("structure")
        .cloned()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|err| VtlError::resolution(format!("invalid structure: {}", err)))?
        .unwrap_or_default();
    let structure = Arc::new(DataStructure::new(components)?);

    let rows = match members.get("rows") {
        None => &[][..],
        Some(serde_json::Value::Array(rows)) => rows.as_slice(),
        Some(_) => return Err(VtlError::resolution("dataset rows must be an array")),
    };
    let mut points = Vec::with_capacity(rows.len());
    for row in rows {
        let row = row
            .as_object()
            .ok_or_else(|| VtlError::resolution("dataset row must be a JSON object"))?;
        let mut entries = Vec::with_capacity(row.len());
        for (name, cell) in row {
            let component = structure
                .get(name)
                .ok_or_else(|| VtlError::unknown_column(name.clone()))?;
            entries.push((name.as_str(), scalar_from_json(cell)?.cast_to(component.data_type())?));
        }
        points.push(DataPoint::from_map(structure.clone(), entries)?);
    }
    Ok(Dataset::from_points(structure, points))
}

/// Render a bindings map as a JSON object with sorted keys.
pub fn bindings_to_json(bindings: &Bindings) -> serde_json::Value {
    let mut names: Vec<&String> = bindings.keys().collect();
    names.sort();
    let members = names
        .into_iter()
        .map(|name| (name.clone(), value_to_json(&bindings[name])))
        .collect::<Map<_, _>>();
    serde_json::Value::Object(members)
}

/// Non-finite numbers render as `null`.
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(i) => json!(i),
        Value::Number(n) => Number::from_f64(*n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Boolean(b) => json!(b),
        Value::String(s) => json!(s),
        Value::Dataset(dataset) => {
            let structure: Vec<&Component> = dataset.structure().iter().collect();
            let rows: Vec<serde_json::Value> = dataset
                .points()
                .iter()
                .map(|point| {
                    let cells = point
                        .to_map()
                        .iter()
                        .map(|(name, cell)| (name.clone(), value_to_json(cell)))
                        .collect::<Map<_, _>>();
                    serde_json::Value::Object(cells)
                })
                .collect();
            json!({ "structure": structure, "rows": rows })
        }
    }
}
