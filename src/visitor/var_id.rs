use crate::error::{VtlError, VtlResult};
use crate::expression::{DatasetExpression, TypedExpression};
use crate::model::{DataPoint, DataStructure, Dataset, Declaration, Scope, Type, Value};
use std::sync::Arc;

/// Bring a bound dataset into the column order of its declared structure.
///
/// A dataset whose components differ from the declaration fails with
/// `TypeMismatch`.
fn conform(name: &str, dataset: &Arc<Dataset>, declared: &Arc<DataStructure>) -> VtlResult<Arc<Dataset>> {
    let actual = dataset.structure();
    if !actual.is_compatible_with(declared) {
        return Err(VtlError::type_mismatch(
            format!("{:?}", declared.names().collect::<Vec<_>>()),
            format!("{:?}", actual.names().collect::<Vec<_>>()),
            name,
            None,
        ));
    }
    if actual.names().eq(declared.names()) {
        return Ok(dataset.clone());
    }
    let points = dataset
        .points()
        .iter()
        .map(|point| {
            DataPoint::from_map(
                declared.clone(),
                point.to_map().into_iter(),
            )
        })
        .collect::<VtlResult<Vec<_>>>()?;
    Ok(Arc::new(Dataset::from_points(declared.clone(), points)))
}

/// Variable references.
///
/// The static type comes from the construction scope; the value is re-read
/// from the resolution context every time.
pub struct VarIdVisitor<'a> {
    scope: &'a dyn Scope,
}

impl<'a> VarIdVisitor<'a> {
    pub fn new(scope: &'a dyn Scope) -> Self {
        Self { scope }
    }

    pub fn visit_var_id(&self, name: &str) -> VtlResult<TypedExpression> {
        let declaration = self
            .scope
            .declaration(name)
            .ok_or_else(|| VtlError::resolution(format!("unknown variable '{}'", name)))?;
        let name = name.to_string();

        match declaration {
            // Without a static type there is nothing to re-read into: the
            // reference stays the NULL literal whatever the resolution context holds.
            Declaration::Null => Ok(TypedExpression::Null),
            Declaration::Scalar(data_type) => {
                TypedExpression::with_type(data_type, move |context| {
                    context.get_value(&name).cloned().ok_or_else(|| {
                        VtlError::resolution(format!("variable '{}' is not bound", name))
                    })
                })
            }
            Declaration::Dataset(structure) => {
                let declared = structure.clone();
                Ok(TypedExpression::Dataset(DatasetExpression::new(
                    structure,
                    move |context| match context.get_value(&name) {
                        Some(Value::Dataset(dataset)) => conform(&name, dataset, &declared),
                        Some(other) => Err(VtlError::type_mismatch(
                            Type::Dataset,
                            other.type_name(),
                            name.as_str(),
                            None,
                        )),
                        None => Err(VtlError::resolution(format!(
                            "variable '{}' is not bound",
                            name
                        ))),
                    },
                )))
            }
        }
    }
}
