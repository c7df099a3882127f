//! Resolvable expression types.

use crate::error::{VtlError, VtlResult};
use crate::model::{Context, DataStructure, Dataset, Structured, Type, Value};
use crate::syntax::Position;
use std::fmt;
use std::sync::Arc;

/// Rust payload types backing the scalar VTL types.
pub trait Scalar: Clone + Send + Sync + 'static {
    const TYPE: Type;

    /// Extract a payload from a value; NULL maps to `None`.
    fn from_value(value: Value) -> VtlResult<Option<Self>>;

    fn into_value(self) -> Value;
}

fn mismatch<T: Scalar>(value: &Value) -> VtlError {
    VtlError::type_mismatch(T::TYPE, value.type_name(), "resolution", None)
}

impl Scalar for i64 {
    const TYPE: Type = Type::Integer;

    fn from_value(value: Value) -> VtlResult<Option<Self>> {
        match value {
            Value::Null => Ok(None),
            Value::Integer(i) => Ok(Some(i)),
            other => Err(mismatch::<Self>(&other)),
        }
    }

    fn into_value(self) -> Value {
        Value::Integer(self)
    }
}

impl Scalar for f64 {
    const TYPE: Type = Type::Number;

    fn from_value(value: Value) -> VtlResult<Option<Self>> {
        match value {
            Value::Null => Ok(None),
            Value::Number(n) => Ok(Some(n)),
            Value::Integer(i) => Ok(Some(i as f64)),
            other => Err(mismatch::<Self>(&other)),
        }
    }

    fn into_value(self) -> Value {
        Value::Number(self)
    }
}

impl Scalar for bool {
    const TYPE: Type = Type::Boolean;

    fn from_value(value: Value) -> VtlResult<Option<Self>> {
        match value {
            Value::Null => Ok(None),
            Value::Boolean(b) => Ok(Some(b)),
            other => Err(mismatch::<Self>(&other)),
        }
    }

    fn into_value(self) -> Value {
        Value::Boolean(self)
    }
}

impl Scalar for String {
    const TYPE: Type = Type::String;

    fn from_value(value: Value) -> VtlResult<Option<Self>> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            other => Err(mismatch::<Self>(&other)),
        }
    }

    fn into_value(self) -> Value {
        Value::String(self)
    }
}

type Resolver<T> = Arc<dyn Fn(&dyn Context) -> VtlResult<Option<T>> + Send + Sync>;

/// A scalar expression resolving to `Option<T>`, `None` being NULL.
pub struct Expr<T> {
    resolver: Resolver<T>,
}

impl<T> Clone for Expr<T> {
    fn clone(&self) -> Self {
        Self {
            resolver: self.resolver.clone(),
        }
    }
}

impl<T: Scalar> fmt::Debug for Expr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expr<{}>", T::TYPE)
    }
}

impl<T: Scalar> Expr<T> {
    pub fn new<F>(resolver: F) -> Self
    where
        F: Fn(&dyn Context) -> VtlResult<Option<T>> + Send + Sync + 'static,
    {
        Self {
            resolver: Arc::new(resolver),
        }
    }

    pub fn constant(value: Option<T>) -> Self {
        Self::new(move |_| Ok(value.clone()))
    }

    /// Typed NULL
    pub fn null() -> Self {
        Self::new(|_| Ok(None))
    }

    /// Wrap a value-producing closure, checking each value against `T`.
    pub fn from_values<F>(resolver: F) -> Self
    where
        F: Fn(&dyn Context) -> VtlResult<Value> + Send + Sync + 'static,
    {
        Self::new(move |context| T::from_value(resolver(context)?))
    }

    pub fn resolve(&self, context: &dyn Context) -> VtlResult<Option<T>> {
        (self.resolver)(context)
    }

    pub fn resolve_value(&self, context: &dyn Context) -> VtlResult<Value> {
        Ok(self.resolve(context)?.map(T::into_value).unwrap_or(Value::Null))
    }

    /// Pointwise map over non-NULL results; NULL propagates.
    pub fn map<U, F>(self, f: F) -> Expr<U>
    where
        U: Scalar,
        F: Fn(T) -> Option<U> + Send + Sync + 'static,
    {
        Expr::new(move |context| Ok(self.resolve(context)?.and_then(&f)))
    }

    fn located(self, position: Position) -> Self {
        Self::new(move |context| {
            self.resolve(context)
                .map_err(|err| err.at(Some(position)))
        })
    }
}

/// Combine two scalar expressions, propagating NULL from either side.
pub fn zip_with<A, B, U, F>(left: Expr<A>, right: Expr<B>, f: F) -> Expr<U>
where
    A: Scalar,
    B: Scalar,
    U: Scalar,
    F: Fn(A, B) -> Option<U> + Send + Sync + 'static,
{
    Expr::new(move |context| {
        let Some(l) = left.resolve(context)? else {
            return Ok(None);
        };
        let Some(r) = right.resolve(context)? else {
            return Ok(None);
        };
        Ok(f(l, r))
    })
}

type DatasetResolver = Arc<dyn Fn(&dyn Context) -> VtlResult<Arc<Dataset>> + Send + Sync>;

/// An expression resolving to a dataset whose structure is known statically.
#[derive(Clone)]
pub struct DatasetExpression {
    structure: Arc<DataStructure>,
    resolver: DatasetResolver,
}

impl DatasetExpression {
    pub fn new<F>(structure: Arc<DataStructure>, resolver: F) -> Self
    where
        F: Fn(&dyn Context) -> VtlResult<Arc<Dataset>> + Send + Sync + 'static,
    {
        Self {
            structure,
            resolver: Arc::new(resolver),
        }
    }

    pub fn constant(dataset: Arc<Dataset>) -> Self {
        let structure = dataset.structure().clone();
        Self::new(structure, move |_| Ok(dataset.clone()))
    }

    pub fn structure(&self) -> &Arc<DataStructure> {
        &self.structure
    }

    pub fn resolve(&self, context: &dyn Context) -> VtlResult<Arc<Dataset>> {
        (self.resolver)(context)
    }

    fn located(self, position: Position) -> Self {
        let structure = self.structure.clone();
        Self::new(structure, move |context| {
            self.resolve(context)
                .map_err(|err| err.at(Some(position)))
        })
    }
}

impl Structured for DatasetExpression {
    fn data_structure(&self) -> &DataStructure {
        &self.structure
    }
}

impl fmt::Debug for DatasetExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasetExpression")
            .field("columns", &self.column_names())
            .finish()
    }
}

/// A built expression: a static type plus a deferred resolution.
///
/// `Null` is the NULL literal, whose type is only known once it is unified
/// with a neighbouring expression.
#[derive(Debug, Clone)]
pub enum TypedExpression {
    Null,
    Integer(Expr<i64>),
    Number(Expr<f64>),
    Boolean(Expr<bool>),
    String(Expr<String>),
    Dataset(DatasetExpression),
}

impl TypedExpression {
    /// Build a scalar expression of type `data_type` from a value-producing
    /// closure. Values not matching the type fail with `TypeMismatch` at
    /// resolution; integers are accepted for Number.
    pub fn with_type<F>(data_type: Type, resolver: F) -> VtlResult<Self>
    where
        F: Fn(&dyn Context) -> VtlResult<Value> + Send + Sync + 'static,
    {
        match data_type {
            Type::Integer => Ok(TypedExpression::Integer(Expr::from_values(resolver))),
            Type::Number => Ok(TypedExpression::Number(Expr::from_values(resolver))),
            Type::Boolean => Ok(TypedExpression::Boolean(Expr::from_values(resolver))),
            Type::String => Ok(TypedExpression::String(Expr::from_values(resolver))),
            Type::Dataset => Err(VtlError::type_mismatch(
                "a scalar type",
                Type::Dataset,
                "with_type",
                None,
            )),
        }
    }

    /// Like [`TypedExpression::with_type`], handing the target type to the
    /// closure so it can cast its result at resolution time.
    pub fn with_type_casting<F>(data_type: Type, resolver: F) -> VtlResult<Self>
    where
        F: Fn(Type, &dyn Context) -> VtlResult<Value> + Send + Sync + 'static,
    {
        Self::with_type(data_type, move |context| resolver(data_type, context))
    }

    /// A NULL constant carrying `data_type`
    pub fn typed_null(data_type: Type) -> VtlResult<Self> {
        Self::with_type(data_type, |_| Ok(Value::Null))
    }

    /// Wrap a constant value
    pub fn constant(value: Value) -> Self {
        match value {
            Value::Null => TypedExpression::Null,
            Value::Integer(i) => TypedExpression::Integer(Expr::constant(Some(i))),
            Value::Number(n) => TypedExpression::Number(Expr::constant(Some(n))),
            Value::Boolean(b) => TypedExpression::Boolean(Expr::constant(Some(b))),
            Value::String(s) => TypedExpression::String(Expr::constant(Some(s))),
            Value::Dataset(ds) => TypedExpression::Dataset(DatasetExpression::constant(ds)),
        }
    }

    /// Static type; `None` for the NULL literal
    pub fn static_type(&self) -> Option<Type> {
        match self {
            TypedExpression::Null => None,
            TypedExpression::Integer(_) => Some(Type::Integer),
            TypedExpression::Number(_) => Some(Type::Number),
            TypedExpression::Boolean(_) => Some(Type::Boolean),
            TypedExpression::String(_) => Some(Type::String),
            TypedExpression::Dataset(_) => Some(Type::Dataset),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.static_type().map(|t| t.as_str()).unwrap_or("Null")
    }

    pub fn resolve(&self, context: &dyn Context) -> VtlResult<Value> {
        match self {
            TypedExpression::Null => Ok(Value::Null),
            TypedExpression::Integer(expr) => expr.resolve_value(context),
            TypedExpression::Number(expr) => expr.resolve_value(context),
            TypedExpression::Boolean(expr) => expr.resolve_value(context),
            TypedExpression::String(expr) => expr.resolve_value(context),
            TypedExpression::Dataset(expr) => Ok(Value::Dataset(expr.resolve(context)?)),
        }
    }

    /// Attach a source position to errors raised while resolving.
    pub fn located(self, position: Option<Position>) -> Self {
        let Some(position) = position else {
            return self;
        };
        match self {
            TypedExpression::Null => TypedExpression::Null,
            TypedExpression::Integer(expr) => TypedExpression::Integer(expr.located(position)),
            TypedExpression::Number(expr) => TypedExpression::Number(expr.located(position)),
            TypedExpression::Boolean(expr) => TypedExpression::Boolean(expr.located(position)),
            TypedExpression::String(expr) => TypedExpression::String(expr.located(position)),
            TypedExpression::Dataset(expr) => TypedExpression::Dataset(expr.located(position)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Bindings, Component, DataStructure, Role};

    #[test]
    fn test_with_type_checks_values() -> VtlResult<()> {
        let bindings = Bindings::new();

        let expr = TypedExpression::with_type(Type::Integer, |_| Ok(Value::Integer(4)))?;
        assert_eq!(expr.static_type(), Some(Type::Integer));
        assert_eq!(expr.resolve(&bindings)?, Value::Integer(4));

        let expr = TypedExpression::with_type(Type::Number, |_| Ok(Value::Integer(4)))?;
        assert_eq!(expr.resolve(&bindings)?, Value::Number(4.0));

        let expr = TypedExpression::with_type(Type::Boolean, |_| Ok(Value::Null))?;
        assert_eq!(expr.resolve(&bindings)?, Value::Null);

        let expr = TypedExpression::with_type(Type::Boolean, |_| Ok(Value::from("x")))?;
        assert!(matches!(
            expr.resolve(&bindings),
            Err(VtlError::TypeMismatch { .. })
        ));

        assert!(TypedExpression::with_type(Type::Dataset, |_| Ok(Value::Null)).is_err());
        Ok(())
    }

    #[test]
    fn test_with_type_casting_threads_type() -> VtlResult<()> {
        let expr = TypedExpression::with_type_casting(Type::Number, |target, _| {
            Value::Integer(2).cast_to(target)
        })?;
        assert_eq!(expr.resolve(&Bindings::new())?, Value::Number(2.0));
        Ok(())
    }

    #[test]
    fn test_resolution_is_repeatable() -> VtlResult<()> {
        let expr = TypedExpression::Integer(Expr::new(|context| {
            Ok(match context.get_value("x") {
                Some(Value::Integer(i)) => Some(i * 2),
                _ => None,
            })
        }));

        let mut first = Bindings::new();
        first.insert("x".to_string(), Value::Integer(2));
        let mut second = Bindings::new();
        second.insert("x".to_string(), Value::Integer(5));

        assert_eq!(expr.resolve(&first)?, Value::Integer(4));
        assert_eq!(expr.resolve(&second)?, Value::Integer(10));
        assert_eq!(expr.resolve(&first)?, Value::Integer(4));
        Ok(())
    }

    #[test]
    fn test_located_errors() {
        let expr = TypedExpression::Boolean(Expr::new(|_| Err(VtlError::resolution("boom"))))
            .located(Some(Position::new(2, 4)));
        let err = expr.resolve(&Bindings::new()).unwrap_err();
        assert_eq!(err.position(), Some(Position::new(2, 4)));
    }

    #[test]
    fn test_zip_with_propagates_null() -> VtlResult<()> {
        let sum = zip_with(Expr::constant(Some(1i64)), Expr::<i64>::null(), |a, b| {
            Some(a + b)
        });
        assert_eq!(sum.resolve(&Bindings::new())?, None);
        Ok(())
    }

    #[test]
    fn test_dataset_constant() -> VtlResult<()> {
        let structure = DataStructure::new(vec![Component::new(
            "id",
            Type::Integer,
            Role::Identifier,
        )])?;
        let dataset = Arc::new(Dataset::new(structure, vec![vec![Value::Integer(1)]])?);
        let expr = TypedExpression::constant(Value::Dataset(dataset.clone()));
        assert_eq!(expr.static_type(), Some(Type::Dataset));
        assert_eq!(expr.resolve(&Bindings::new())?, Value::Dataset(dataset));
        Ok(())
    }
}
