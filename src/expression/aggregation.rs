//! Aggregation expressions for `aggr` clauses.
//!
//! An aggregation pairs an aggregate function with an optional operand
//! expression resolved against each row of a group. NULL operands are skipped
//! by every function; an all-NULL (or empty) group yields NULL, except for
//! COUNT which yields 0.

use crate::error::{VtlError, VtlResult};
use crate::expression::TypedExpression;
use crate::model::{DataPoint, Type, Value};
use crate::syntax::AggregateOperator;
use std::cmp::Ordering;

#[derive(Debug, Clone)]
pub struct AggregationExpression {
    function: AggregateOperator,
    operand: Option<TypedExpression>,
    data_type: Type,
}

impl AggregationExpression {
    /// Type-check `operand` for `function` and compute the output type.
    pub fn new(function: AggregateOperator, operand: Option<TypedExpression>) -> VtlResult<Self> {
        let input_type = operand.as_ref().and_then(TypedExpression::static_type);
        let invalid = |expected: &str| {
            VtlError::type_mismatch(
                expected,
                input_type.map(|t| t.as_str()).unwrap_or("Null"),
                function.as_str(),
                None,
            )
        };

        let data_type = match function {
            AggregateOperator::Count => Type::Integer,
            _ if operand.is_none() => {
                return Err(VtlError::ArgumentCount {
                    function: function.as_str().to_string(),
                    expected: "1".to_string(),
                    actual: 0,
                    at: Default::default(),
                })
            }
            AggregateOperator::Sum => match input_type {
                Some(t) if t.is_numeric() => t,
                None => Type::Integer,
                Some(_) => return Err(invalid("a numeric type")),
            },
            AggregateOperator::Avg => match input_type {
                Some(t) if t.is_numeric() => Type::Number,
                None => Type::Number,
                Some(_) => return Err(invalid("a numeric type")),
            },
            AggregateOperator::Min | AggregateOperator::Max => match input_type {
                Some(Type::Dataset) => return Err(invalid("a scalar type")),
                Some(t) => t,
                None => Type::Integer,
            },
        };

        Ok(Self {
            function,
            operand,
            data_type,
        })
    }

    /// Type of the aggregated value
    pub fn data_type(&self) -> Type {
        self.data_type
    }

    /// Collect the rows of one group into a single value.
    pub fn collect<'a, I>(&self, points: I) -> VtlResult<Value>
    where
        I: IntoIterator<Item = &'a DataPoint>,
    {
        let mut state = AggregateState::new();
        for point in points {
            let value = match &self.operand {
                Some(operand) => operand.resolve(point)?,
                // count() without operand counts rows
                None => Value::Boolean(true),
            };
            state.update(value, self.function);
        }
        Ok(state.finalize(self.function, self.data_type))
    }
}

/// Running state for one aggregate over one group
#[derive(Debug, Clone, Default)]
struct AggregateState {
    count: i64,
    int_sum: Option<i64>,
    real_sum: f64,
    overflowed: bool,
    best: Option<Value>,
}

impl AggregateState {
    fn new() -> Self {
        Self::default()
    }

    fn update(&mut self, value: Value, function: AggregateOperator) {
        if value.is_null() {
            return;
        }
        self.count += 1;
        match function {
            AggregateOperator::Count => {}
            AggregateOperator::Sum | AggregateOperator::Avg => {
                if let Value::Integer(n) = value {
                    match self.int_sum.unwrap_or(0).checked_add(n) {
                        Some(sum) => self.int_sum = Some(sum),
                        None => self.overflowed = true,
                    }
                }
                self.real_sum += value.as_number().unwrap_or(0.0);
            }
            AggregateOperator::Min => {
                if self.best.as_ref().map_or(true, |current| {
                    value.compare(current) == Some(Ordering::Less)
                }) {
                    self.best = Some(value);
                }
            }
            AggregateOperator::Max => {
                if self.best.as_ref().map_or(true, |current| {
                    value.compare(current) == Some(Ordering::Greater)
                }) {
                    self.best = Some(value);
                }
            }
        }
    }

    fn finalize(&self, function: AggregateOperator, data_type: Type) -> Value {
        match function {
            AggregateOperator::Count => Value::Integer(self.count),
            _ if self.count == 0 => Value::Null,
            AggregateOperator::Sum => match data_type {
                Type::Integer if self.overflowed => Value::Null,
                Type::Integer => Value::Integer(self.int_sum.unwrap_or(0)),
                _ => Value::Number(self.real_sum),
            },
            AggregateOperator::Avg => Value::Number(self.real_sum / self.count as f64),
            AggregateOperator::Min | AggregateOperator::Max => {
                self.best.clone().unwrap_or(Value::Null)
            }
        }
    }
}
