//! Operator tags carried by syntax nodes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BooleanOperator {
    And,
    Or,
    Xor,
}

impl BooleanOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            BooleanOperator::And => "and",
            BooleanOperator::Or => "or",
            BooleanOperator::Xor => "xor",
        }
    }
}

/// Multiplicative operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArithmeticOperator {
    Mul,
    Div,
}

impl ArithmeticOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArithmeticOperator::Mul => "*",
            ArithmeticOperator::Div => "/",
        }
    }
}

/// Additive operators and string concatenation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdditiveOperator {
    Plus,
    Minus,
    Concat,
}

impl AdditiveOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdditiveOperator::Plus => "+",
            AdditiveOperator::Minus => "-",
            AdditiveOperator::Concat => "||",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    Plus,
    Minus,
    Not,
}

impl UnaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOperator::Plus => "+",
            UnaryOperator::Minus => "-",
            UnaryOperator::Not => "not ",
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOperator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl ComparisonOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOperator::Eq => "=",
            ComparisonOperator::Ne => "<>",
            ComparisonOperator::Lt => "<",
            ComparisonOperator::Le => "<=",
            ComparisonOperator::Gt => ">",
            ComparisonOperator::Ge => ">=",
        }
    }
}

/// Families of built-in functions, each handled by its own visitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionCategory {
    String,
    Numeric,
    Comparison,
    Set,
    Distance,
}

/// Join flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinKind {
    Left,
    Inner,
    Full,
    Cross,
}

impl JoinKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinKind::Left => "left_join",
            JoinKind::Inner => "inner_join",
            JoinKind::Full => "full_join",
            JoinKind::Cross => "cross_join",
        }
    }
}

/// Aggregate functions usable in an `aggr` clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregateOperator {
    /// Counts non-NULL values, or rows when there is no operand
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateOperator::Count => "count",
            AggregateOperator::Sum => "sum",
            AggregateOperator::Avg => "avg",
            AggregateOperator::Min => "min",
            AggregateOperator::Max => "max",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(
    BooleanOperator,
    ArithmeticOperator,
    AdditiveOperator,
    UnaryOperator,
    ComparisonOperator,
    JoinKind,
    AggregateOperator
);
