//! Syntax tree consumed by the interpreter.
//!
//! The parser is an external collaborator: it hands over an immutable tree of
//! [`Node`]s whose kinds carry operator tags, child nodes and literal values.
//! The tree derives serde traits so hosts can ship it as JSON.

pub mod ast;
pub mod operator;

pub use ast::{
    AggregateItem, CalcItem, Clause, JoinOperand, Literal, Node, NodeKind, Position, Program,
    RenameItem, Statement,
};
pub use operator::{
    AdditiveOperator, AggregateOperator, ArithmeticOperator, BooleanOperator,
    ComparisonOperator, FunctionCategory, JoinKind, UnaryOperator,
};
