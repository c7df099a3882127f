//! Typed, lazily resolved expressions.
//!
//! This module provides:
//! - The closed [`TypedExpression`] union and its scalar/dataset payloads
//! - Construction helpers that check values against a static type
//! - Type checking and coercion utilities shared by the visitors
//! - Aggregation expressions used by `aggr` clauses

pub mod aggregation;
pub mod resolvable;
pub mod type_checking;

pub use aggregation::AggregationExpression;
pub use resolvable::{DatasetExpression, Expr, Scalar, TypedExpression};
pub use type_checking::NumericExpr;
