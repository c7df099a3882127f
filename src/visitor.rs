//! Visitors translating syntax nodes into typed expressions.
//!
//! [`ExpressionVisitor`] is the dispatcher: it matches the node kind and hands
//! the node to one visitor per syntactic category. Specialised visitors
//! borrow the dispatcher to visit their children, type-check the results and
//! return a new expression capturing them. Visitors hold no state of their
//! own and are created per dispatch.

pub mod arithmetic;
pub mod arithmetic_or_concat;
pub mod boolean;
pub mod clause;
pub mod comparison;
pub mod constant;
pub mod expression;
pub mod functions;
pub mod if_expr;
pub mod unary;
pub mod var_id;

pub use expression::ExpressionVisitor;
