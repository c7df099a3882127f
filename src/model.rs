//! Structured data model shared by the interpreter and the processing engines.
//!
//! This module provides:
//! - Scalar types, column roles and runtime values
//! - Components, data structures and data points
//! - In-memory datasets
//! - Lookup traits for construction-time scopes and resolution-time contexts

pub mod context;
pub mod dataset;
pub mod structure;
pub mod types;
pub mod value;

pub use context::{Bindings, Context, Declaration, Scope};
pub use dataset::Dataset;
pub use structure::{Component, DataPoint, DataStructure, Structured};
pub use types::{Role, Type};
pub use value::Value;
