pub mod engine;
pub mod error;
pub mod expression;
pub mod model;
pub mod script;
pub mod syntax;
pub mod visitor;

pub use error::{VtlError, VtlResult};
pub use script::{ScriptConfig, ScriptEngine};
