//! Script evaluation.
//!
//! A [`ScriptEngine`] holds the variable bindings of a script and evaluates
//! programs of assignment statements against them. Each statement is built
//! by a fresh [`ExpressionVisitor`] over the current bindings, resolved, and
//! its value bound to the assigned name.

pub mod config;
pub mod json;

pub use config::{EngineKind, ScriptConfig};

use crate::engine::{InMemoryProcessingEngine, ProcessingEngine};
use crate::error::VtlResult;
use crate::model::{Bindings, Value};
use crate::syntax::{Program, Statement};
use crate::visitor::ExpressionVisitor;
use log::{debug, trace};
use parking_lot::RwLock;
use std::sync::Arc;

pub struct ScriptEngine {
    config: ScriptConfig,
    engine: Arc<dyn ProcessingEngine>,
    bindings: RwLock<Bindings>,
}

impl ScriptEngine {
    pub fn new(config: ScriptConfig) -> Self {
        Self::with_bindings(config, Bindings::new())
    }

    pub fn with_bindings(config: ScriptConfig, bindings: Bindings) -> Self {
        let engine: Arc<dyn ProcessingEngine> = match config.engine {
            EngineKind::InMemory => Arc::new(InMemoryProcessingEngine::new()),
        };
        Self {
            config,
            engine,
            bindings: RwLock::new(bindings),
        }
    }

    pub fn config(&self) -> &ScriptConfig {
        &self.config
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.bindings.read().get(name).cloned()
    }

    pub fn put(&self, name: impl Into<String>, value: Value) {
        self.bindings.write().insert(name.into(), value);
    }

    /// Snapshot of the current bindings.
    pub fn bindings(&self) -> Bindings {
        self.bindings.read().clone()
    }

    /// Evaluate `program` against the engine's own bindings and return the
    /// value of the last statement (NULL for an empty program).
    ///
    /// Statements before a failing one stay bound.
    pub fn eval(&self, program: &Program) -> VtlResult<Value> {
        let mut bindings = self.bindings.write();
        self.eval_with(program, &mut bindings)
    }

    /// Evaluate `program` against caller-supplied bindings.
    pub fn eval_with(&self, program: &Program, bindings: &mut Bindings) -> VtlResult<Value> {
        let mut last = Value::Null;
        for statement in &program.statements {
            let Statement::Assignment { name, expression } = statement;
            if self.config.log_statements {
                debug!("{} := {}", name, expression);
            }
            let built = ExpressionVisitor::new(&*bindings, self.engine.as_ref()).visit(expression)?;
            let value = built.resolve(&*bindings)?;
            trace!("{} bound to a {} value", name, value.type_name());
            bindings.insert(name.clone(), value.clone());
            last = value;
        }
        Ok(last)
    }
}

impl Default for ScriptEngine {
    fn default() -> Self {
        Self::new(ScriptConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VtlError;
    use crate::syntax::Node;

    #[test]
    fn test_assignments_chain() -> VtlResult<()> {
        let engine = ScriptEngine::default();
        let program = Program::new(vec![
            Statement::Assignment {
                name: "a".to_string(),
                expression: Node::integer(2),
            },
            Statement::Assignment {
                name: "b".to_string(),
                expression: Node::mul(Node::var("a"), Node::integer(3)),
            },
        ]);
        assert_eq!(engine.eval(&program)?, Value::Integer(6));
        assert_eq!(engine.get("a"), Some(Value::Integer(2)));
        assert_eq!(engine.get("b"), Some(Value::Integer(6)));
        Ok(())
    }

    #[test]
    fn test_assign_null() -> VtlResult<()> {
        let engine = ScriptEngine::default();
        engine.eval(&Program::assign("n", Node::null()))?;
        assert_eq!(engine.get("n"), Some(Value::Null));

        // a null-bound variable still takes part in arithmetic
        let value = engine.eval(&Program::assign("m", Node::mul(Node::var("n"), Node::integer(1))))?;
        assert_eq!(value, Value::Null);
        Ok(())
    }

    #[test]
    fn test_eval_with_external_bindings() -> VtlResult<()> {
        let engine = ScriptEngine::default();
        let mut bindings = Bindings::new();
        bindings.insert("x".to_string(), Value::Number(1.5));
        engine.eval_with(&Program::assign("y", Node::mul(Node::var("x"), Node::integer(2))), &mut bindings)?;
        assert_eq!(bindings["y"], Value::Number(3.0));
        assert_eq!(engine.get("y"), None);
        Ok(())
    }

    #[test]
    fn test_failure_keeps_earlier_statements() {
        let engine = ScriptEngine::default();
        let program = Program::new(vec![
            Statement::Assignment {
                name: "a".to_string(),
                expression: Node::integer(1),
            },
            Statement::Assignment {
                name: "b".to_string(),
                expression: Node::var("missing"),
            },
        ]);
        assert!(matches!(
            engine.eval(&program),
            Err(VtlError::ResolutionFailure { .. })
        ));
        assert_eq!(engine.get("a"), Some(Value::Integer(1)));
        assert_eq!(engine.get("b"), None);
    }
}
