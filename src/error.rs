//! Error types for expression construction and resolution.

use crate::model::Type;
use crate::syntax::Position;
use std::fmt;
use thiserror::Error;

/// Source location wrapper used in error messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct At(pub Option<Position>);

impl fmt::Display for At {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(position) => write!(f, " at {}", position),
            None => Ok(()),
        }
    }
}

/// Errors raised while building or resolving expressions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VtlError {
    #[error("Type mismatch in {context}: expected {expected}, got {actual}{at}")]
    TypeMismatch {
        expected: String,
        actual: String,
        context: String,
        at: At,
    },

    #[error("Branch types differ in {context}: then is {then_type}, else is {else_type}{at}")]
    BranchTypeMismatch {
        then_type: Type,
        else_type: Type,
        context: String,
        at: At,
    },

    #[error("Structure mismatch: {message}{at}")]
    StructureMismatch { message: String, at: At },

    #[error("Unknown column '{column}'{at}")]
    UnknownColumn { column: String, at: At },

    #[error("Unsupported operator {operator}{at}")]
    UnsupportedOperator { operator: String, at: At },

    #[error("Resolution failure: {message}{at}")]
    ResolutionFailure { message: String, at: At },

    #[error("Function {function} expects {expected} arguments, got {actual}{at}")]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
        at: At,
    },
}

impl VtlError {
    pub fn type_mismatch(
        expected: impl fmt::Display,
        actual: impl fmt::Display,
        context: impl Into<String>,
        position: Option<Position>,
    ) -> Self {
        VtlError::TypeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
            context: context.into(),
            at: At(position),
        }
    }

    pub fn structure_mismatch(message: impl Into<String>) -> Self {
        VtlError::StructureMismatch {
            message: message.into(),
            at: At(None),
        }
    }

    pub fn unknown_column(column: impl Into<String>) -> Self {
        VtlError::UnknownColumn {
            column: column.into(),
            at: At(None),
        }
    }

    pub fn unsupported(operator: impl Into<String>, position: Option<Position>) -> Self {
        VtlError::UnsupportedOperator {
            operator: operator.into(),
            at: At(position),
        }
    }

    pub fn resolution(message: impl Into<String>) -> Self {
        VtlError::ResolutionFailure {
            message: message.into(),
            at: At(None),
        }
    }

    /// Attach a source position unless the error already carries one.
    pub fn at(mut self, position: Option<Position>) -> Self {
        let slot = match &mut self {
            VtlError::TypeMismatch { at, .. }
            | VtlError::BranchTypeMismatch { at, .. }
            | VtlError::StructureMismatch { at, .. }
            | VtlError::UnknownColumn { at, .. }
            | VtlError::UnsupportedOperator { at, .. }
            | VtlError::ResolutionFailure { at, .. }
            | VtlError::ArgumentCount { at, .. } => at,
        };
        if slot.0.is_none() {
            slot.0 = position;
        }
        self
    }

    /// Source position of the offending node, if known.
    pub fn position(&self) -> Option<Position> {
        match self {
            VtlError::TypeMismatch { at, .. }
            | VtlError::BranchTypeMismatch { at, .. }
            | VtlError::StructureMismatch { at, .. }
            | VtlError::UnknownColumn { at, .. }
            | VtlError::UnsupportedOperator { at, .. }
            | VtlError::ResolutionFailure { at, .. }
            | VtlError::ArgumentCount { at, .. } => at.0,
        }
    }
}

/// Result type for interpreter operations.
pub type VtlResult<T> = Result<T, VtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VtlError::type_mismatch(Type::Boolean, Type::Integer, "and", None);
        assert_eq!(
            err.to_string(),
            "Type mismatch in and: expected Boolean, got Integer"
        );

        let err = VtlError::unknown_column("age").at(Some(Position::new(3, 7)));
        assert_eq!(err.to_string(), "Unknown column 'age' at 3:7");

        let err = VtlError::ArgumentCount {
            function: "substr".to_string(),
            expected: "1 to 3".to_string(),
            actual: 4,
            at: At(None),
        };
        assert_eq!(
            err.to_string(),
            "Function substr expects 1 to 3 arguments, got 4"
        );
    }

    #[test]
    fn test_at_keeps_innermost_position() {
        let err = VtlError::resolution("missing")
            .at(Some(Position::new(1, 2)))
            .at(Some(Position::new(5, 5)));
        assert_eq!(err.position(), Some(Position::new(1, 2)));
    }
}
