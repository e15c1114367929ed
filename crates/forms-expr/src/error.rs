//! Formula error taxonomy.

use std::fmt;

/// Which resource cap a formula ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// Formula text longer than the configured byte length.
    FormulaLength(usize),
    /// Expression nested deeper than allowed.
    Depth(usize),
    /// More expression nodes evaluated than allowed.
    Steps(usize),
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::FormulaLength(max) => write!(f, "formula longer than {} bytes", max),
            Limit::Depth(max) => write!(f, "nesting deeper than {}", max),
            Limit::Steps(max) => write!(f, "more than {} evaluation steps", max),
        }
    }
}

/// Errors produced while parsing or evaluating a formula.
///
/// None of these escape the engine as panics; the coordinator turns them
/// into a per-field derivation error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("syntax error at offset {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("unbound variable: {0}")]
    UnboundVariable(String),

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("{function}() expects {expected} argument(s), got {got}")]
    ArityMismatch {
        function: String,
        expected: usize,
        got: usize,
    },

    #[error("{function}(): {message}")]
    InvalidArgument { function: String, message: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("numeric result is not finite")]
    NonFinite,

    #[error("evaluation limit exceeded: {0}")]
    EvaluationLimitExceeded(Limit),
}

impl EvalError {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            position,
            message: message.into(),
        }
    }

    pub(crate) fn mismatch(message: impl Into<String>) -> Self {
        Self::TypeMismatch(message.into())
    }

    /// Stable snake_case name of the error kind, for logs and JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Syntax { .. } => "syntax_error",
            Self::UnboundVariable(_) => "unbound_variable",
            Self::TypeMismatch(_) => "type_mismatch",
            Self::UnknownFunction(_) => "unknown_function",
            Self::ArityMismatch { .. } => "arity_mismatch",
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::DivisionByZero => "division_by_zero",
            Self::NonFinite => "non_finite",
            Self::EvaluationLimitExceeded(_) => "evaluation_limit_exceeded",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_problem() {
        let e = EvalError::ArityMismatch {
            function: "calculateAge".into(),
            expected: 1,
            got: 2,
        };
        assert_eq!(e.to_string(), "calculateAge() expects 1 argument(s), got 2");
        assert_eq!(
            EvalError::EvaluationLimitExceeded(Limit::Depth(64)).to_string(),
            "evaluation limit exceeded: nesting deeper than 64"
        );
    }

    #[test]
    fn kinds_are_snake_case() {
        assert_eq!(EvalError::UnboundVariable("x".into()).kind(), "unbound_variable");
        assert_eq!(EvalError::syntax(3, "bad").kind(), "syntax_error");
    }
}
