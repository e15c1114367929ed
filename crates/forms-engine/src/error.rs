//! Error types for dependency resolution and derivation.

use forms_expr::EvalError;

/// Why a derived field cannot be scheduled for evaluation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("field {field} references unknown parent {parent}")]
    DanglingReference { field: String, parent: String },

    #[error("field {field} cannot use {parent} as a parent: {reason}")]
    InvalidParent {
        field: String,
        parent: String,
        reason: String,
    },

    #[error("field {field}: parents {} all bind the variable '{name}'", .parents.join(", "))]
    DuplicateVariableName {
        field: String,
        name: String,
        parents: Vec<String>,
    },

    #[error("cyclic dependency between {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    #[error("field {field} is derived but has no derived configuration")]
    MissingDerivedConfig { field: String },

    #[error("field {field} depends on {parent}, which could not be computed")]
    UpstreamFailed { field: String, parent: String },
}

impl ResolveError {
    /// True for problems with a single parent reference, whether the parent
    /// is missing or not allowed.
    pub fn is_invalid_parent(&self) -> bool {
        matches!(self, Self::DanglingReference { .. } | Self::InvalidParent { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::DanglingReference { .. } => "dangling_reference",
            Self::InvalidParent { .. } => "invalid_parent",
            Self::DuplicateVariableName { .. } => "duplicate_variable_name",
            Self::CyclicDependency { .. } => "cyclic_dependency",
            Self::MissingDerivedConfig { .. } => "missing_derived_config",
            Self::UpstreamFailed { .. } => "upstream_failed",
        }
    }
}

/// Why a derived field shows the error sentinel instead of a value.
///
/// Kept apart from validation errors: these never block submission.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DerivationError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("formula failed: {0}")]
    Eval(#[from] EvalError),
}

impl DerivationError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Resolve(e) => e.kind(),
            Self::Eval(e) => e.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_message_lists_members() {
        let e = ResolveError::CyclicDependency {
            cycle: vec!["a".into(), "b".into()],
        };
        assert_eq!(e.to_string(), "cyclic dependency between a -> b");
        assert!(!e.is_invalid_parent());
    }

    #[test]
    fn derivation_kind_passes_through() {
        let e = DerivationError::from(EvalError::DivisionByZero);
        assert_eq!(e.kind(), "division_by_zero");
        assert_eq!(e.to_string(), "formula failed: division by zero");

        let e = DerivationError::from(ResolveError::DanglingReference {
            field: "d".into(),
            parent: "x".into(),
        });
        assert_eq!(e.kind(), "dangling_reference");
    }
}
