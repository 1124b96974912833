//! Error types for schema compilation.

use thiserror::Error;

use crate::diagnostics::codes;
use crate::feature::IfFeatureError;
use crate::parser::SyntaxError;

/// Errors that stop a compilation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Malformed path or identifier text.
    #[error("invalid \"{text}\": {error}")]
    Syntax { text: String, error: SyntaxError },

    /// Malformed `if-feature` expression.
    #[error("invalid if-feature \"{text}\": {error}")]
    IfFeature { text: String, error: IfFeatureError },

    /// A name that cannot exist, e.g. behind an unknown prefix.
    #[error("{kind} \"{name}\" not found")]
    NotFound { kind: &'static str, name: String },

    /// Identity, feature or grouping that refers back to itself.
    #[error("circular {kind} reference through \"{name}\"")]
    Cycle { kind: &'static str, name: String },

    /// A name that is already taken at this point of the tree.
    #[error("duplicate {kind} \"{name}\"")]
    Duplicate { kind: &'static str, name: String },

    /// A semantic rule was violated.
    #[error("{0}")]
    Constraint(String),

    /// The XPath evaluator rejected a `must` or `when`.
    #[error("XPath error in \"{expr}\": {message}")]
    XPath { expr: String, message: String },

    /// References left unresolved once the worklist reached a fixed point.
    #[error("{count} reference(s) could not be resolved")]
    Unresolved { count: usize },

    /// The configured sweep limit was hit before a fixed point.
    #[error("resolution did not settle within {limit} sweeps")]
    SweepLimit { limit: usize },
}

impl CompileError {
    pub fn syntax(text: impl Into<String>, error: SyntaxError) -> Self {
        Self::Syntax {
            text: text.into(),
            error,
        }
    }

    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn cycle(kind: &'static str, name: impl Into<String>) -> Self {
        Self::Cycle {
            kind,
            name: name.into(),
        }
    }

    pub fn duplicate(kind: &'static str, name: impl Into<String>) -> Self {
        Self::Duplicate {
            kind,
            name: name.into(),
        }
    }

    pub fn constraint(message: impl Into<String>) -> Self {
        Self::Constraint(message.into())
    }

    /// Diagnostic code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Syntax { .. } | Self::IfFeature { .. } => codes::SYNTAX_ERROR,
            Self::NotFound { .. } => codes::UNDEFINED_REFERENCE,
            Self::Cycle { .. } => codes::CIRCULAR_DEPENDENCY,
            Self::Duplicate { .. } => codes::DUPLICATE_DEFINITION,
            Self::Constraint(_) => codes::CONSTRAINT_VIOLATION,
            Self::XPath { .. } => codes::XPATH_ERROR,
            Self::Unresolved { .. } | Self::SweepLimit { .. } => codes::UNRESOLVED_REFERENCE,
        }
    }
}

pub type Result<T> = std::result::Result<T, CompileError>;
