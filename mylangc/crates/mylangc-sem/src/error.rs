//! Semantic analysis error type.
//!
//! Every variant is fatal: analysis stops at the first one raised.

use mylangc_ast::Type;
use mylangc_util::{Diagnostic, Span, ToDiagnostic};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SemaError {
    #[error("undeclared name `{name}` at {span:?}")]
    Undeclared { name: String, span: Span },

    #[error("`{name}` is already declared in this scope, at {span:?}")]
    Redeclaration { name: String, span: Span },

    #[error("type mismatch: expected {expected}, found {found}, at {span:?}")]
    TypeMismatch {
        expected: Type,
        found: Type,
        span: Span,
    },

    #[error("comparison type mismatch: {left} vs {right}, at {span:?}")]
    ComparisonTypeMismatch {
        left: Type,
        right: Type,
        span: Span,
    },

    #[error("`{name}` expects {expected} argument(s), found {found}, at {span:?}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("duplicate parameter `{name}` in function `{function}`, at {span:?}")]
    DuplicateParameter {
        function: String,
        name: String,
        span: Span,
    },

    #[error("unknown operator `{op}` at {span:?}")]
    UnknownOperator { op: String, span: Span },
}

pub type SemaResult<T> = std::result::Result<T, SemaError>;

impl ToDiagnostic for SemaError {
    fn to_diagnostic(&self) -> Diagnostic {
        match self {
            SemaError::Undeclared { name, span } => {
                Diagnostic::error(format!("undeclared name `{name}`"), *span)
            }
            SemaError::Redeclaration { name, span } => Diagnostic::error(
                format!("`{name}` is already declared in this scope"),
                *span,
            ),
            SemaError::TypeMismatch {
                expected,
                found,
                span,
            } => Diagnostic::error(
                format!("type mismatch: expected {expected}, found {found}"),
                *span,
            ),
            SemaError::ComparisonTypeMismatch { left, right, span } => {
                Diagnostic::error(format!("comparison type mismatch: {left} vs {right}"), *span)
            }
            SemaError::ArityMismatch {
                name,
                expected,
                found,
                span,
            } => Diagnostic::error(
                format!("`{name}` expects {expected} argument(s), found {found}"),
                *span,
            ),
            SemaError::DuplicateParameter {
                function,
                name,
                span,
            } => Diagnostic::error(
                format!("duplicate parameter `{name}` in function `{function}`"),
                *span,
            ),
            SemaError::UnknownOperator { op, span } => {
                Diagnostic::error(format!("unknown operator `{op}`"), *span)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mylangc_util::Severity;

    #[test]
    fn type_mismatch_reports_both_types_at_the_offending_span() {
        let span = Span::new(2, 3);
        let err = SemaError::TypeMismatch {
            expected: Type::Int,
            found: Type::Bool,
            span,
        };
        let diag = err.to_diagnostic();
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.span, span);
        assert!(diag.message.contains("int"));
        assert!(diag.message.contains("bool"));
    }
}
