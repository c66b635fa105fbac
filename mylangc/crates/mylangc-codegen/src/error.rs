//! Error types for NASM code generation.
//!
//! IR generation and code generation should never fail on a semantically
//! valid AST; every variant here corresponds to IR the optimizer and
//! generator are not supposed to be able to produce. Surfacing them as an
//! error rather than panicking matches the rest of the pipeline's policy of
//! never panicking on bad input.

use mylangc_util::{Diagnostic, Span, ToDiagnostic};
use thiserror::Error;

/// Error type for NASM code generation.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// A `FunctionStart` with no matching `FunctionEnd` of the same name.
    #[error("function '{0}' has no matching FunctionEnd")]
    UnterminatedFunction(String),

    /// A binary operator reached a lowering arm that doesn't handle it.
    #[error("unsupported operator in IR: {0}")]
    UnknownOperator(String),

    /// Any other condition that should be unreachable given a valid IR.
    #[error("internal codegen error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, CodegenError>;

impl ToDiagnostic for CodegenError {
    /// IR carries no source spans past semantic analysis, so every codegen
    /// diagnostic points at [`Span::DUMMY`] rather than a location in the
    /// original source.
    fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.to_string(), Span::DUMMY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mylangc_util::Severity;

    #[test]
    fn unterminated_function_reports_its_name_at_a_dummy_span() {
        let diag = CodegenError::UnterminatedFunction("add".to_string()).to_diagnostic();
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.span, Span::DUMMY);
        assert!(diag.message.contains("add"));
    }
}
