//! Parser error type.

use mylangc_util::{Diagnostic, Span, ToDiagnostic};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("expected {expected}, found {found:?} at {span:?}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("unexpected end of input, expected {0}")]
    UnexpectedEof(String),
}

pub type ParseResult<T> = std::result::Result<T, ParseError>;

impl ToDiagnostic for ParseError {
    fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ParseError::UnexpectedToken {
                expected,
                found,
                span,
            } => Diagnostic::error(format!("expected {expected}, found {found:?}"), *span),
            ParseError::UnexpectedEof(expected) => Diagnostic::error(
                format!("unexpected end of input, expected {expected}"),
                Span::DUMMY,
            ),
        }
    }
}
