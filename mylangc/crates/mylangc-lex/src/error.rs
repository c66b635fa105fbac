//! Lexer error type.

use mylangc_util::{Diagnostic, Span, ToDiagnostic};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LexError {
    #[error("unexpected character {0:?} at {1:?}")]
    UnexpectedChar(char, Span),

    #[error("unterminated string literal at {0:?}")]
    UnterminatedString(Span),

    #[error("invalid numeric literal {0:?} at {1:?}")]
    InvalidNumber(String, Span),
}

pub type LexResult<T> = std::result::Result<T, LexError>;

impl ToDiagnostic for LexError {
    fn to_diagnostic(&self) -> Diagnostic {
        match self {
            LexError::UnexpectedChar(c, span) => {
                Diagnostic::error(format!("unexpected character {c:?}"), *span)
            }
            LexError::UnterminatedString(span) => {
                Diagnostic::error("unterminated string literal", *span)
            }
            LexError::InvalidNumber(text, span) => {
                Diagnostic::error(format!("invalid numeric literal {text:?}"), *span)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mylangc_util::Severity;

    #[test]
    fn unterminated_string_carries_its_span_into_the_diagnostic() {
        let span = Span::new(4, 9);
        let diag = LexError::UnterminatedString(span).to_diagnostic();
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.span, span);
        assert!(diag.message.contains("unterminated string"));
    }
}
