//! mylangc-par - recursive-descent parser.
//!
//! Builds a [`mylangc_ast::Program`] directly from a token stream; there is
//! no separate concrete syntax tree. `ty` fields on expression nodes are
//! left `None` here and filled in later by `mylangc-sem`.

mod expr;
mod parser;
mod stmt;

pub mod error;

pub use error::{ParseError, ParseResult};
pub use parser::Parser;

use mylangc_ast::Program;
use mylangc_lex::Lexer;

/// Lexes and parses a complete source string in one step.
pub fn parse(source: &str) -> ParseResult<Program> {
    let tokens = Lexer::new(source)
        .tokenize()
        .map_err(|e| ParseError::UnexpectedEof(e.to_string()))?;
    Parser::new(tokens).parse_program()
}
