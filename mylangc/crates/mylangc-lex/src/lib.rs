//! mylangc-lex - lexical analysis for MyLang source text.
//!
//! Kept deliberately small: a handful of keywords, single- and
//! double-character operators, and three literal kinds.

mod cursor;
pub mod error;
pub mod lexer;
pub mod token;

pub use error::{LexError, LexResult};
pub use lexer::Lexer;
pub use token::{Token, TokenKind};
