//! mylangc-ast - the typed Abstract Syntax Tree.
//!
//! This crate holds only data: the fixed tagged node set and the four
//! primitive types. It has no behavior of its own — parsing
//! (`mylangc-par`), checking (`mylangc-sem`), and lowering (`mylangc-ir`)
//! all operate on these types but live in their own crates.

pub mod ast;
pub mod types;

pub use ast::*;
pub use types::Type;
