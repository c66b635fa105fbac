//! mylangc-sem - semantic analysis.
//!
//! Walks the parsed [`mylangc_ast::Program`] once in pre-order, enforcing
//! scope/declaration/type rules and filling in the `ty` fields that
//! `mylangc-par` leaves as `None`. Every failure is fatal: analysis stops
//! and reports the first [`SemaError`] it hits.

pub mod analysis;
pub mod error;
pub mod ops;
pub mod scope;

pub use analysis::SemanticAnalyzer;
pub use error::{SemaError, SemaResult};
pub use scope::{Binding, FunctionSig, ScopeTree};

use mylangc_ast::Program;

/// Analyzes `program` in place, annotating it with resolved types.
pub fn analyze(program: &mut Program) -> SemaResult<()> {
    SemanticAnalyzer::new().analyze_program(program)
}
