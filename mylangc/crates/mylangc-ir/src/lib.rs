//! Three-address-code IR: generation from a type-checked AST, and the
//! optimizer passes that clean it up before handing it to the NASM
//! backend.

pub mod generator;
pub mod ir;
pub mod optimize;

pub use generator::generate;
pub use ir::{is_temp, Instr};
pub use optimize::optimize;
