//! Optimized IR → NASM text, targeting the Win64 ABI against
//! `printf`/`ExitProcess`.

pub mod asm;
pub mod error;
pub mod types;

pub use asm::generate;
pub use error::{CodegenError, Result};
