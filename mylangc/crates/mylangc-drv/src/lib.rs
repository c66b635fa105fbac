//! mylangc-drv - compiler driver.
//!
//! Owns argument parsing, logging setup, and orchestration of the pipeline
//! every other crate implements one stage of: source text → [`mylangc_par`]
//! → [`mylangc_sem`] → [`mylangc_ir`] → [`mylangc_codegen`] → NASM text on
//! disk. Each stage's error type carries through via [`DriverError`] so the
//! first failure anywhere in the pipeline is what the user sees.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mylangc_util::{DiagnosticHandler, ToDiagnostic};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// `mylangc` - ahead-of-time compiler for MyLang, emitting Win64 NASM.
#[derive(Parser, Debug)]
#[command(name = "mylangc")]
#[command(author = "MyLang Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Ahead-of-time compiler for MyLang", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile a source file to NASM assembly.
    Compile(CompileArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct CompileArgs {
    /// MyLang source file.
    pub input: PathBuf,

    /// Path to write the generated NASM source to.
    pub output: PathBuf,

    /// Skip the IR optimizer passes.
    #[arg(long)]
    pub no_optimize: bool,

    /// Print the generated IR to stdout before code generation.
    #[arg(long)]
    pub emit_ir: bool,

    /// Log each pipeline phase as it runs.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Resolved compiler configuration for one invocation.
#[derive(Debug, Clone)]
pub struct Config {
    pub input: PathBuf,
    pub output: PathBuf,
    pub optimize: bool,
    pub emit_ir: bool,
    pub verbose: bool,
}

impl From<CompileArgs> for Config {
    fn from(args: CompileArgs) -> Self {
        Self {
            input: args.input,
            output: args.output,
            optimize: !args.no_optimize,
            emit_ir: args.emit_ir,
            verbose: args.verbose,
        }
    }
}

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(#[from] mylangc_par::ParseError),

    #[error("semantic error: {0}")]
    Sema(#[from] mylangc_sem::SemaError),

    #[error("codegen error: {0}")]
    Codegen(#[from] mylangc_codegen::CodegenError),
}

pub type Result<T> = std::result::Result<T, DriverError>;

/// A single compile invocation: one input file, one output file.
pub struct Session {
    pub config: Config,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Runs the full pipeline and writes NASM source to `config.output`.
    ///
    /// Every stage's error is first rendered through a shared
    /// [`DiagnosticHandler`] (so the eventual log line looks the same
    /// regardless of which stage failed) before being wrapped in the
    /// stage-specific [`DriverError`] variant the caller matches on.
    pub fn compile(&self) -> Result<()> {
        let mut diagnostics = DiagnosticHandler::new();

        tracing::info!(input = %self.config.input.display(), "reading source");
        let source = std::fs::read_to_string(&self.config.input).map_err(|source| DriverError::Read {
            path: self.config.input.clone(),
            source,
        })?;

        tracing::debug!("parsing");
        let mut program = match mylangc_par::parse(&source) {
            Ok(program) => program,
            Err(err) => return Err(self.report(&mut diagnostics, err)),
        };

        tracing::debug!("running semantic analysis");
        if let Err(err) = mylangc_sem::analyze(&mut program) {
            return Err(self.report(&mut diagnostics, err));
        }

        tracing::debug!("lowering to IR");
        let ir = mylangc_ir::generate(&program);
        let ir = if self.config.optimize {
            tracing::debug!("optimizing IR");
            mylangc_ir::optimize(ir)
        } else {
            ir
        };

        if self.config.emit_ir {
            for instr in &ir {
                println!("{instr}");
            }
        }

        tracing::debug!("generating NASM");
        let asm = match mylangc_codegen::generate(&ir) {
            Ok(asm) => asm,
            Err(err) => return Err(self.report(&mut diagnostics, err)),
        };

        std::fs::write(&self.config.output, asm).map_err(|source| DriverError::Write {
            path: self.config.output.clone(),
            source,
        })?;
        tracing::info!(output = %self.config.output.display(), "wrote NASM source");

        Ok(())
    }

    /// Records `err` in `diagnostics` and logs it before handing back the
    /// typed error the caller ultimately sees.
    fn report<E>(&self, diagnostics: &mut DiagnosticHandler, err: E) -> DriverError
    where
        E: ToDiagnostic,
        DriverError: From<E>,
    {
        diagnostics.emit(err.to_diagnostic());
        if let Some(diag) = diagnostics.first_error() {
            tracing::error!("{diag}");
        }
        DriverError::from(err)
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .without_time()
        .try_init();
}

/// Parses arguments, wires up logging, and runs one compilation.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let Commands::Compile(args) = cli.command;
    init_tracing(args.verbose);

    let config = Config::from(args);
    let session = Session::new(config);
    session.compile()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_source(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn compiles_a_simple_program_to_a_nasm_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_source(&dir, "main.ml", "let x:int = 1; print(x);");
        let output = dir.path().join("main.asm");

        let session = Session::new(Config {
            input,
            output: output.clone(),
            optimize: true,
            emit_ir: false,
            verbose: false,
        });
        session.compile().expect("compilation should succeed");

        let asm = std::fs::read_to_string(&output).unwrap();
        assert!(asm.contains("section .data"));
        assert!(asm.contains("global main"));
        assert!(asm.contains("call ExitProcess"));
    }

    #[test]
    fn a_semantic_error_is_reported_instead_of_writing_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_source(&dir, "main.ml", "print(y);");
        let output = dir.path().join("main.asm");

        let session = Session::new(Config {
            input,
            output: output.clone(),
            optimize: true,
            emit_ir: false,
            verbose: false,
        });
        let err = session.compile().expect_err("undeclared name should fail");
        assert!(matches!(err, DriverError::Sema(_)));
        assert!(!output.exists());
    }

    #[test]
    fn a_missing_input_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new(Config {
            input: dir.path().join("missing.ml"),
            output: dir.path().join("missing.asm"),
            optimize: true,
            emit_ir: false,
            verbose: false,
        });
        assert!(matches!(session.compile(), Err(DriverError::Read { .. })));
    }

    #[test]
    fn no_optimize_flag_disables_the_optimizer_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_source(&dir, "main.ml", "let a:int=1; let b:int=a; print(b);");
        let output = dir.path().join("main.asm");

        let session = Session::new(Config {
            input,
            output: output.clone(),
            optimize: false,
            emit_ir: false,
            verbose: false,
        });
        session.compile().expect("compilation should succeed");
        assert!(output.exists());
    }
}
