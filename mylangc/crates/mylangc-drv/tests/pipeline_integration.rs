use std::path::PathBuf;

use mylangc_drv::{Config, Session};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

#[test]
fn compiles_a_function_and_call_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("hello.asm");

    let session = Session::new(Config {
        input: fixture("hello.ml"),
        output: output.clone(),
        optimize: true,
        emit_ir: false,
        verbose: false,
    });
    session.compile().expect("pipeline should succeed on a well-formed program");

    let asm = std::fs::read_to_string(&output).unwrap();
    assert!(asm.contains("func_add:"), "expected a label for the declared function");
    assert!(asm.contains("call func_add"), "expected the call site to reach the function");
    assert!(asm.contains("global main"));
}

#[test]
fn a_broken_program_fails_without_writing_an_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("broken.asm");

    let session = Session::new(Config {
        input: fixture("broken.ml"),
        output: output.clone(),
        optimize: true,
        emit_ir: false,
        verbose: false,
    });
    assert!(session.compile().is_err());
    assert!(!output.exists());
}
