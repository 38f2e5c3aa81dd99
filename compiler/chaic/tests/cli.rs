#![allow(clippy::unwrap_used, reason = "Tests can panic")]

//! The `chai` binary.

use pretty_assertions::assert_eq;
use std::process::{Command, Output};

fn chai(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_chai"))
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("CHAI_MODULE_PATH")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn eval_prints_result() {
    let output = chai(&["eval", "1 + 2 * 3"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "7\n");
}

#[test]
fn run_executes_file_with_includes() {
    let dir = tempfile::tempdir().unwrap();
    let lib = dir.path().join("lib");
    std::fs::create_dir(&lib).unwrap();
    std::fs::write(lib.join("greet.chai"), "def greet(n) { \"hello \" + n }").unwrap();
    let main = dir.path().join("main.chai");
    std::fs::write(&main, "use(\"greet.chai\")\nprint(greet(\"chai\"))\n").unwrap();

    let output = chai(&["run", main.to_str().unwrap(), "-I", lib.to_str().unwrap()]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "hello chai\n");
}

#[test]
fn bare_script_path_runs_it() {
    let dir = tempfile::tempdir().unwrap();
    let main = dir.path().join("main.chai");
    std::fs::write(&main, "print(40 + 2)").unwrap();
    let output = chai(&[main.to_str().unwrap()]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "42\n");
}

#[test]
fn errors_exit_nonzero_with_report() {
    let dir = tempfile::tempdir().unwrap();
    let main = dir.path().join("bad.chai");
    std::fs::write(&main, "var x = 1\nx / 0\n").unwrap();
    let output = chai(&["run", main.to_str().unwrap()]);
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("division by zero"), "{err}");
    assert!(err.contains("bad.chai"), "{err}");
}

#[test]
fn unknown_command_fails() {
    let output = chai(&["frobnicate"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Unknown command: frobnicate"));
}

#[test]
fn help_lists_commands() {
    let output = chai(&["help"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("run <file.chai>"));
}
