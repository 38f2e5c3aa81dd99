//! `use` and `eval_file` against files on disk.

use crate::common::error_kind;
use chaic::{Engine, EvalErrorKind, MODULE_PATH_ENV};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

fn library_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("counter.chai"),
        "global loads = loads + 1\ndef triple(x) { x * 3 }\n",
    )
    .unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();
    fs::write(
        dir.path().join("nested").join("outer.chai"),
        "use(\"counter.chai\")\ndef nine() { triple(3) }\n",
    )
    .unwrap();
    fs::write(dir.path().join("broken.chai"), "def (").unwrap();
    dir
}

fn engine_for(dir: &TempDir) -> Engine {
    let engine = Engine::builder()
        .capture_output()
        .search_path(dir.path())
        .build();
    engine.add_global(0, "loads").unwrap();
    engine
}

#[test]
fn failed_use_runs_again_on_retry() {
    let dir = library_dir();
    fs::write(dir.path().join("needs_host.chai"), "loads = loads + 1\nmissing_fn()\n").unwrap();
    let engine = engine_for(&dir);

    let err = engine.eval("use(\"needs_host.chai\")").unwrap_err();
    assert!(matches!(error_kind(err), EvalErrorKind::Dispatch { .. }));

    engine.add_fn("missing_fn", || 42_i32).unwrap();
    assert_eq!(engine.eval_as::<i32>("use(\"needs_host.chai\")").unwrap(), 42);
    assert_eq!(engine.eval_as::<i32>("loads").unwrap(), 2);
    assert!(engine.eval("use(\"needs_host.chai\")").unwrap().is_undef());
}

#[test]
fn use_evaluates_once() {
    let dir = library_dir();
    let engine = engine_for(&dir);
    engine.eval("use(\"counter.chai\")").unwrap();
    let second = engine.eval("use(\"counter.chai\")").unwrap();
    assert!(second.is_undef());
    assert_eq!(engine.eval_as::<i32>("loads").unwrap(), 1);
    assert_eq!(engine.eval_as::<i32>("triple(2)").unwrap(), 6);
}

#[test]
fn different_spellings_of_one_file_load_once() {
    let dir = library_dir();
    let engine = engine_for(&dir);
    let absolute = dir.path().join("counter.chai");
    engine.eval("use(\"counter.chai\")").unwrap();
    engine
        .eval(&format!("use(\"{}\")", absolute.display()))
        .unwrap();
    assert_eq!(engine.eval_as::<i32>("loads").unwrap(), 1);
}

#[test]
fn eval_file_always_evaluates() {
    let dir = library_dir();
    let engine = engine_for(&dir);
    engine.eval_file("counter.chai").unwrap();
    engine.eval_file("counter.chai").unwrap();
    engine.eval("use(\"counter.chai\")").unwrap();
    assert_eq!(engine.eval_as::<i32>("loads").unwrap(), 3);
}

#[test]
fn nested_use_resolves_through_search_paths() {
    let dir = library_dir();
    let engine = engine_for(&dir);
    engine.eval("use(\"nested/outer.chai\")").unwrap();
    assert_eq!(engine.eval_as::<i32>("nine()").unwrap(), 9);
    assert_eq!(engine.eval_as::<i32>("loads").unwrap(), 1);
}

#[test]
fn missing_and_broken_files_are_module_errors() {
    let dir = library_dir();
    let engine = engine_for(&dir);
    let err = engine.eval("use(\"absent.chai\")").unwrap_err();
    assert!(matches!(error_kind(err), EvalErrorKind::Module { .. }));
    let err = engine.eval_file("broken.chai").unwrap_err();
    assert!(matches!(error_kind(err), EvalErrorKind::Module { .. }));
}

#[test]
fn search_paths_from_environment() {
    let dir = library_dir();
    std::env::set_var(MODULE_PATH_ENV, dir.path());
    let engine = Engine::builder()
        .capture_output()
        .search_paths_from_env()
        .build();
    std::env::remove_var(MODULE_PATH_ENV);
    engine.add_global(0, "loads").unwrap();
    engine.eval("use(\"counter.chai\")").unwrap();
    assert_eq!(engine.eval_as::<i32>("triple(5)").unwrap(), 15);
}
