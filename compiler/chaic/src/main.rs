//! Chai CLI
//!
//! Runs script files and one-off expressions.

use chaic::{init_tracing, render_error, Engine, EngineBuilder};
use std::io::IsTerminal;
use std::path::Path;

fn main() {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let command = &args[1];

    match command.as_str() {
        "run" => {
            let (paths, rest) = split_include_dirs(&args[2..]);
            let Some(file) = rest.first() else {
                eprintln!("error: missing file path");
                eprintln!("Usage: chai run <file.chai> [-I <dir>]...");
                std::process::exit(1);
            };
            run_file(file, &paths);
        }
        "eval" => {
            let (paths, rest) = split_include_dirs(&args[2..]);
            if rest.is_empty() {
                eprintln!("Usage: chai eval <expression> [-I <dir>]...");
                std::process::exit(1);
            }
            eval_text(&rest.join(" "), &paths);
        }
        "help" | "--help" | "-h" => {
            print_usage();
        }
        "version" | "--version" | "-v" => {
            println!("Chai {}", env!("CARGO_PKG_VERSION"));
        }
        _ => {
            // A bare script path runs it
            if Path::new(command)
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("chai"))
            {
                let (paths, _) = split_include_dirs(&args[2..]);
                run_file(command, &paths);
            } else {
                eprintln!("Unknown command: {command}");
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        }
    }
}

/// Separate `-I <dir>` / `-I<dir>` options from positional arguments.
fn split_include_dirs(args: &[String]) -> (Vec<String>, Vec<String>) {
    let mut dirs = Vec::new();
    let mut rest = Vec::new();
    let mut i = 0;
    while i < args.len() {
        if args[i] == "-I" && i + 1 < args.len() {
            dirs.push(args[i + 1].clone());
            i += 2;
        } else {
            match args[i].strip_prefix("-I") {
                Some(dir) if !dir.is_empty() => dirs.push(dir.to_string()),
                _ => rest.push(args[i].clone()),
            }
            i += 1;
        }
    }
    (dirs, rest)
}

/// Search order: `-I` directories, then `CHAI_MODULE_PATH`, then `extra`.
fn build_engine(include_dirs: &[String], extra: Option<&Path>) -> Engine {
    let mut builder = EngineBuilder::new();
    for dir in include_dirs {
        builder = builder.search_path(dir);
    }
    builder = builder.search_paths_from_env();
    if let Some(dir) = extra {
        builder = builder.search_path(dir);
    }
    builder.build()
}

fn run_file(path: &str, include_dirs: &[String]) {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading '{path}': {e}");
            std::process::exit(1);
        }
    };

    let parent = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty());
    let engine = build_engine(include_dirs, parent);
    if let Err(err) = engine.eval(&source) {
        eprint!("{}", render_error(&err, path, &source, std::io::stderr().is_terminal()));
        std::process::exit(1);
    }
}

fn eval_text(text: &str, include_dirs: &[String]) {
    let engine = build_engine(include_dirs, None);
    match engine.eval(text) {
        Ok(value) => {
            if !value.is_void() && !value.is_undef() {
                println!("{value}");
            }
        }
        Err(err) => {
            eprint!(
                "{}",
                render_error(&err, "<eval>", text, std::io::stderr().is_terminal())
            );
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!("Chai scripting engine");
    println!();
    println!("Usage: chai <command> [options]");
    println!();
    println!("Commands:");
    println!("  run <file.chai>      Run a script file");
    println!("  eval <expression>    Evaluate an expression and print its value");
    println!("  help                 Show this help message");
    println!("  version              Show version information");
    println!();
    println!("Options:");
    println!("  -I <dir>             Add a module search directory (repeatable)");
    println!();
    println!("Environment:");
    println!("  CHAI_MODULE_PATH     Extra module search directories");
    println!("  RUST_LOG             Enable tracing output (e.g. chai_eval=debug)");
    println!();
    println!("Examples:");
    println!("  chai run main.chai");
    println!("  chai main.chai -I lib/");
    println!("  chai eval \"1 + 2 * 3\"");
}
