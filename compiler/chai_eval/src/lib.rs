//! Chai Eval - dispatch engine and tree-walking evaluator.
//!
//! # Architecture
//!
//! - [`DispatchTable`] / [`resolve`]: overload storage and selection
//! - [`Environment`]: local scope stack over the engine [`Globals`]
//! - [`Interpreter`]: evaluates the flat AST from `chai_ir`
//! - [`ModuleSystem`]: parser and resolver seams for `use` / `eval_file`
//! - [`register_prelude`]: builtin script functions
//!
//! Everything an engine shares between evaluations sits in [`EngineState`];
//! an [`Interpreter`] is cheap to create per evaluation.

// EvalError is returned by value throughout the runtime.
#![allow(clippy::result_large_err)]

mod builtins;
pub mod dispatch;
mod environment;
pub mod interpreter;
mod modules;
mod print_handler;
mod shared;

pub use builtins::register_prelude;
pub use dispatch::{resolve, DispatchTable, Selected};
pub use environment::{Environment, Globals, SavedFrame, Scope};
pub use interpreter::{exception_value, EngineState, Interpreter};
pub use modules::{ModuleResolver, ModuleSystem, Program, ScriptParser, SearchPathResolver};
pub use print_handler::{
    buffer_handler, silent_handler, stdout_handler, BufferPrintHandler, PrintHandlerImpl,
    SharedPrintHandler,
};
pub use shared::SharedMutableRegistry;
