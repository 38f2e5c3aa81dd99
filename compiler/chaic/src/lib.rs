//! Chai - an embeddable, dynamically typed scripting engine.
//!
//! # Architecture
//!
//! ```text
//! host registrations ──► Engine (functions, types, globals)
//!                            │
//! script text ──► parse ──► Interpreter ──► dispatch ──► host closures
//!                            │
//!                            ▼
//!                     BoxedValue ──► FromBoxed ──► host value
//! ```
//!
//! The boxed-value model lives in `chai_boxed`, dispatch and evaluation in
//! `chai_eval`; this crate is the embedding API and the `chai` binary.

// EvalError is returned by value throughout the runtime.
#![allow(clippy::result_large_err)]

pub mod engine;
pub mod exception;
mod parser;
pub mod reporting;

pub use chai_boxed::{
    boxed_cast, BoxedValue, EvalError, EvalErrorKind, FromBoxed, FunctionValue, IntoBoxed, Mut,
    Native, Number, OwnershipMode, ProxyFunction, SharedSlot,
};
pub use engine::{Engine, EngineBuilder, FunctionHandle, Registration, TypeDescriptor, MODULE_PATH_ENV};
pub use exception::{CaughtException, ChaiError, ExceptionSpec};
pub use parser::ChaiParser;
pub use reporting::render_error;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Does nothing unless `RUST_LOG` is set,
/// e.g. `RUST_LOG=chai_eval=debug` or `RUST_LOG=chai_eval::dispatch=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}
