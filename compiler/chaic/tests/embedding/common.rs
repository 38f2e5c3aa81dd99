//! Shared helpers for embedding tests.

use chaic::{ChaiError, Engine, EvalErrorKind};

/// Engine with captured output.
pub fn engine() -> Engine {
    Engine::builder().capture_output().build()
}

/// Kind of an evaluation error; panics on caught exceptions.
pub fn error_kind(err: ChaiError) -> EvalErrorKind {
    match err {
        ChaiError::Eval(err) | ChaiError::Parse(err) => err.kind,
        ChaiError::Caught(caught) => panic!("unexpected caught exception: {caught}"),
    }
}
