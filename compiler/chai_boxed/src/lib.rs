//! Chai boxed values.
//!
//! The runtime data model shared by the evaluator and the embedding API:
//!
//! - [`BoxedValue`]: type-erased, ownership-aware value handle
//! - [`TypeRegistry`]: type names, host types, script classes, conversions
//! - [`BoxedNumber`] / [`Number`]: numeric payloads, promotion and casts
//! - [`ProxyFunction`]: one callable overload with parameter constraints
//! - [`EvalError`]: structured runtime errors
//!
//! # Ownership
//!
//! Values live in reference-counted storage. A boxed value is a handle to
//! that storage plus an [`OwnershipMode`]; cloning the handle aliases,
//! [`BoxedValue::duplicate`] copies.

// EvalError is returned by value throughout the runtime.
#![allow(clippy::result_large_err)]

mod convert;
pub mod errors;
mod number;
mod proxy;
mod types;
mod value;

pub use convert::{boxed_cast, FromBoxed, IntoArgs, IntoBoxed, Mut, Native, NativeReturn};
pub use errors::{
    BacktraceFrame, CastKind, ControlAction, EvalBacktrace, EvalError, EvalErrorKind, EvalNote,
    EvalResult,
};
pub use number::{BoxedNumber, Number, NumberKind, NumericCast};
pub use proxy::{
    NativeCallable, NativeFn, ParamConstraint, ProxyBody, ProxyFunction, ScriptFunction,
};
pub use types::{ClassId, ClassMeta, Conversion, NativeMeta, TypeFlags, TypeInfo, TypeRegistry, TypeTag};
pub use value::{
    expect_bool, BoxedValue, ExceptionValue, FunctionValue, NativeBox, NativeObject,
    ObjectInstance, OwnershipMode, Payload, SharedSlot,
};
