//! Error types for evaluation and dispatch.
//!
//! `EvalErrorKind` provides typed error categories. Factory functions
//! (e.g. `division_by_zero()`) are the public construction API; they
//! populate both `kind` and `message`.
//!
//! Non-local control flow inside the evaluator (`return`, `break`,
//! `continue`, and errors unwinding through scopes) travels as
//! [`ControlAction`].

use crate::value::BoxedValue;
use chai_ir::Span;
use std::fmt;
use std::sync::Arc;

/// Result of evaluation.
pub type EvalResult = Result<BoxedValue, EvalError>;

/// Why a cast failed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CastKind {
    /// Runtime type does not convert to the requested type.
    BadCast,
    /// The requested view is not allowed for this type, e.g. a const view
    /// of a type registered as mutable-only.
    TypeError,
}

/// Typed error category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalErrorKind {
    /// Source text failed to parse.
    Parse,

    // Dispatch
    /// No overload survived type and guard filtering.
    Dispatch {
        name: String,
        arity: usize,
        candidates: usize,
    },
    /// More than one overload survived and none dominates the others.
    AmbiguousCall {
        name: String,
        arity: usize,
        candidates: usize,
    },
    NotCallable {
        type_name: String,
    },

    // Values
    Cast {
        from: String,
        to: String,
        cast: CastKind,
    },
    ConstViolation {
        target: String,
    },
    NonConstValue {
        name: String,
    },
    UndefinedVariable {
        name: String,
    },
    TypeMismatch {
        expected: String,
        got: String,
    },

    // Arithmetic
    DivisionByZero,
    ModuloByZero,

    // Access
    IndexOutOfBounds {
        index: i64,
        len: usize,
    },
    KeyNotFound {
        key: String,
    },

    // Engine
    StackOverflow {
        depth: usize,
    },
    NameConflict {
        name: String,
        existing: String,
    },
    Module {
        path: String,
        reason: String,
    },

    /// A script `throw` that no `catch` handled.
    ScriptThrow,
    /// Error raised by a host function.
    Native {
        message: String,
    },

    /// Catch-all for errors without a structured kind.
    Custom {
        message: String,
    },
}

impl EvalErrorKind {
    /// Short category name, also used as the `exception` kind string when
    /// an error is caught by a script.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Parse => "parse_error",
            Self::Dispatch { .. } => "dispatch_error",
            Self::AmbiguousCall { .. } => "ambiguous_call",
            Self::NotCallable { .. } => "not_callable",
            Self::Cast { .. } => "cast_error",
            Self::ConstViolation { .. } => "const_violation",
            Self::NonConstValue { .. } => "non_const_value",
            Self::UndefinedVariable { .. } => "undefined_variable",
            Self::TypeMismatch { .. } => "type_mismatch",
            Self::DivisionByZero | Self::ModuloByZero => "arithmetic_error",
            Self::IndexOutOfBounds { .. } => "out_of_range",
            Self::KeyNotFound { .. } => "key_not_found",
            Self::StackOverflow { .. } => "stack_overflow",
            Self::NameConflict { .. } => "name_conflict",
            Self::Module { .. } => "module_error",
            Self::ScriptThrow => "script_throw",
            Self::Native { .. } => "native_error",
            Self::Custom { .. } => "eval_error",
        }
    }
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse => write!(f, "parse error"),

            Self::Dispatch {
                name,
                arity,
                candidates,
            } => {
                let arg_word = if *arity == 1 { "argument" } else { "arguments" };
                write!(
                    f,
                    "no matching function `{name}` for {arity} {arg_word} \
                     ({candidates} overloads considered)"
                )
            }
            Self::AmbiguousCall {
                name,
                arity,
                candidates,
            } => write!(
                f,
                "ambiguous call to `{name}` with {arity} arguments: \
                 {candidates} overloads are equally specific"
            ),
            Self::NotCallable { type_name } => write!(f, "{type_name} is not callable"),

            Self::Cast {
                from,
                to,
                cast: CastKind::BadCast,
            } => write!(f, "cannot convert {from} to {to}"),
            Self::Cast {
                from,
                to,
                cast: CastKind::TypeError,
            } => write!(f, "type error: {from} cannot be viewed as {to}"),
            Self::ConstViolation { target } => {
                if target.is_empty() {
                    write!(f, "cannot modify a const value")
                } else {
                    write!(f, "cannot modify const value `{target}`")
                }
            }
            Self::NonConstValue { name } => write!(
                f,
                "global constant `{name}` must be an owned or const value, \
                 not a shared or reference alias"
            ),
            Self::UndefinedVariable { name } => {
                if name.is_empty() {
                    write!(f, "use of an undefined value")
                } else {
                    write!(f, "undefined variable: {name}")
                }
            }
            Self::TypeMismatch { expected, got } => {
                write!(f, "type mismatch: expected {expected}, got {got}")
            }

            Self::DivisionByZero => write!(f, "division by zero"),
            Self::ModuloByZero => write!(f, "modulo by zero"),

            Self::IndexOutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for length {len}")
            }
            Self::KeyNotFound { key } => write!(f, "key not found: {key}"),

            Self::StackOverflow { depth } => {
                write!(f, "maximum call depth exceeded (limit: {depth})")
            }
            Self::NameConflict { name, existing } => {
                write!(f, "`{name}` is already registered as {existing}")
            }
            Self::Module { path, reason } => write!(f, "cannot load `{path}`: {reason}"),

            Self::ScriptThrow => write!(f, "uncaught script exception"),
            Self::Native { message } | Self::Custom { message } => write!(f, "{message}"),
        }
    }
}

/// Additional context note attached to an error.
#[derive(Clone, Debug)]
pub struct EvalNote {
    pub message: String,
    pub span: Option<Span>,
}

impl EvalNote {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span: None,
        }
    }

    pub fn with_span(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span: Some(span),
        }
    }
}

/// A single frame in an evaluation backtrace.
#[derive(Clone, Debug)]
pub struct BacktraceFrame {
    /// Function name.
    pub name: String,
    /// Source location of the call site.
    pub span: Option<Span>,
}

/// Snapshot of the script call stack at an error site, innermost first.
#[derive(Clone, Debug, Default)]
pub struct EvalBacktrace {
    frames: Vec<BacktraceFrame>,
}

impl EvalBacktrace {
    pub fn new(frames: Vec<BacktraceFrame>) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &[BacktraceFrame] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }
}

impl fmt::Display for EvalBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frames.is_empty() {
            return Ok(());
        }
        writeln!(f, "stack backtrace:")?;
        for (i, frame) in self.frames.iter().enumerate() {
            write!(f, "  {i}: {}", frame.name)?;
            if let Some(span) = frame.span {
                write!(f, " at {span}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Evaluation error.
#[derive(Clone, Debug)]
pub struct EvalError {
    /// Structured error category.
    pub kind: EvalErrorKind,
    /// Human-readable message; equals `kind.to_string()` for factory errors.
    pub message: String,
    /// Source location where the error occurred.
    pub span: Option<Span>,
    /// Script call stack at the error site.
    pub backtrace: Option<EvalBacktrace>,
    /// Additional context notes.
    pub notes: Vec<EvalNote>,
    /// The value passed to `throw`, for `ScriptThrow` errors.
    pub thrown: Option<BoxedValue>,
    /// The original host error, for errors raised by native functions.
    pub native: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl EvalError {
    /// Create an error with just a message (`Custom` kind).
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::from_kind(EvalErrorKind::Custom { message })
    }

    /// Create an error from a structured kind; the message is the kind's
    /// `Display` output.
    pub fn from_kind(kind: EvalErrorKind) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            message,
            span: None,
            backtrace: None,
            notes: Vec::new(),
            thrown: None,
            native: None,
        }
    }

    /// Wrap a host error raised inside a native function.
    ///
    /// An `EvalError` passed through a host function is returned unchanged.
    pub fn native<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(error);
        match boxed.downcast::<EvalError>() {
            Ok(eval) => *eval,
            Err(other) => {
                let mut err = Self::from_kind(EvalErrorKind::Native {
                    message: other.to_string(),
                });
                err.native = Some(Arc::from(other));
                err
            }
        }
    }

    /// Error carrying a script-thrown value.
    pub fn throw(value: BoxedValue) -> Self {
        let mut err = Self::from_kind(EvalErrorKind::ScriptThrow);
        err.message = format!("uncaught script exception: {value}");
        err.thrown = Some(value);
        err
    }

    /// Attach a source span unless one is already set.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span);
        }
        self
    }

    #[must_use]
    pub fn with_backtrace(mut self, backtrace: EvalBacktrace) -> Self {
        self.backtrace = Some(backtrace);
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: EvalNote) -> Self {
        self.notes.push(note);
        self
    }

    /// Name the variable a nameless `ConstViolation` was raised for.
    #[must_use]
    pub fn with_const_target(mut self, name: &str) -> Self {
        if let EvalErrorKind::ConstViolation { target } = &mut self.kind {
            if target.is_empty() {
                name.clone_into(target);
                self.message = self.kind.to_string();
            }
        }
        self
    }

    /// Name the variable a nameless `UndefinedVariable` was raised for.
    #[must_use]
    pub fn with_undefined_name(mut self, name: &str) -> Self {
        if let EvalErrorKind::UndefinedVariable { name: missing } = &mut self.kind {
            if missing.is_empty() {
                name.clone_into(missing);
                self.message = self.kind.to_string();
            }
        }
        self
    }

    #[inline]
    pub fn is_script_throw(&self) -> bool {
        matches!(self.kind, EvalErrorKind::ScriptThrow)
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for EvalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.native {
            Some(native) => Some(native.as_ref()),
            None => None,
        }
    }
}

/// Non-local exit from an expression.
///
/// `Return`, `Break` and `Continue` are caught by the function-call boundary
/// and the enclosing loop respectively; `Error` unwinds to the nearest
/// `try` or out of the evaluator.
#[derive(Debug)]
pub enum ControlAction {
    Error(Box<EvalError>),
    Return(BoxedValue),
    Break,
    Continue,
}

impl ControlAction {
    /// Convert an action that escaped its handler into an error.
    pub fn into_error(self) -> EvalError {
        match self {
            ControlAction::Error(err) => *err,
            ControlAction::Return(_) => EvalError::new("`return` outside of a function"),
            ControlAction::Break => EvalError::new("`break` outside of a loop"),
            ControlAction::Continue => EvalError::new("`continue` outside of a loop"),
        }
    }
}

impl From<EvalError> for ControlAction {
    #[inline]
    fn from(err: EvalError) -> Self {
        ControlAction::Error(Box::new(err))
    }
}

// Dispatch errors

/// No overload matched.
#[cold]
pub fn no_matching_function(name: &str, arity: usize, candidates: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Dispatch {
        name: name.to_string(),
        arity,
        candidates,
    })
}

/// Several overloads matched with equal specificity.
#[cold]
pub fn ambiguous_call(name: &str, arity: usize, candidates: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::AmbiguousCall {
        name: name.to_string(),
        arity,
        candidates,
    })
}

/// Value is not callable.
#[cold]
pub fn not_callable(type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotCallable {
        type_name: type_name.to_string(),
    })
}

/// Native function called with the wrong number of arguments.
#[cold]
pub fn wrong_arg_count(expected: usize, got: usize) -> EvalError {
    let arg_word = if expected == 1 { "argument" } else { "arguments" };
    EvalError::new(format!("expected {expected} {arg_word}, got {got}"))
}

// Value errors

/// Failed conversion between types.
#[cold]
pub fn bad_cast(from: &str, to: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Cast {
        from: from.to_string(),
        to: to.to_string(),
        cast: CastKind::BadCast,
    })
}

/// Const view requested of a mutable-only type.
#[cold]
pub fn const_type_error(type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Cast {
        from: type_name.to_string(),
        to: format!("const {type_name}"),
        cast: CastKind::TypeError,
    })
}

/// Write through a const value.
#[cold]
pub fn const_violation(target: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ConstViolation {
        target: target.to_string(),
    })
}

/// `add_global_const` given an aliasing value.
#[cold]
pub fn non_const_value(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NonConstValue {
        name: name.to_string(),
    })
}

/// Undefined variable, or an undefined value used where a value is needed
/// (empty `name`).
#[cold]
pub fn undefined_variable(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedVariable {
        name: name.to_string(),
    })
}

#[cold]
pub fn type_mismatch(expected: &str, got: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::TypeMismatch {
        expected: expected.to_string(),
        got: got.to_string(),
    })
}

// Arithmetic errors

#[cold]
pub fn division_by_zero() -> EvalError {
    EvalError::from_kind(EvalErrorKind::DivisionByZero)
}

#[cold]
pub fn modulo_by_zero() -> EvalError {
    EvalError::from_kind(EvalErrorKind::ModuloByZero)
}

// Access errors

#[cold]
pub fn index_out_of_bounds(index: i64, len: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::IndexOutOfBounds { index, len })
}

#[cold]
pub fn key_not_found(key: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::KeyNotFound {
        key: key.to_string(),
    })
}

// Engine errors

/// Maximum call depth exceeded.
#[cold]
pub fn recursion_limit_exceeded(limit: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::StackOverflow { depth: limit })
}

/// A registration collides with an existing name of a different kind.
#[cold]
pub fn name_conflict(name: &str, existing: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NameConflict {
        name: name.to_string(),
        existing: existing.to_string(),
    })
}

/// `use`/`eval_file` failed to resolve, read or parse a file.
#[cold]
pub fn module_error(path: &str, reason: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Module {
        path: path.to_string(),
        reason: reason.into(),
    })
}

/// Syntax error surfaced through the evaluator (`use`, `eval`).
#[cold]
pub fn parse_error(message: &str, span: Span) -> EvalError {
    let mut err = EvalError::from_kind(EvalErrorKind::Parse);
    err.message = format!("parse error: {message}");
    err.span = Some(span);
    err
}
