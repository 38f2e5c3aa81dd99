//! Host boundary errors and exception specifications.
//!
//! A script `throw` that escapes evaluation reaches the host as
//! [`ChaiError::Eval`] with kind `ScriptThrow`, holding the thrown value
//! opaquely. With an [`ExceptionSpec`], the host names the types it wants
//! the thrown value as; the first matching entry turns the throw into
//! [`ChaiError::Caught`] carrying the extracted host value.

use chai_boxed::{BoxedValue, EvalError, FromBoxed, ParamConstraint, TypeRegistry};
use std::any::Any;
use std::fmt;

/// Errors returned by [`Engine`](crate::Engine) operations.
#[derive(Debug, thiserror::Error)]
pub enum ChaiError {
    /// The script text failed to parse.
    #[error("{0}")]
    Parse(EvalError),

    /// Evaluation failed. Script throws not matched by an exception
    /// specification land here with kind `ScriptThrow`.
    #[error(transparent)]
    Eval(#[from] EvalError),

    /// A script throw matched an entry of the exception specification.
    #[error("{0}")]
    Caught(CaughtException),
}

impl ChaiError {
    /// The underlying evaluation error, if any.
    pub fn eval_error(&self) -> Option<&EvalError> {
        match self {
            ChaiError::Parse(err) | ChaiError::Eval(err) => Some(err),
            ChaiError::Caught(_) => None,
        }
    }

    /// The value passed to `throw`, for errors that came from a script throw.
    pub fn thrown(&self) -> Option<&BoxedValue> {
        match self {
            ChaiError::Parse(_) => None,
            ChaiError::Eval(err) => err.thrown.as_ref(),
            ChaiError::Caught(caught) => Some(&caught.thrown),
        }
    }
}

type Extract = fn(&BoxedValue) -> Result<Box<dyn Any + Send + Sync>, EvalError>;

struct SpecEntry {
    type_name: &'static str,
    constraint: ParamConstraint,
    extract: Extract,
}

fn extract<T: FromBoxed + Send + Sync + 'static>(
    value: &BoxedValue,
) -> Result<Box<dyn Any + Send + Sync>, EvalError> {
    T::from_boxed(value).map(|v| Box::new(v) as Box<dyn Any + Send + Sync>)
}

/// Ordered list of host types a caller is willing to catch.
///
/// ```ignore
/// let spec = ExceptionSpec::new().with::<i32>().with::<String>();
/// match engine.eval_with_spec("throw(\"boom\")", &spec) {
///     Err(ChaiError::Caught(caught)) => assert_eq!(caught.get::<String>(), Some(&"boom".into())),
///     other => panic!("{other:?}"),
/// }
/// ```
#[derive(Default)]
pub struct ExceptionSpec {
    entries: Vec<SpecEntry>,
}

impl ExceptionSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `T` to the list.
    #[must_use]
    pub fn with<T: FromBoxed + Send + Sync + 'static>(mut self) -> Self {
        self.entries.push(SpecEntry {
            type_name: std::any::type_name::<T>(),
            constraint: T::constraint(),
            extract: extract::<T>,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Match a thrown value against the entries in order.
    ///
    /// An entry matches when the value's runtime type is the entry's type
    /// and extraction succeeds.
    pub fn catch(&self, thrown: &BoxedValue, registry: &TypeRegistry) -> Option<CaughtException> {
        self.entries.iter().enumerate().find_map(|(index, entry)| {
            if !entry.constraint.accepts(thrown, registry) {
                return None;
            }
            let value = (entry.extract)(thrown).ok()?;
            tracing::debug!(index, type_name = entry.type_name, "script throw caught by spec");
            Some(CaughtException {
                index,
                type_name: entry.type_name,
                value,
                thrown: thrown.clone(),
            })
        })
    }
}

impl fmt::Debug for ExceptionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| e.type_name))
            .finish()
    }
}

/// A script throw extracted as a host value.
pub struct CaughtException {
    /// Position of the matching entry in the specification.
    pub index: usize,
    /// Rust type name of the matching entry.
    pub type_name: &'static str,
    value: Box<dyn Any + Send + Sync>,
    /// The value as thrown by the script.
    pub thrown: BoxedValue,
}

impl CaughtException {
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    pub fn get<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }

    /// Take the host value, or give the exception back if it holds another
    /// type.
    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        let CaughtException {
            index,
            type_name,
            value,
            thrown,
        } = self;
        match value.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(value) => Err(CaughtException {
                index,
                type_name,
                value,
                thrown,
            }),
        }
    }
}

impl fmt::Display for CaughtException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "script exception `{}` caught as {}", self.thrown, self.type_name)
    }
}

impl fmt::Debug for CaughtException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaughtException")
            .field("index", &self.index)
            .field("type_name", &self.type_name)
            .field("thrown", &self.thrown)
            .finish_non_exhaustive()
    }
}
