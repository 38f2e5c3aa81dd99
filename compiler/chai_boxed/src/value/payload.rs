//! Payload kinds a boxed value can hold.

use super::native::NativeBox;
use super::BoxedValue;
use crate::number::Number;
use crate::proxy::ProxyFunction;
use crate::types::{ClassId, TypeTag};
use chai_ir::Name;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// The value behind a boxed value's storage.
///
/// Containers hold boxed values, so elements are individually addressable
/// (`v[0] = 1` writes the element's own storage).
#[derive(Clone, Debug)]
pub enum Payload {
    Void,
    Bool(bool),
    Number(Number),
    Char(char),
    Str(String),
    Vector(Vec<BoxedValue>),
    Map(BTreeMap<String, BoxedValue>),
    Function(FunctionValue),
    Object(ObjectInstance),
    Exception(ExceptionValue),
    Native(NativeBox),
}

impl Payload {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Payload::Void => TypeTag::Void,
            Payload::Bool(_) => TypeTag::Bool,
            Payload::Number(n) => TypeTag::Number(n.kind()),
            Payload::Char(_) => TypeTag::Char,
            Payload::Str(_) => TypeTag::String,
            Payload::Vector(_) => TypeTag::Vector,
            Payload::Map(_) => TypeTag::Map,
            Payload::Function(_) => TypeTag::Function,
            Payload::Object(obj) => TypeTag::Class(obj.class),
            Payload::Exception(_) => TypeTag::Exception,
            Payload::Native(native) => TypeTag::Native(native.type_id()),
        }
    }

    /// Copy with value semantics: container elements and object attributes
    /// get fresh storage. Functions and host objects are cloned.
    pub fn deep_copy(&self) -> Payload {
        match self {
            Payload::Vector(items) => {
                Payload::Vector(items.iter().map(BoxedValue::duplicate).collect())
            }
            Payload::Map(entries) => Payload::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.duplicate()))
                    .collect(),
            ),
            Payload::Object(obj) => Payload::Object(ObjectInstance {
                class: obj.class,
                class_name: Arc::clone(&obj.class_name),
                attrs: obj
                    .attrs
                    .iter()
                    .map(|(k, v)| (k.clone(), v.duplicate()))
                    .collect(),
            }),
            other => other.clone(),
        }
    }
}

/// A callable value.
#[derive(Clone, Debug)]
pub enum FunctionValue {
    /// A single function (lambda, or a function picked by the host).
    Proxy(Arc<ProxyFunction>),
    /// All overloads registered under a name, resolved at call time.
    Overloads(Name),
}

/// Instance of a script class.
#[derive(Clone, Debug)]
pub struct ObjectInstance {
    pub class: ClassId,
    pub class_name: Arc<str>,
    pub attrs: BTreeMap<String, BoxedValue>,
}

/// Exception value seen by scripts: the payload of `catch (e)` when the
/// error was not a script `throw`.
#[derive(Clone)]
pub struct ExceptionValue {
    /// Error category, e.g. `dispatch_error` or `native_error`.
    pub kind: String,
    pub message: String,
    /// Original host error, if the exception came from a native function.
    pub source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl ExceptionValue {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        ExceptionValue {
            kind: kind.into(),
            message: message.into(),
            source: None,
        }
    }
}

impl fmt::Debug for ExceptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptionValue")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .field("has_source", &self.source.is_some())
            .finish()
    }
}
