//! Boxed values.
//!
//! A [`BoxedValue`] is a handle to reference-counted storage plus an
//! [`OwnershipMode`]. Cloning the handle aliases the storage; use
//! [`BoxedValue::duplicate`] for value semantics.
//!
//! # Storage
//!
//! Storage is `Arc<RwLock<Option<Payload>>>`. `None` marks a declared but
//! never assigned variable; because the flag lives in the shared storage,
//! assigning through any alias defines the value for all of them.
//!
//! Locks are held only for the duration of a single read or write and
//! never across calls back into script code.

mod native;
mod payload;

use crate::errors::{
    bad_cast, const_type_error, const_violation, type_mismatch, undefined_variable, EvalError,
};
use crate::number::Number;
use crate::types::{TypeFlags, TypeInfo, TypeRegistry, TypeTag};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub use native::{NativeBox, NativeObject};
pub use payload::{ExceptionValue, FunctionValue, ObjectInstance, Payload};

type Storage = Arc<RwLock<Option<Payload>>>;

/// How a boxed value relates to its storage.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OwnershipMode {
    /// Storage created for this value; writes replace the value freely.
    OwnedCopy,
    /// Storage owned by the host through a [`SharedSlot`].
    Shared,
    /// Alias of another value's storage (`var l := k`).
    Reference,
    /// Read-only alias; every write fails with `ConstViolation`.
    ConstReference,
}

/// Host-held storage that scripts can alias.
///
/// Writes from script through a `Shared` boxed value are visible to the
/// host through the slot, and vice versa.
#[derive(Clone)]
pub struct SharedSlot(Storage);

impl SharedSlot {
    pub fn new(value: impl crate::IntoBoxed) -> Self {
        SharedSlot(Arc::new(RwLock::new(value.into_boxed().into_payload())))
    }

    /// A `Shared` boxed value aliasing this slot.
    pub fn boxed(&self) -> BoxedValue {
        BoxedValue::shared(self)
    }

    /// Extract the current value.
    pub fn get<T: crate::FromBoxed>(&self) -> Result<T, EvalError> {
        T::from_boxed(&self.boxed())
    }

    /// Assign a new value with the rules of [`BoxedValue::assign`].
    pub fn set(&self, value: impl crate::IntoBoxed) -> Result<(), EvalError> {
        self.boxed().assign(&value.into_boxed())
    }
}

impl fmt::Debug for SharedSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedSlot({:?})", self.boxed())
    }
}

/// Type-erased, ownership-aware value.
#[derive(Clone)]
pub struct BoxedValue {
    slot: Storage,
    mode: OwnershipMode,
}

impl BoxedValue {
    // ===== Construction =====

    /// Owned value with fresh storage.
    pub fn new(payload: Payload) -> Self {
        BoxedValue {
            slot: Arc::new(RwLock::new(Some(payload))),
            mode: OwnershipMode::OwnedCopy,
        }
    }

    /// Owned value from any host value.
    pub fn owned(value: impl crate::IntoBoxed) -> Self {
        value.into_boxed()
    }

    /// Declared but unassigned value.
    pub fn undefined() -> Self {
        BoxedValue {
            slot: Arc::new(RwLock::new(None)),
            mode: OwnershipMode::OwnedCopy,
        }
    }

    pub fn void() -> Self {
        Self::new(Payload::Void)
    }

    pub fn bool(value: bool) -> Self {
        Self::new(Payload::Bool(value))
    }

    pub fn number(value: Number) -> Self {
        Self::new(Payload::Number(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(Payload::Str(value.into()))
    }

    pub fn vector(items: Vec<BoxedValue>) -> Self {
        Self::new(Payload::Vector(items))
    }

    pub fn map(entries: BTreeMap<String, BoxedValue>) -> Self {
        Self::new(Payload::Map(entries))
    }

    pub fn function(function: FunctionValue) -> Self {
        Self::new(Payload::Function(function))
    }

    pub fn exception(exception: ExceptionValue) -> Self {
        Self::new(Payload::Exception(exception))
    }

    /// Alias of a host slot.
    pub fn shared(slot: &SharedSlot) -> Self {
        BoxedValue {
            slot: Arc::clone(&slot.0),
            mode: OwnershipMode::Shared,
        }
    }

    /// Mutable alias of this value's storage.
    pub fn alias(&self) -> Result<Self, EvalError> {
        if self.is_const() {
            return Err(const_violation(""));
        }
        Ok(self.with_mode(OwnershipMode::Reference))
    }

    /// Read-only alias of this value's storage.
    ///
    /// Does not consult the registry; see [`BoxedValue::rebox`] for the
    /// checked variant.
    pub fn alias_const(&self) -> Self {
        self.with_mode(OwnershipMode::ConstReference)
    }

    /// Explicit const view that bypasses the mutable-only check.
    pub fn const_cast(&self) -> Self {
        self.alias_const()
    }

    /// Re-box under `mode`.
    ///
    /// - `OwnedCopy` deep copies.
    /// - `Shared`/`Reference` alias; a const source fails with
    ///   `ConstViolation`.
    /// - `ConstReference` aliases read-only; a type registered as
    ///   mutable-only fails with a `TypeError` cast error.
    pub fn rebox(&self, mode: OwnershipMode, registry: &TypeRegistry) -> Result<Self, EvalError> {
        match mode {
            OwnershipMode::OwnedCopy => Ok(self.duplicate()),
            OwnershipMode::Shared | OwnershipMode::Reference => {
                if self.is_const() {
                    return Err(const_violation(""));
                }
                Ok(self.with_mode(mode))
            }
            OwnershipMode::ConstReference => {
                let tag = self.type_tag();
                if registry.is_mutable_only(tag) {
                    return Err(const_type_error(&registry.name_of(tag)));
                }
                Ok(self.alias_const())
            }
        }
    }

    /// Deep copy into fresh owned storage. Undefined stays undefined.
    pub fn duplicate(&self) -> Self {
        let copy = self.slot.read().as_ref().map(Payload::deep_copy);
        BoxedValue {
            slot: Arc::new(RwLock::new(copy)),
            mode: OwnershipMode::OwnedCopy,
        }
    }

    fn with_mode(&self, mode: OwnershipMode) -> Self {
        BoxedValue {
            slot: Arc::clone(&self.slot),
            mode,
        }
    }

    // ===== Inspection =====

    #[inline]
    pub fn mode(&self) -> OwnershipMode {
        self.mode
    }

    #[inline]
    pub fn is_const(&self) -> bool {
        self.mode == OwnershipMode::ConstReference
    }

    pub fn is_undef(&self) -> bool {
        self.slot.read().is_none()
    }

    pub fn is_void(&self) -> bool {
        matches!(*self.slot.read(), Some(Payload::Void))
    }

    /// Whether both handles point at the same storage.
    #[inline]
    pub fn same_storage(&self, other: &BoxedValue) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }

    /// Type of the current payload; `Void` for undefined values.
    pub fn type_tag(&self) -> TypeTag {
        self.slot
            .read()
            .as_ref()
            .map_or(TypeTag::Void, Payload::type_tag)
    }

    pub fn type_info(&self) -> TypeInfo {
        let guard = self.slot.read();
        let mut flags = TypeFlags::empty();
        if self.is_const() {
            flags |= TypeFlags::CONST;
        }
        let tag = match guard.as_ref() {
            Some(payload) => payload.type_tag(),
            None => {
                flags |= TypeFlags::UNDEFINED;
                TypeTag::Void
            }
        };
        TypeInfo::new(tag, flags)
    }

    /// Type name without registry access: builtin names, the class name of
    /// objects, the Rust type name of host objects.
    pub fn type_name_hint(&self) -> String {
        match &*self.slot.read() {
            None => "undefined".to_string(),
            Some(Payload::Object(obj)) => obj.class_name.to_string(),
            Some(Payload::Native(native)) => native.type_name().to_string(),
            Some(other) => other
                .type_tag()
                .builtin_name()
                .unwrap_or("unknown")
                .to_string(),
        }
    }

    /// Script-visible type name.
    pub fn type_name(&self, registry: &TypeRegistry) -> String {
        if self.is_undef() {
            return "undefined".to_string();
        }
        registry.name_of(self.type_tag())
    }

    // ===== Payload access =====

    /// Shallow copy of the payload (container elements stay aliased).
    pub fn payload(&self) -> Option<Payload> {
        self.slot.read().clone()
    }

    /// Take the payload out, cloning only if the storage is aliased.
    pub fn into_payload(self) -> Option<Payload> {
        match Arc::try_unwrap(self.slot) {
            Ok(lock) => lock.into_inner(),
            Err(shared) => shared.read().clone(),
        }
    }

    /// Read the payload under the storage lock.
    pub fn with_payload<R>(&self, f: impl FnOnce(Option<&Payload>) -> R) -> R {
        f(self.slot.read().as_ref())
    }

    /// Mutate the payload in place.
    ///
    /// Fails on const values and on undefined values.
    pub fn with_payload_mut<R>(&self, f: impl FnOnce(&mut Payload) -> R) -> Result<R, EvalError> {
        if self.is_const() {
            return Err(const_violation(""));
        }
        match self.slot.write().as_mut() {
            Some(payload) => Ok(f(payload)),
            None => Err(undefined_variable("")),
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match &*self.slot.read() {
            Some(Payload::Number(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match &*self.slot.read() {
            Some(Payload::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<String> {
        match &*self.slot.read() {
            Some(Payload::Str(s)) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<FunctionValue> {
        match &*self.slot.read() {
            Some(Payload::Function(f)) => Some(f.clone()),
            _ => None,
        }
    }

    /// Borrow a host object of type `T`.
    pub fn with_native<T: 'static, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        match &*self.slot.read() {
            Some(Payload::Native(native)) => native.downcast_ref::<T>().map(f),
            _ => None,
        }
    }

    /// Mutably borrow a host object of type `T`; `Ok(None)` if the value
    /// holds something else.
    pub fn with_native_mut<T: 'static, R>(
        &self,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<Option<R>, EvalError> {
        if self.is_const() {
            return Err(const_violation(""));
        }
        match &mut *self.slot.write() {
            Some(Payload::Native(native)) => Ok(native.downcast_mut::<T>().map(f)),
            _ => Ok(None),
        }
    }

    // ===== Mutation =====

    /// Assign `new` into this value's storage.
    ///
    /// - const targets fail with `ConstViolation`
    /// - undefined and owned targets take the new value and its type
    /// - shared/reference targets keep their type: numbers are converted to
    ///   the target's kind, any other type change fails with a cast error
    ///
    /// The write is visible through every alias of the storage.
    pub fn assign(&self, new: &BoxedValue) -> Result<(), EvalError> {
        if self.is_const() {
            return Err(const_violation(""));
        }
        // Copy out first: `x = x` reads and writes the same lock.
        let Some(incoming) = new.slot.read().as_ref().map(Payload::deep_copy) else {
            return Err(undefined_variable(""));
        };

        let mut slot = self.slot.write();
        let replacement = match (&*slot, self.mode) {
            (None, _) | (Some(_), OwnershipMode::OwnedCopy) => incoming,
            (Some(current), _) => coerce_for_alias(current, incoming)?,
        };
        *slot = Some(replacement);
        Ok(())
    }

    /// Replace the payload without mode or type checks.
    ///
    /// Used by the evaluator for bindings it owns (e.g. filling attributes
    /// of a fresh object).
    pub fn set_payload(&self, payload: Payload) {
        *self.slot.write() = Some(payload);
    }
}

/// Assignment through a shared or reference alias keeps the target type.
fn coerce_for_alias(current: &Payload, incoming: Payload) -> Result<Payload, EvalError> {
    let (target, source) = (current.type_tag(), incoming.type_tag());
    if target == source {
        return Ok(incoming);
    }
    match (current, &incoming) {
        (Payload::Number(existing), Payload::Number(n)) => {
            Ok(Payload::Number(n.convert(existing.kind())))
        }
        _ => {
            let name = |tag: TypeTag, p: &Payload| match p {
                Payload::Object(obj) => obj.class_name.to_string(),
                Payload::Native(native) => native.type_name().to_string(),
                _ => tag.builtin_name().unwrap_or("unknown").to_string(),
            };
            Err(bad_cast(&name(source, &incoming), &name(target, current)))
        }
    }
}

/// Truthiness for conditions: only `bool` is accepted.
pub fn expect_bool(value: &BoxedValue) -> Result<bool, EvalError> {
    match value.as_bool() {
        Some(b) => Ok(b),
        None if value.is_undef() => Err(undefined_variable("")),
        None => Err(type_mismatch("bool", &value.type_name_hint())),
    }
}

impl fmt::Display for BoxedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.slot.read() {
            None => f.write_str("<undefined>"),
            Some(payload) => fmt_payload(f, payload, false),
        }
    }
}

fn fmt_payload(f: &mut fmt::Formatter<'_>, payload: &Payload, nested: bool) -> fmt::Result {
    match payload {
        Payload::Void => Ok(()),
        Payload::Bool(b) => write!(f, "{b}"),
        Payload::Number(n) => write!(f, "{n}"),
        Payload::Char(c) if nested => write!(f, "'{c}'"),
        Payload::Char(c) => write!(f, "{c}"),
        Payload::Str(s) if nested => write!(f, "\"{s}\""),
        Payload::Str(s) => f.write_str(s),
        Payload::Vector(items) => {
            f.write_str("[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                fmt_nested(f, item)?;
            }
            f.write_str("]")
        }
        Payload::Map(entries) => {
            f.write_str("[")?;
            for (i, (key, value)) in entries.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "\"{key}\": ")?;
                fmt_nested(f, value)?;
            }
            f.write_str("]")
        }
        Payload::Function(_) => f.write_str("<function>"),
        Payload::Object(obj) => write!(f, "<{}>", obj.class_name),
        Payload::Exception(e) => f.write_str(&e.message),
        Payload::Native(native) => write!(f, "<{}>", native.type_name()),
    }
}

fn fmt_nested(f: &mut fmt::Formatter<'_>, value: &BoxedValue) -> fmt::Result {
    match &*value.slot.read() {
        None => f.write_str("<undefined>"),
        Some(payload) => fmt_payload(f, payload, true),
    }
}

impl fmt::Debug for BoxedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoxedValue({:?}, {})", self.mode, self)
    }
}

#[cfg(test)]
mod tests;
