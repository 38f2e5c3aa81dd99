//! Conversions between host values and boxed values.
//!
//! - [`IntoBoxed`]: host value → owned boxed value (infallible)
//! - [`FromBoxed`]: boxed value → host value, plus the parameter
//!   constraint a native function taking `Self` registers
//! - [`NativeReturn`]: what a native function may return; `Result`s with
//!   any `std::error::Error` are accepted and their error is preserved
//! - [`IntoArgs`]: argument tuples for calling script functions from the host

use crate::errors::{bad_cast, const_violation, EvalError};
use crate::number::{Number, NumericCast};
use crate::proxy::ParamConstraint;
use crate::types::TypeTag;
use crate::value::{BoxedValue, ExceptionValue, FunctionValue, NativeBox, Payload};
use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::marker::PhantomData;

/// Conversion of a host value into an owned boxed value.
pub trait IntoBoxed {
    fn into_boxed(self) -> BoxedValue;
}

/// Extraction of a host value from a boxed value.
pub trait FromBoxed: Sized {
    /// Extract; a mismatching payload fails with a cast error.
    fn from_boxed(value: &BoxedValue) -> Result<Self, EvalError>;

    /// Dispatch constraint for a native parameter of this type.
    fn constraint() -> ParamConstraint;
}

/// Return value of a native function.
pub trait NativeReturn {
    fn into_result(self) -> Result<BoxedValue, EvalError>;
}

/// Strict extraction: exact payload type, plus numeric conversion between
/// number kinds.
pub fn boxed_cast<T: FromBoxed>(value: &BoxedValue) -> Result<T, EvalError> {
    T::from_boxed(value)
}

/// Host object wrapper.
///
/// `Native<T>` boxes any `Clone + Send + Sync + 'static` value as an opaque
/// host object, and extracts a clone of it.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Native<T>(pub T);

/// Mutable view of a host object argument.
///
/// A native parameter of type `Mut<T>` requires a non-const argument
/// holding a `T`; writes go to the argument's storage.
pub struct Mut<T> {
    value: BoxedValue,
    marker: PhantomData<fn() -> T>,
}

impl<T: Any> Mut<T> {
    /// Run `f` against the host object.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, EvalError> {
        self.value
            .with_native_mut(f)?
            .ok_or_else(|| bad_cast(&self.value.type_name_hint(), std::any::type_name::<T>()))
    }

    pub fn boxed(&self) -> &BoxedValue {
        &self.value
    }
}

fn exact(tag: TypeTag) -> ParamConstraint {
    ParamConstraint::Exact {
        tag,
        mutable: false,
    }
}

// ===== IntoBoxed =====

impl IntoBoxed for BoxedValue {
    #[inline]
    fn into_boxed(self) -> BoxedValue {
        self
    }
}

impl IntoBoxed for () {
    fn into_boxed(self) -> BoxedValue {
        BoxedValue::void()
    }
}

impl IntoBoxed for bool {
    fn into_boxed(self) -> BoxedValue {
        BoxedValue::bool(self)
    }
}

impl IntoBoxed for char {
    fn into_boxed(self) -> BoxedValue {
        BoxedValue::new(Payload::Char(self))
    }
}

impl IntoBoxed for String {
    fn into_boxed(self) -> BoxedValue {
        BoxedValue::string(self)
    }
}

impl IntoBoxed for &str {
    fn into_boxed(self) -> BoxedValue {
        BoxedValue::string(self)
    }
}

impl IntoBoxed for Number {
    fn into_boxed(self) -> BoxedValue {
        BoxedValue::number(self)
    }
}

impl IntoBoxed for FunctionValue {
    fn into_boxed(self) -> BoxedValue {
        BoxedValue::function(self)
    }
}

impl IntoBoxed for ExceptionValue {
    fn into_boxed(self) -> BoxedValue {
        BoxedValue::exception(self)
    }
}

impl<T: IntoBoxed> IntoBoxed for Vec<T> {
    fn into_boxed(self) -> BoxedValue {
        BoxedValue::vector(self.into_iter().map(IntoBoxed::into_boxed).collect())
    }
}

impl<T: IntoBoxed> IntoBoxed for BTreeMap<String, T> {
    fn into_boxed(self) -> BoxedValue {
        BoxedValue::map(self.into_iter().map(|(k, v)| (k, v.into_boxed())).collect())
    }
}

impl<T: IntoBoxed> IntoBoxed for Option<T> {
    fn into_boxed(self) -> BoxedValue {
        self.map_or_else(BoxedValue::void, IntoBoxed::into_boxed)
    }
}

impl<T: Any + Clone + Send + Sync> IntoBoxed for Native<T> {
    fn into_boxed(self) -> BoxedValue {
        BoxedValue::new(Payload::Native(NativeBox::new(self.0)))
    }
}

macro_rules! impl_numeric_boxing {
    ($($ty:ty),*) => {
        $(
            impl IntoBoxed for $ty {
                #[inline]
                fn into_boxed(self) -> BoxedValue {
                    BoxedValue::number(self.into_number())
                }
            }

            impl FromBoxed for $ty {
                fn from_boxed(value: &BoxedValue) -> Result<Self, EvalError> {
                    value
                        .as_number()
                        .map(Number::get_as::<$ty>)
                        .ok_or_else(|| cast_error(value, <$ty as NumericCast>::KIND.type_name()))
                }

                fn constraint() -> ParamConstraint {
                    exact(TypeTag::Number(<$ty as NumericCast>::KIND))
                }
            }
        )*
    };
}

impl_numeric_boxing!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

#[cold]
fn cast_error(value: &BoxedValue, to: &str) -> EvalError {
    if value.is_undef() {
        return crate::errors::undefined_variable("");
    }
    bad_cast(&value.type_name_hint(), to)
}

// ===== FromBoxed =====

impl FromBoxed for BoxedValue {
    #[inline]
    fn from_boxed(value: &BoxedValue) -> Result<Self, EvalError> {
        Ok(value.clone())
    }

    fn constraint() -> ParamConstraint {
        ParamConstraint::Any
    }
}

impl FromBoxed for bool {
    fn from_boxed(value: &BoxedValue) -> Result<Self, EvalError> {
        value
            .as_bool()
            .ok_or_else(|| cast_error(value, "bool"))
    }

    fn constraint() -> ParamConstraint {
        exact(TypeTag::Bool)
    }
}

impl FromBoxed for char {
    fn from_boxed(value: &BoxedValue) -> Result<Self, EvalError> {
        value
            .with_payload(|p| match p {
                Some(Payload::Char(c)) => Some(*c),
                _ => None,
            })
            .ok_or_else(|| cast_error(value, "char"))
    }

    fn constraint() -> ParamConstraint {
        exact(TypeTag::Char)
    }
}

impl FromBoxed for String {
    fn from_boxed(value: &BoxedValue) -> Result<Self, EvalError> {
        value
            .as_string()
            .ok_or_else(|| cast_error(value, "string"))
    }

    fn constraint() -> ParamConstraint {
        exact(TypeTag::String)
    }
}

/// Any number; the constraint is `Any` because no single tag covers all
/// number kinds.
impl FromBoxed for Number {
    fn from_boxed(value: &BoxedValue) -> Result<Self, EvalError> {
        value
            .as_number()
            .ok_or_else(|| cast_error(value, "number"))
    }

    fn constraint() -> ParamConstraint {
        ParamConstraint::Any
    }
}

impl FromBoxed for FunctionValue {
    fn from_boxed(value: &BoxedValue) -> Result<Self, EvalError> {
        value
            .as_function()
            .ok_or_else(|| cast_error(value, "Function"))
    }

    fn constraint() -> ParamConstraint {
        exact(TypeTag::Function)
    }
}

impl FromBoxed for ExceptionValue {
    fn from_boxed(value: &BoxedValue) -> Result<Self, EvalError> {
        value
            .with_payload(|p| match p {
                Some(Payload::Exception(e)) => Some(e.clone()),
                _ => None,
            })
            .ok_or_else(|| cast_error(value, "exception"))
    }

    fn constraint() -> ParamConstraint {
        exact(TypeTag::Exception)
    }
}

impl<T: FromBoxed> FromBoxed for Vec<T> {
    fn from_boxed(value: &BoxedValue) -> Result<Self, EvalError> {
        let items = value
            .with_payload(|p| match p {
                Some(Payload::Vector(items)) => Some(items.clone()),
                _ => None,
            })
            .ok_or_else(|| cast_error(value, "Vector"))?;
        items.iter().map(T::from_boxed).collect()
    }

    fn constraint() -> ParamConstraint {
        exact(TypeTag::Vector)
    }
}

impl<T: FromBoxed> FromBoxed for BTreeMap<String, T> {
    fn from_boxed(value: &BoxedValue) -> Result<Self, EvalError> {
        let entries = value
            .with_payload(|p| match p {
                Some(Payload::Map(entries)) => Some(entries.clone()),
                _ => None,
            })
            .ok_or_else(|| cast_error(value, "Map"))?;
        entries
            .iter()
            .map(|(k, v)| Ok((k.clone(), T::from_boxed(v)?)))
            .collect()
    }

    fn constraint() -> ParamConstraint {
        exact(TypeTag::Map)
    }
}

impl<T: Any + Clone + Send + Sync> FromBoxed for Native<T> {
    fn from_boxed(value: &BoxedValue) -> Result<Self, EvalError> {
        value
            .with_native(|v: &T| Native(v.clone()))
            .ok_or_else(|| cast_error(value, std::any::type_name::<T>()))
    }

    fn constraint() -> ParamConstraint {
        exact(TypeTag::Native(TypeId::of::<T>()))
    }
}

impl<T: Any> FromBoxed for Mut<T> {
    fn from_boxed(value: &BoxedValue) -> Result<Self, EvalError> {
        if value.is_const() {
            return Err(const_violation(""));
        }
        if value.type_tag() != TypeTag::Native(TypeId::of::<T>()) {
            return Err(cast_error(value, std::any::type_name::<T>()));
        }
        Ok(Mut {
            value: value.clone(),
            marker: PhantomData,
        })
    }

    fn constraint() -> ParamConstraint {
        ParamConstraint::Exact {
            tag: TypeTag::Native(TypeId::of::<T>()),
            mutable: true,
        }
    }
}

// ===== NativeReturn =====

macro_rules! impl_native_return {
    ($($ty:ty),* $(,)?) => {
        $(
            impl NativeReturn for $ty {
                #[inline]
                fn into_result(self) -> Result<BoxedValue, EvalError> {
                    Ok(self.into_boxed())
                }
            }
        )*
    };
}

impl_native_return!(
    BoxedValue,
    (),
    bool,
    char,
    String,
    &str,
    Number,
    FunctionValue,
    ExceptionValue,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    f32,
    f64,
);

impl<T: IntoBoxed> NativeReturn for Vec<T> {
    fn into_result(self) -> Result<BoxedValue, EvalError> {
        Ok(self.into_boxed())
    }
}

impl<T: IntoBoxed> NativeReturn for BTreeMap<String, T> {
    fn into_result(self) -> Result<BoxedValue, EvalError> {
        Ok(self.into_boxed())
    }
}

impl<T: IntoBoxed> NativeReturn for Option<T> {
    fn into_result(self) -> Result<BoxedValue, EvalError> {
        Ok(self.into_boxed())
    }
}

impl<T: Any + Clone + Send + Sync> NativeReturn for Native<T> {
    fn into_result(self) -> Result<BoxedValue, EvalError> {
        Ok(self.into_boxed())
    }
}

/// Host errors keep their concrete type as the error source; an
/// `EvalError` is passed through unchanged.
impl<T: IntoBoxed, E> NativeReturn for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn into_result(self) -> Result<BoxedValue, EvalError> {
        self.map(IntoBoxed::into_boxed).map_err(EvalError::native)
    }
}

// ===== Argument tuples =====

/// Arguments for a host → script call.
pub trait IntoArgs {
    fn into_args(self) -> Vec<BoxedValue>;
}

impl IntoArgs for Vec<BoxedValue> {
    fn into_args(self) -> Vec<BoxedValue> {
        self
    }
}

impl IntoArgs for &[BoxedValue] {
    fn into_args(self) -> Vec<BoxedValue> {
        self.to_vec()
    }
}

macro_rules! impl_into_args {
    ($($arg:ident $var:ident),*) => {
        impl<$($arg: IntoBoxed),*> IntoArgs for ($($arg,)*) {
            fn into_args(self) -> Vec<BoxedValue> {
                let ($($var,)*) = self;
                vec![$($var.into_boxed()),*]
            }
        }
    };
}

impl_into_args!();
impl_into_args!(A a);
impl_into_args!(A a, B b);
impl_into_args!(A a, B b, C c);
impl_into_args!(A a, B b, C c, D d);
