//! Numeric boxing helper.
//!
//! Script numbers keep the exact host type they were created with (`int`,
//! `unsigned_long`, `float`, ...). This module provides:
//!
//! - [`Number`]: a tagged numeric payload
//! - [`NumericCast`]: extraction to any primitive with `as` semantics
//!   (integer truncation and wrap, float to int saturating toward zero,
//!   NaN to zero)
//! - script arithmetic with C-style promotion and wrapping integer ops
//! - [`NumberKind::widens_to`]: the lossless widening relation used when
//!   dispatch retries a failed call with converted arguments

use crate::errors::{division_by_zero, modulo_by_zero, type_mismatch, EvalError};
use crate::value::BoxedValue;
use chai_ir::{BinaryOp, UnaryOp};
use std::cmp::Ordering;
use std::fmt;

/// Width and signedness of a numeric type.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub enum NumberKind {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl NumberKind {
    pub const ALL: [NumberKind; 10] = [
        NumberKind::I8,
        NumberKind::I16,
        NumberKind::I32,
        NumberKind::I64,
        NumberKind::U8,
        NumberKind::U16,
        NumberKind::U32,
        NumberKind::U64,
        NumberKind::F32,
        NumberKind::F64,
    ];

    /// Script-visible type name.
    pub fn type_name(self) -> &'static str {
        match self {
            NumberKind::I8 => "int8",
            NumberKind::I16 => "int16",
            NumberKind::I32 => "int",
            NumberKind::I64 => "long",
            NumberKind::U8 => "uint8",
            NumberKind::U16 => "uint16",
            NumberKind::U32 => "unsigned",
            NumberKind::U64 => "unsigned_long",
            NumberKind::F32 => "float",
            NumberKind::F64 => "double",
        }
    }

    #[inline]
    pub fn is_float(self) -> bool {
        matches!(self, NumberKind::F32 | NumberKind::F64)
    }

    #[inline]
    pub fn is_signed(self) -> bool {
        matches!(
            self,
            NumberKind::I8 | NumberKind::I16 | NumberKind::I32 | NumberKind::I64
        )
    }

    #[inline]
    pub fn bits(self) -> u32 {
        match self {
            NumberKind::I8 | NumberKind::U8 => 8,
            NumberKind::I16 | NumberKind::U16 => 16,
            NumberKind::I32 | NumberKind::U32 | NumberKind::F32 => 32,
            NumberKind::I64 | NumberKind::U64 | NumberKind::F64 => 64,
        }
    }

    /// Whether every value of `self` is exactly representable in `target`.
    ///
    /// Reflexive. Integers widen to wider integers of the same signedness,
    /// unsigned integers also to strictly wider signed integers, and to
    /// floats whose mantissa holds them (`f32`: up to 16 bits, `f64`: up to
    /// 32 bits). `f32` widens to `f64`.
    pub fn widens_to(self, target: NumberKind) -> bool {
        if self == target {
            return true;
        }
        match (self.is_float(), target.is_float()) {
            (true, true) => self == NumberKind::F32 && target == NumberKind::F64,
            (true, false) => false,
            (false, true) => {
                let limit = if target == NumberKind::F32 { 16 } else { 32 };
                self.bits() <= limit
            }
            (false, false) => match (self.is_signed(), target.is_signed()) {
                (true, true) | (false, false) => self.bits() <= target.bits(),
                (false, true) => self.bits() < target.bits(),
                (true, false) => false,
            },
        }
    }

    /// Kind an operand takes part in arithmetic as: integers narrower than
    /// `int` become `int`.
    fn promoted(self) -> NumberKind {
        if !self.is_float() && self.bits() < 32 {
            NumberKind::I32
        } else {
            self
        }
    }

    /// Common kind of a binary arithmetic operation.
    ///
    /// Floats beat integers and `double` beats `float`; otherwise the wider
    /// promoted integer wins, and at equal width unsigned beats signed.
    pub fn common(self, other: NumberKind) -> NumberKind {
        if self.is_float() || other.is_float() {
            if self == NumberKind::F64 || other == NumberKind::F64 {
                return NumberKind::F64;
            }
            return NumberKind::F32;
        }
        let (a, b) = (self.promoted(), other.promoted());
        match a.bits().cmp(&b.bits()) {
            Ordering::Greater => a,
            Ordering::Less => b,
            Ordering::Equal if !a.is_signed() => a,
            Ordering::Equal => b,
        }
    }
}

impl fmt::Display for NumberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A number together with its exact type.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Number {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
}

/// Apply `$body` to the primitive inside any `Number` variant.
macro_rules! with_number {
    ($n:expr, $v:ident => $body:expr) => {
        match $n {
            Number::I8($v) => $body,
            Number::I16($v) => $body,
            Number::I32($v) => $body,
            Number::I64($v) => $body,
            Number::U8($v) => $body,
            Number::U16($v) => $body,
            Number::U32($v) => $body,
            Number::U64($v) => $body,
            Number::F32($v) => $body,
            Number::F64($v) => $body,
        }
    };
}

/// Primitive numeric types that a [`Number`] can be extracted as.
pub trait NumericCast: Copy + Send + Sync + 'static {
    const KIND: NumberKind;

    /// Convert with `as` semantics.
    fn from_number(n: Number) -> Self;

    fn into_number(self) -> Number;
}

macro_rules! impl_numeric_cast {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl NumericCast for $ty {
                const KIND: NumberKind = NumberKind::$variant;

                #[inline]
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_possible_wrap,
                    clippy::cast_precision_loss,
                    clippy::cast_lossless,
                    reason = "numeric conversion follows `as` semantics"
                )]
                fn from_number(n: Number) -> Self {
                    with_number!(n, v => v as $ty)
                }

                #[inline]
                fn into_number(self) -> Number {
                    Number::$variant(self)
                }
            }
        )*
    };
}

impl_numeric_cast!(
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
);

/// Wrapping integer arithmetic for one primitive type.
macro_rules! int_arith {
    ($op:expr, $a:expr, $b:expr, $variant:ident) => {{
        let (a, b) = ($a, $b);
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "shift amounts wrap like the shifted operand"
        )]
        let shift = b as u32;
        Number::$variant(match $op {
            BinaryOp::Add => a.wrapping_add(b),
            BinaryOp::Sub => a.wrapping_sub(b),
            BinaryOp::Mul => a.wrapping_mul(b),
            BinaryOp::Div => {
                if b == 0 {
                    return Err(division_by_zero());
                }
                a.wrapping_div(b)
            }
            BinaryOp::Mod => {
                if b == 0 {
                    return Err(modulo_by_zero());
                }
                a.wrapping_rem(b)
            }
            BinaryOp::BitAnd => a & b,
            BinaryOp::BitOr => a | b,
            BinaryOp::BitXor => a ^ b,
            BinaryOp::Shl => a.wrapping_shl(shift),
            BinaryOp::Shr => a.wrapping_shr(shift),
            other => return Err(not_arithmetic(other)),
        })
    }};
}

macro_rules! float_arith {
    ($op:expr, $a:expr, $b:expr, $variant:ident) => {{
        let (a, b) = ($a, $b);
        Number::$variant(match $op {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            BinaryOp::Mod => a % b,
            other => return Err(not_arithmetic(other)),
        })
    }};
}

#[cold]
fn not_arithmetic(op: BinaryOp) -> EvalError {
    type_mismatch(
        "integer operands",
        &format!("operator `{}` on numbers", op.as_symbol()),
    )
}

impl Number {
    #[inline]
    pub fn kind(self) -> NumberKind {
        match self {
            Number::I8(_) => NumberKind::I8,
            Number::I16(_) => NumberKind::I16,
            Number::I32(_) => NumberKind::I32,
            Number::I64(_) => NumberKind::I64,
            Number::U8(_) => NumberKind::U8,
            Number::U16(_) => NumberKind::U16,
            Number::U32(_) => NumberKind::U32,
            Number::U64(_) => NumberKind::U64,
            Number::F32(_) => NumberKind::F32,
            Number::F64(_) => NumberKind::F64,
        }
    }

    /// Extract as `T` with `as` semantics.
    #[inline]
    pub fn get_as<T: NumericCast>(self) -> T {
        T::from_number(self)
    }

    /// Convert to `kind` with `as` semantics.
    pub fn convert(self, kind: NumberKind) -> Number {
        match kind {
            NumberKind::I8 => Number::I8(self.get_as()),
            NumberKind::I16 => Number::I16(self.get_as()),
            NumberKind::I32 => Number::I32(self.get_as()),
            NumberKind::I64 => Number::I64(self.get_as()),
            NumberKind::U8 => Number::U8(self.get_as()),
            NumberKind::U16 => Number::U16(self.get_as()),
            NumberKind::U32 => Number::U32(self.get_as()),
            NumberKind::U64 => Number::U64(self.get_as()),
            NumberKind::F32 => Number::F32(self.get_as()),
            NumberKind::F64 => Number::F64(self.get_as()),
        }
    }

    /// Whether the value is zero (used for truthiness of conditions).
    pub fn is_zero(self) -> bool {
        self.get_as::<f64>() == 0.0
    }

    /// Arithmetic and bitwise operators.
    ///
    /// Both operands are converted to their [`NumberKind::common`] kind
    /// first. Integer operations wrap; integer division or remainder by
    /// zero fails. Bitwise operators on floats fail with a type mismatch.
    pub fn arith(self, op: BinaryOp, rhs: Number) -> Result<Number, EvalError> {
        let kind = self.kind().common(rhs.kind());
        Ok(match (self.convert(kind), rhs.convert(kind)) {
            (Number::I32(a), Number::I32(b)) => int_arith!(op, a, b, I32),
            (Number::I64(a), Number::I64(b)) => int_arith!(op, a, b, I64),
            (Number::U32(a), Number::U32(b)) => int_arith!(op, a, b, U32),
            (Number::U64(a), Number::U64(b)) => int_arith!(op, a, b, U64),
            (Number::F32(a), Number::F32(b)) => float_arith!(op, a, b, F32),
            (Number::F64(a), Number::F64(b)) => float_arith!(op, a, b, F64),
            // `common` never yields a sub-int kind
            (a, _) => return Err(type_mismatch("promoted number", a.kind().type_name())),
        })
    }

    /// Compare in the common kind of both operands.
    pub fn compare(self, rhs: Number) -> Option<Ordering> {
        let kind = self.kind().common(rhs.kind());
        match (self.convert(kind), rhs.convert(kind)) {
            (Number::I32(a), Number::I32(b)) => Some(a.cmp(&b)),
            (Number::I64(a), Number::I64(b)) => Some(a.cmp(&b)),
            (Number::U32(a), Number::U32(b)) => Some(a.cmp(&b)),
            (Number::U64(a), Number::U64(b)) => Some(a.cmp(&b)),
            (Number::F32(a), Number::F32(b)) => a.partial_cmp(&b),
            (Number::F64(a), Number::F64(b)) => a.partial_cmp(&b),
            _ => None,
        }
    }

    /// Evaluate a comparison operator. NaN compares unequal to everything.
    pub fn compare_op(self, op: BinaryOp, rhs: Number) -> Result<bool, EvalError> {
        let ord = self.compare(rhs);
        Ok(match op {
            BinaryOp::Eq => ord == Some(Ordering::Equal),
            BinaryOp::NotEq => ord != Some(Ordering::Equal),
            BinaryOp::Lt => ord == Some(Ordering::Less),
            BinaryOp::LtEq => matches!(ord, Some(Ordering::Less | Ordering::Equal)),
            BinaryOp::Gt => ord == Some(Ordering::Greater),
            BinaryOp::GtEq => matches!(ord, Some(Ordering::Greater | Ordering::Equal)),
            other => return Err(not_arithmetic(other)),
        })
    }

    /// `-x` and `~x`. Sub-int operands are promoted to `int` first.
    pub fn unary(self, op: UnaryOp) -> Result<Number, EvalError> {
        let promoted = self.convert(self.kind().promoted());
        Ok(match (op, promoted) {
            (UnaryOp::Neg, Number::I32(v)) => Number::I32(v.wrapping_neg()),
            (UnaryOp::Neg, Number::I64(v)) => Number::I64(v.wrapping_neg()),
            (UnaryOp::Neg, Number::U32(v)) => Number::U32(v.wrapping_neg()),
            (UnaryOp::Neg, Number::U64(v)) => Number::U64(v.wrapping_neg()),
            (UnaryOp::Neg, Number::F32(v)) => Number::F32(-v),
            (UnaryOp::Neg, Number::F64(v)) => Number::F64(-v),
            (UnaryOp::BitNot, Number::I32(v)) => Number::I32(!v),
            (UnaryOp::BitNot, Number::I64(v)) => Number::I64(!v),
            (UnaryOp::BitNot, Number::U32(v)) => Number::U32(!v),
            (UnaryOp::BitNot, Number::U64(v)) => Number::U64(!v),
            (op, n) => {
                return Err(type_mismatch(
                    "integer operand",
                    &format!("`{}` on {}", op.as_symbol(), n.kind()),
                ))
            }
        })
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::F32(v) => {
                if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e7 {
                    write!(f, "{v:.1}")
                } else {
                    write!(f, "{v}")
                }
            }
            Number::F64(v) => write_double(f, *v),
            other => with_number!(other, v => write!(f, "{v}")),
        }
    }
}

/// Floats always print with a fractional part so `to_string(1.0)` reads
/// back as a double.
fn write_double(f: &mut fmt::Formatter<'_>, v: f64) -> fmt::Result {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        write!(f, "{v:.1}")
    } else {
        write!(f, "{v}")
    }
}

/// A boxed number viewed through the numeric helper.
///
/// Snapshots the number at construction; later writes to the source value
/// are not observed.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoxedNumber(Number);

impl BoxedNumber {
    /// View `value` as a number; fails with a cast error otherwise.
    pub fn new(value: &BoxedValue) -> Result<Self, EvalError> {
        match value.as_number() {
            Some(n) => Ok(BoxedNumber(n)),
            None => Err(crate::errors::bad_cast(&value.type_name_hint(), "number")),
        }
    }

    #[inline]
    pub fn number(self) -> Number {
        self.0
    }

    #[inline]
    pub fn kind(self) -> NumberKind {
        self.0.kind()
    }

    /// Extract as `T` following the numeric conversion graph.
    #[inline]
    pub fn get_as<T: NumericCast>(self) -> T {
        self.0.get_as()
    }

    /// An owned boxed value holding this number converted to `kind`.
    pub fn to_kind(self, kind: NumberKind) -> BoxedValue {
        BoxedValue::number(self.0.convert(kind))
    }
}

impl From<Number> for BoxedNumber {
    fn from(n: Number) -> Self {
        BoxedNumber(n)
    }
}
