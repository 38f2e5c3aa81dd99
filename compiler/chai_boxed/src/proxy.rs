//! Proxy functions.
//!
//! A [`ProxyFunction`] is one overload: its parameter constraints, an
//! optional guard and a body. The body is either a host closure, a script
//! function (evaluated by the interpreter) or a class constructor.
//!
//! Matching and ranking live here so the dispatch engine only has to
//! orchestrate: [`ProxyFunction::types_match`] for the type filter,
//! [`ProxyFunction::widen_args`] for the numeric-widening retry and
//! [`ProxyFunction::dominates`] for ranking.

use crate::convert::{FromBoxed, NativeReturn};
use crate::errors::{wrong_arg_count, EvalResult};
use crate::types::{ClassId, TypeRegistry, TypeTag};
use crate::value::BoxedValue;
use chai_ir::{ExprId, Name, SharedArena};
use smallvec::{smallvec, SmallVec};
use std::fmt;
use std::sync::Arc;

/// Host function body.
pub type NativeFn = Arc<dyn Fn(&[BoxedValue]) -> EvalResult + Send + Sync>;

/// Constraint on one parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamConstraint {
    /// Accepts every value.
    Any,
    /// Accepts values of exactly `tag`. A `mutable` parameter also rejects
    /// const values.
    Exact { tag: TypeTag, mutable: bool },
    /// Exact constraint by type name, resolved through the registry at
    /// call time (typed script parameters, `int x`).
    Named(String),
    /// Exact match to whatever the argument's runtime type is. Always
    /// passes; ranks as exact. Used for untyped script parameters.
    RuntimeExact,
}

impl ParamConstraint {
    /// Whether `arg` satisfies this constraint.
    pub fn accepts(&self, arg: &BoxedValue, registry: &TypeRegistry) -> bool {
        match self {
            ParamConstraint::Any | ParamConstraint::RuntimeExact => true,
            ParamConstraint::Exact { tag, mutable } => {
                !(*mutable && arg.is_const()) && !arg.is_undef() && arg.type_tag() == *tag
            }
            ParamConstraint::Named(name) => registry
                .lookup(name)
                .is_some_and(|tag| !arg.is_undef() && arg.type_tag() == tag),
        }
    }

    /// Ranking weight: exact constraints beat `Any`.
    #[inline]
    pub fn specificity(&self) -> u8 {
        match self {
            ParamConstraint::Any => 0,
            ParamConstraint::Exact { .. }
            | ParamConstraint::Named(_)
            | ParamConstraint::RuntimeExact => 1,
        }
    }

    /// The tag this constraint requires, if it names one.
    pub fn required_tag(&self, registry: &TypeRegistry) -> Option<TypeTag> {
        match self {
            ParamConstraint::Exact { tag, .. } => Some(*tag),
            ParamConstraint::Named(name) => registry.lookup(name),
            ParamConstraint::Any | ParamConstraint::RuntimeExact => None,
        }
    }

    /// `arg` converted so it satisfies this constraint by lossless numeric
    /// widening to a different kind, if that is possible. A const argument
    /// never widens into a mutable parameter.
    fn widen(&self, arg: &BoxedValue, registry: &TypeRegistry) -> Option<BoxedValue> {
        if matches!(self, ParamConstraint::Exact { mutable: true, .. }) && arg.is_const() {
            return None;
        }
        let target = self.required_tag(registry)?.number_kind()?;
        let number = arg.as_number()?;
        let kind = number.kind();
        (kind != target && kind.widens_to(target))
            .then(|| BoxedValue::number(number.convert(target)))
    }

    fn describe(&self, registry: &TypeRegistry) -> String {
        match self {
            ParamConstraint::Any | ParamConstraint::RuntimeExact => "any".to_string(),
            ParamConstraint::Exact { tag, mutable: true } => {
                format!("{} &", registry.name_of(*tag))
            }
            ParamConstraint::Exact { tag, .. } => registry.name_of(*tag),
            ParamConstraint::Named(name) => name.clone(),
        }
    }
}

/// A function defined in script.
#[derive(Clone, Debug)]
pub struct ScriptFunction {
    /// Parameter names; methods list `this` first.
    pub params: Vec<Name>,
    pub body: ExprId,
    /// Arena the body lives in.
    pub arena: SharedArena,
    /// Lambda captures, bound before the parameters on each call.
    pub captures: Vec<(Name, BoxedValue)>,
}

/// What calling a proxy function runs.
#[derive(Clone)]
pub enum ProxyBody {
    Native(NativeFn),
    Script(ScriptFunction),
    /// Creates an instance of `class`, then runs `init` with `this` bound
    /// to it (if the class declares a constructor).
    Constructor {
        class: ClassId,
        class_name: Arc<str>,
        init: Option<ScriptFunction>,
    },
}

impl fmt::Debug for ProxyBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyBody::Native(_) => f.write_str("Native(..)"),
            ProxyBody::Script(script) => f.debug_tuple("Script").field(&script.body).finish(),
            ProxyBody::Constructor { class_name, .. } => {
                f.debug_tuple("Constructor").field(class_name).finish()
            }
        }
    }
}

/// One callable overload.
#[derive(Clone, Debug)]
pub struct ProxyFunction {
    name: String,
    params: SmallVec<[ParamConstraint; 4]>,
    guard: Option<Arc<ProxyFunction>>,
    body: ProxyBody,
}

impl ProxyFunction {
    pub fn new(
        name: impl Into<String>,
        params: impl IntoIterator<Item = ParamConstraint>,
        body: ProxyBody,
    ) -> Self {
        ProxyFunction {
            name: name.into(),
            params: params.into_iter().collect(),
            guard: None,
            body,
        }
    }

    /// Wrap a typed host closure; constraints come from the parameter types.
    ///
    /// ```ignore
    /// let add = ProxyFunction::native("add", |a: i32, b: i32| a + b);
    /// ```
    pub fn native<Args, F: NativeCallable<Args>>(name: impl Into<String>, f: F) -> Self {
        Self::new(name, F::constraints(), ProxyBody::Native(f.into_native_fn()))
    }

    /// Wrap an untyped host closure over the raw argument slice.
    ///
    /// The slice always has exactly as many elements as `params`.
    pub fn native_raw<F>(
        name: impl Into<String>,
        params: impl IntoIterator<Item = ParamConstraint>,
        f: F,
    ) -> Self
    where
        F: Fn(&[BoxedValue]) -> EvalResult + Send + Sync + 'static,
    {
        Self::new(name, params, ProxyBody::Native(Arc::new(f)))
    }

    /// Attach a guard. The guard is called with the same arguments and must
    /// return `bool`.
    #[must_use]
    pub fn with_guard(mut self, guard: ProxyFunction) -> Self {
        self.guard = Some(Arc::new(guard));
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    #[inline]
    pub fn params(&self) -> &[ParamConstraint] {
        &self.params
    }

    #[inline]
    pub fn guard(&self) -> Option<&Arc<ProxyFunction>> {
        self.guard.as_ref()
    }

    #[inline]
    pub fn body(&self) -> &ProxyBody {
        &self.body
    }

    /// Type filter: arity and every parameter constraint.
    pub fn types_match(&self, args: &[BoxedValue], registry: &TypeRegistry) -> bool {
        args.len() == self.params.len()
            && self
                .params
                .iter()
                .zip(args)
                .all(|(param, arg)| param.accepts(arg, registry))
    }

    /// Arguments converted by lossless numeric widening so that every
    /// constraint passes; `None` if some argument can't be made to fit.
    pub fn widen_args(
        &self,
        args: &[BoxedValue],
        registry: &TypeRegistry,
    ) -> Option<Vec<BoxedValue>> {
        if args.len() != self.params.len() {
            return None;
        }
        self.params
            .iter()
            .zip(args)
            .map(|(param, arg)| {
                if param.accepts(arg, registry) {
                    Some(arg.clone())
                } else {
                    param.widen(arg, registry)
                }
            })
            .collect()
    }

    /// Whether `self` is at least as specific as `other` at every position
    /// and strictly more specific at one.
    pub fn dominates(&self, other: &ProxyFunction) -> bool {
        if self.arity() != other.arity() {
            return false;
        }
        let mut strictly = false;
        for (mine, theirs) in self.params.iter().zip(&other.params) {
            match mine.specificity().cmp(&theirs.specificity()) {
                std::cmp::Ordering::Less => return false,
                std::cmp::Ordering::Greater => strictly = true,
                std::cmp::Ordering::Equal => {}
            }
        }
        strictly
    }

    /// Human-readable signature, e.g. `add(int, any)`.
    pub fn signature(&self, registry: &TypeRegistry) -> String {
        let params: Vec<String> = self.params.iter().map(|p| p.describe(registry)).collect();
        let guard = if self.guard.is_some() { " : guard" } else { "" };
        format!("{}({}){guard}", self.name, params.join(", "))
    }
}

/// Host closures that can become native proxy functions.
///
/// Implemented for `Fn(A, B, ..) -> R` with up to four parameters, where
/// every parameter is [`FromBoxed`] and `R` is [`NativeReturn`].
pub trait NativeCallable<Args>: Send + Sync + 'static {
    fn constraints() -> SmallVec<[ParamConstraint; 4]>;

    fn into_native_fn(self) -> NativeFn;
}

macro_rules! count {
    () => { 0usize };
    ($head:ident $($tail:ident)*) => { 1usize + count!($($tail)*) };
}

macro_rules! impl_native_callable {
    ($($arg:ident $var:ident),*) => {
        impl<Func, Ret, $($arg,)*> NativeCallable<($($arg,)*)> for Func
        where
            Func: Fn($($arg),*) -> Ret + Send + Sync + 'static,
            Ret: NativeReturn,
            $($arg: FromBoxed,)*
        {
            fn constraints() -> SmallVec<[ParamConstraint; 4]> {
                smallvec![$($arg::constraint()),*]
            }

            fn into_native_fn(self) -> NativeFn {
                Arc::new(move |args: &[BoxedValue]| {
                    let [$($var),*] = args else {
                        return Err(wrong_arg_count(count!($($var)*), args.len()));
                    };
                    self($($arg::from_boxed($var)?),*).into_result()
                })
            }
        }
    };
}

impl_native_callable!();
impl_native_callable!(A a);
impl_native_callable!(A a, B b);
impl_native_callable!(A a, B b, C c);
impl_native_callable!(A a, B b, C c, D d);
