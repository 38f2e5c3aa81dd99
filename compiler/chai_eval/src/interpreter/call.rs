//! Function calls: argument evaluation, dispatch and invocation.

use super::access::object_attr;
use super::{Flow, Interpreter};
use crate::dispatch::{self, Selected};
use crate::Scope;
use chai_boxed::errors::{not_callable, recursion_limit_exceeded, type_mismatch};
use chai_boxed::{
    BacktraceFrame, BoxedValue, ClassId, ControlAction, EvalError, EvalResult, FunctionValue,
    ObjectInstance, Payload, ProxyBody, ProxyFunction, ScriptFunction,
};
use chai_ir::{ExprId, ExprKind, ExprRange, Name, Span};
use std::collections::BTreeMap;
use std::sync::Arc;

impl Interpreter {
    /// Evaluate arguments left to right.
    pub(super) fn eval_args(&mut self, args: ExprRange) -> Result<Vec<BoxedValue>, ControlAction> {
        let arena = self.arena.clone();
        arena
            .get_expr_list(args)
            .iter()
            .map(|&arg| self.eval(arg))
            .collect()
    }

    pub(super) fn eval_call(&mut self, callee: ExprId, args: ExprRange, span: Span) -> Flow {
        // A bare name that is not a variable calls the overload set directly.
        if let ExprKind::Ident(name) = self.arena.get_expr(callee).kind.clone() {
            if self.env.lookup(name).is_none() {
                let args = self.eval_args(args)?;
                return Ok(self.call_named(name, args, Some(span))?);
            }
        }
        let function = self.eval(callee)?;
        let args = self.eval_args(args)?;
        Ok(self.call_value(&function, args, Some(span))?)
    }

    /// `receiver.method(args)`: an object attribute holding a function is
    /// called with `args`; otherwise `method` is dispatched with the
    /// receiver as first argument.
    pub(super) fn eval_method_call(
        &mut self,
        receiver: ExprId,
        method: Name,
        args: ExprRange,
        span: Span,
    ) -> Flow {
        let target = self.eval(receiver)?;
        let args = self.eval_args(args)?;
        if let Some(attr) = object_attr(&target, &self.name_str(method)) {
            if attr.as_function().is_some() {
                return Ok(self.call_value(&attr, args, Some(span))?);
            }
        }
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push(target);
        full.extend(args);
        Ok(self.call_named(method, full, Some(span))?)
    }

    /// Call a value that should hold a function.
    pub(crate) fn call_value(
        &mut self,
        function: &BoxedValue,
        args: Vec<BoxedValue>,
        span: Option<Span>,
    ) -> EvalResult {
        match function.as_function() {
            Some(function) => self.call_function_value(&function, args, span),
            None => Err(not_callable(&function.type_name_hint())),
        }
    }

    pub(crate) fn call_function_value(
        &mut self,
        function: &FunctionValue,
        args: Vec<BoxedValue>,
        span: Option<Span>,
    ) -> EvalResult {
        match function {
            FunctionValue::Overloads(name) => self.call_named(*name, args, span),
            FunctionValue::Proxy(proxy) => {
                let selected = self.select(proxy.name(), std::slice::from_ref(proxy), &args)?;
                self.invoke(&selected.function, &selected.args, span)
            }
        }
    }

    /// Dispatch a call to the overloads registered under `name`.
    pub(crate) fn call_named(
        &mut self,
        name: Name,
        args: Vec<BoxedValue>,
        span: Option<Span>,
    ) -> EvalResult {
        let overloads = self.state.functions.read().overloads(name);
        let name_str = self.name_str(name);
        let selected = self.select(&name_str, &overloads, &args)?;
        self.invoke(&selected.function, &selected.args, span)
    }

    fn select(
        &mut self,
        name: &str,
        overloads: &[Arc<ProxyFunction>],
        args: &[BoxedValue],
    ) -> Result<Selected, EvalError> {
        let types = self.state.types.clone();
        dispatch::resolve(name, overloads, args, &types, |guard, guard_args| {
            self.check_guard(guard, guard_args)
        })
    }

    fn check_guard(&mut self, guard: &ProxyFunction, args: &[BoxedValue]) -> Result<bool, EvalError> {
        let result = self.invoke(guard, args, None)?;
        result
            .as_bool()
            .ok_or_else(|| type_mismatch("bool guard result", &result.type_name_hint()))
    }

    /// Run a selected overload's body.
    pub(crate) fn invoke(
        &mut self,
        function: &ProxyFunction,
        args: &[BoxedValue],
        span: Option<Span>,
    ) -> EvalResult {
        match function.body() {
            ProxyBody::Native(native) => native(args),
            ProxyBody::Script(script) => self.call_script(function.name(), script, args.to_vec(), span),
            ProxyBody::Constructor {
                class,
                class_name,
                init,
            } => self.construct(*class, class_name, init.as_ref(), args, span),
        }
    }

    /// Run a script function body in a new frame.
    ///
    /// Parameters are bound to the argument handles themselves, so a
    /// function that assigns to a parameter writes through to the caller's
    /// value.
    fn call_script(
        &mut self,
        name: &str,
        script: &ScriptFunction,
        args: Vec<BoxedValue>,
        span: Option<Span>,
    ) -> EvalResult {
        self.depth
            .enter()
            .map_err(|exceeded| recursion_limit_exceeded(exceeded.max))?;
        self.call_stack.push(BacktraceFrame {
            name: name.to_string(),
            span,
        });

        let mut scope = Scope::new();
        for (capture, value) in &script.captures {
            scope.define(*capture, value.clone());
        }
        for (param, value) in script.params.iter().zip(args) {
            scope.define(*param, value);
        }
        let body = script.body;
        let result = match self.with_frame(script.arena.clone(), Some(scope), |this| this.eval(body)) {
            Ok(value) | Err(ControlAction::Return(value)) => Ok(value),
            Err(action) => {
                let err = action.into_error();
                Err(if err.backtrace.is_none() {
                    let backtrace = self.backtrace();
                    err.with_backtrace(backtrace)
                } else {
                    err
                })
            }
        };

        self.call_stack.pop();
        self.depth.exit();
        result
    }

    /// Build a script object and run its `init` body on it.
    fn construct(
        &mut self,
        class: ClassId,
        class_name: &Arc<str>,
        init: Option<&ScriptFunction>,
        args: &[BoxedValue],
        span: Option<Span>,
    ) -> EvalResult {
        let attrs: BTreeMap<String, BoxedValue> = self
            .state
            .types
            .read()
            .class(class)
            .map(|meta| {
                meta.attrs
                    .iter()
                    .map(|attr| (attr.clone(), BoxedValue::undefined()))
                    .collect()
            })
            .unwrap_or_default();
        let object = BoxedValue::new(Payload::Object(ObjectInstance {
            class,
            class_name: Arc::clone(class_name),
            attrs,
        }));
        if let Some(init) = init {
            let mut full = Vec::with_capacity(args.len() + 1);
            full.push(object.clone());
            full.extend_from_slice(args);
            self.call_script(class_name, init, full, span)?;
        }
        Ok(object)
    }
}
