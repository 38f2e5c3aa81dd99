//! `def`, `class`, `attr` and lambdas.

use super::{Flow, Interpreter};
use chai_boxed::errors::undefined_variable;
use chai_boxed::{
    BoxedValue, EvalError, FunctionValue, ParamConstraint, ProxyBody, ProxyFunction,
    ScriptFunction,
};
use chai_ir::{ExprId, ExprKind, ExprRange, Name, NameRange, Param, ParamRange};
use std::sync::Arc;

impl Interpreter {
    /// Register a script function.
    ///
    /// With `class` set, the function is a method taking `this` first; a
    /// method named after its class is that class's constructor.
    pub(super) fn define_function(
        &mut self,
        name: Name,
        class: Option<Name>,
        params: ParamRange,
        guard: Option<ExprId>,
        body: ExprId,
    ) -> Result<(), EvalError> {
        let arena = self.arena.clone();
        let params = arena.get_params(params);
        let user_constraints: Vec<ParamConstraint> =
            params.iter().map(|p| self.param_constraint(p)).collect();
        let user_names = params.iter().map(|p| p.name);

        let (param_names, constraints, body) = match class {
            Some(class) => {
                let class_name = self.name_str(class);
                let class_id = self.state.types.write().register_class(&class_name)?;
                let param_names: Vec<Name> =
                    std::iter::once(self.names.this).chain(user_names).collect();
                if class == name {
                    let init = ScriptFunction {
                        params: param_names.clone(),
                        body,
                        arena: arena.clone(),
                        captures: Vec::new(),
                    };
                    let body = ProxyBody::Constructor {
                        class: class_id,
                        class_name,
                        init: Some(init),
                    };
                    // The guard of a constructor sees only the user arguments.
                    let guard_names = param_names[1..].to_vec();
                    self.register(name, guard_names, user_constraints, guard, body);
                    return Ok(());
                }
                let constraints = std::iter::once(ParamConstraint::Named(class_name.to_string()))
                    .chain(user_constraints)
                    .collect();
                (param_names, constraints, body)
            }
            None => (user_names.collect(), user_constraints, body),
        };

        let script = ScriptFunction {
            params: param_names.clone(),
            body,
            arena,
            captures: Vec::new(),
        };
        self.register(name, param_names, constraints, guard, ProxyBody::Script(script));
        Ok(())
    }

    fn register(
        &mut self,
        name: Name,
        param_names: Vec<Name>,
        constraints: Vec<ParamConstraint>,
        guard: Option<ExprId>,
        body: ProxyBody,
    ) {
        let name_str = self.name_str(name);
        let arity = constraints.len();
        let mut function = ProxyFunction::new(&*name_str, constraints, body);
        if let Some(guard) = guard {
            let guard_body = ScriptFunction {
                params: param_names,
                body: guard,
                arena: self.arena.clone(),
                captures: Vec::new(),
            };
            function = function.with_guard(ProxyFunction::new(
                format!("{name_str} guard"),
                std::iter::repeat(ParamConstraint::Any).take(arity),
                ProxyBody::Script(guard_body),
            ));
        }
        tracing::debug!(name = %name_str, arity, guarded = guard.is_some(), "define function");
        self.state.functions.write().add(name, Arc::new(function));
    }

    pub(super) fn eval_class(&mut self, name: Name, members: ExprRange) -> Flow {
        let class_name = self.name_str(name);
        let class_id = self.state.types.write().register_class(&class_name)?;
        let arena = self.arena.clone();
        for &member in arena.get_expr_list(members) {
            match arena.get_expr(member).kind.clone() {
                ExprKind::Def {
                    name: method,
                    params,
                    guard,
                    body,
                    ..
                } => self.define_function(method, Some(name), params, guard, body)?,
                ExprKind::Attr { name: attr, .. } => {
                    let attr = self.name_str(attr);
                    self.state.types.write().add_class_attr(class_id, &attr);
                }
                _ => {
                    self.eval(member)?;
                }
            }
        }

        if !self.state.functions.read().contains(name) {
            let constructor = ProxyFunction::new(
                &*class_name,
                [],
                ProxyBody::Constructor {
                    class: class_id,
                    class_name: Arc::clone(&class_name),
                    init: None,
                },
            );
            self.state.functions.write().add(name, Arc::new(constructor));
        }
        tracing::debug!(class = %class_name, "define class");
        Ok(BoxedValue::void())
    }

    /// `attr Class::name` outside a class body.
    pub(super) fn eval_attr(&mut self, class: Option<Name>, name: Name) -> Flow {
        let Some(class) = class else {
            return Err(EvalError::new("`attr` outside of a class needs a `Class::` prefix").into());
        };
        let class_id = self.state.types.write().register_class(&self.name_str(class))?;
        let attr = self.name_str(name);
        self.state.types.write().add_class_attr(class_id, &attr);
        Ok(BoxedValue::void())
    }

    /// Build a closure. Captured names alias the current bindings.
    pub(super) fn eval_lambda(
        &mut self,
        captures: NameRange,
        params: ParamRange,
        body: ExprId,
    ) -> Flow {
        let arena = self.arena.clone();
        let mut captured = Vec::new();
        for &name in arena.get_names(captures) {
            let value = self
                .env
                .lookup(name)
                .ok_or_else(|| undefined_variable(&self.name_str(name)))?;
            captured.push((name, value));
        }
        let params = arena.get_params(params);
        let constraints: Vec<ParamConstraint> =
            params.iter().map(|p| self.param_constraint(p)).collect();
        let script = ScriptFunction {
            params: params.iter().map(|p| p.name).collect(),
            body,
            arena: arena.clone(),
            captures: captured,
        };
        let function = ProxyFunction::new("lambda", constraints, ProxyBody::Script(script));
        Ok(BoxedValue::function(FunctionValue::Proxy(Arc::new(function))))
    }

    /// Typed parameters match their named type; untyped ones match anything
    /// and rank as exact.
    fn param_constraint(&self, param: &Param) -> ParamConstraint {
        match param.ty {
            Some(ty) => ParamConstraint::Named(self.name_str(ty).to_string()),
            None => ParamConstraint::RuntimeExact,
        }
    }
}
