//! Conditionals, loops, exceptions and module loading.

use super::{Flow, Interpreter};
use chai_boxed::errors::module_error;
use chai_boxed::{BoxedValue, ControlAction, EvalError, ExceptionValue};
use chai_ir::{CatchRange, ExprId};

impl Interpreter {
    pub(super) fn eval_if(
        &mut self,
        cond: ExprId,
        then_branch: ExprId,
        else_branch: Option<ExprId>,
    ) -> Flow {
        if self.eval_condition(cond)? {
            self.eval(then_branch)
        } else if let Some(else_branch) = else_branch {
            self.eval(else_branch)
        } else {
            Ok(BoxedValue::void())
        }
    }

    pub(super) fn eval_while(&mut self, cond: ExprId, body: ExprId) -> Flow {
        while self.eval_condition(cond)? {
            match self.eval(body) {
                Ok(_) | Err(ControlAction::Continue) => {}
                Err(ControlAction::Break) => break,
                Err(other) => return Err(other),
            }
        }
        Ok(BoxedValue::void())
    }

    pub(super) fn eval_for(
        &mut self,
        init: Option<ExprId>,
        cond: Option<ExprId>,
        step: Option<ExprId>,
        body: ExprId,
    ) -> Flow {
        self.with_scope(|this| {
            if let Some(init) = init {
                this.eval(init)?;
            }
            loop {
                if let Some(cond) = cond {
                    if !this.eval_condition(cond)? {
                        break;
                    }
                }
                match this.eval(body) {
                    Ok(_) | Err(ControlAction::Continue) => {}
                    Err(ControlAction::Break) => break,
                    Err(other) => return Err(other),
                }
                if let Some(step) = step {
                    this.eval(step)?;
                }
            }
            Ok(BoxedValue::void())
        })
    }

    /// `try` / `catch` / `finally`.
    ///
    /// Only errors are caught; `return`, `break` and `continue` pass
    /// through. `finally` runs on every exit, and an error or control
    /// action raised by `finally` replaces the original outcome.
    pub(super) fn eval_try(
        &mut self,
        body: ExprId,
        catches: CatchRange,
        finally: Option<ExprId>,
    ) -> Flow {
        let outcome = match self.eval(body) {
            Err(ControlAction::Error(err)) => self.handle_catch(*err, catches),
            other => other,
        };
        if let Some(finally) = finally {
            self.eval(finally)?;
        }
        outcome
    }

    /// Run the first matching `catch` clause, or rethrow.
    fn handle_catch(&mut self, err: EvalError, catches: CatchRange) -> Flow {
        let value = exception_value(&err);
        let arena = self.arena.clone();
        for clause in arena.get_catches(catches) {
            if let Some(ty) = clause.ty {
                let type_name = self.name_str(ty);
                let matches = self
                    .state
                    .types
                    .read()
                    .lookup(&type_name)
                    .is_some_and(|tag| !value.is_undef() && tag == value.type_tag());
                if !matches {
                    continue;
                }
            }
            tracing::debug!(kind = err.kind.category(), "caught");
            let (binding, body) = (clause.binding, clause.body);
            return self.with_scope(|this| {
                if let Some(binding) = binding {
                    this.env.define(binding, value.clone())?;
                }
                this.eval(body)
            });
        }
        Err(err.into())
    }

    /// `use(path)` / `eval_file(path)`.
    ///
    /// The file runs at top level, so its definitions become globals. With
    /// `once`, a file already loaded through `use` is skipped and the call
    /// yields undefined. A file is marked loaded while it runs and unmarked
    /// again if it fails.
    pub(super) fn load_module(&mut self, path: &str, once: bool) -> Flow {
        let Some(modules) = self.state.modules.clone() else {
            return Err(module_error(path, "module loading is disabled").into());
        };
        let resolved = modules.resolver.resolve(path)?;
        if once && self.state.used_files.read().contains(&resolved) {
            tracing::debug!(path = %resolved.display(), "already used");
            return Ok(BoxedValue::undefined());
        }
        let program = modules.load(&resolved, &self.state.interner)?;
        if once {
            self.state.used_files.write().insert(resolved.clone());
        }
        tracing::debug!(path = %resolved.display(), once, "loading module");
        let root = program.root;
        let result = self
            .with_frame(program.arena, None, |this| this.eval(root))
            .map_err(|action| match action {
                ControlAction::Return(_) | ControlAction::Break | ControlAction::Continue => {
                    action.into_error().into()
                }
                error @ ControlAction::Error(_) => error,
            });
        // A failed `use` may be retried.
        if once && result.is_err() {
            self.state.used_files.write().remove(&resolved);
        }
        result
    }
}

/// The value a `catch` clause binds for `err`.
///
/// A script `throw` yields the thrown value; any other error becomes an
/// `exception` whose kind is the error's category.
pub fn exception_value(err: &EvalError) -> BoxedValue {
    match &err.thrown {
        Some(thrown) => thrown.clone(),
        None => {
            let mut exception = ExceptionValue::new(err.kind.category(), err.message.clone());
            exception.source = err.native.clone();
            BoxedValue::exception(exception)
        }
    }
}
