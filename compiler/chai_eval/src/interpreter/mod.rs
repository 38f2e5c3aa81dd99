//! Tree-walking interpreter for Chai scripts.
//!
//! Every node evaluates to a [`BoxedValue`]. Non-local exits (`return`,
//! `break`, `continue`, errors) travel as [`ControlAction`] in the error
//! channel and are caught by the construct that owns them.
//!
//! The interpreter holds no state of its own beyond the local scope stack
//! and the call stack; functions, types, globals and the used-file set live
//! in the shared [`EngineState`], so consecutive evaluations see each
//! other's definitions.

mod access;
mod call;
mod control;
mod definitions;
mod operators;

pub use control::exception_value;

use crate::{
    stdout_handler, DispatchTable, Environment, Globals, ModuleSystem, Program,
    SharedMutableRegistry, SharedPrintHandler,
};
use chai_boxed::{
    BacktraceFrame, BoxedValue, ControlAction, EvalBacktrace, EvalResult, FunctionValue, Number,
    TypeRegistry,
};
use chai_ir::{
    ExprArena, ExprId, ExprKind, ExprRange, Name, NumberLit, SharedArena, SharedInterner,
};
use chai_stack::{ensure_sufficient_stack, CallDepth, DEFAULT_MAX_CALL_DEPTH};
use rustc_hash::FxHashSet;
use std::path::PathBuf;
use std::sync::Arc;

/// Result of evaluating one node.
pub(crate) type Flow = Result<BoxedValue, ControlAction>;

/// Innermost call frames kept in an error backtrace.
const MAX_BACKTRACE_FRAMES: usize = 32;

/// Engine-wide state shared by every interpreter of one engine.
///
/// Cloning shares the registries.
#[derive(Clone, Debug)]
pub struct EngineState {
    pub interner: SharedInterner,
    pub functions: SharedMutableRegistry<DispatchTable>,
    pub types: SharedMutableRegistry<TypeRegistry>,
    pub globals: SharedMutableRegistry<Globals>,
    /// Files already loaded by `use`, by canonical path.
    pub used_files: SharedMutableRegistry<FxHashSet<PathBuf>>,
    /// Parser and resolver for `use` and `eval_file`; `None` disables both.
    pub modules: Option<ModuleSystem>,
    pub print: SharedPrintHandler,
    pub max_call_depth: usize,
}

impl EngineState {
    pub fn new() -> Self {
        EngineState {
            interner: SharedInterner::new(),
            functions: SharedMutableRegistry::new(DispatchTable::new()),
            types: SharedMutableRegistry::new(TypeRegistry::new()),
            globals: SharedMutableRegistry::new(Globals::new()),
            used_files: SharedMutableRegistry::new(FxHashSet::default()),
            modules: None,
            print: stdout_handler(),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    /// Register a function overload under `name`.
    pub fn add_function(&self, name: &str, function: chai_boxed::ProxyFunction) {
        let name = self.interner.intern(name);
        self.functions.write().add(name, Arc::new(function));
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::new()
    }
}

/// Names the evaluator looks up on hot paths, interned once.
#[derive(Clone, Copy)]
pub(crate) struct InternedNames {
    pub(crate) this: Name,
    pub(crate) index: Name,
}

impl InternedNames {
    fn new(interner: &SharedInterner) -> Self {
        InternedNames {
            this: interner.intern("this"),
            index: interner.intern("[]"),
        }
    }
}

/// Evaluator for one thread of execution.
pub struct Interpreter {
    pub(crate) state: EngineState,
    pub(crate) env: Environment,
    /// Arena of the code currently executing.
    pub(crate) arena: SharedArena,
    depth: CallDepth,
    call_stack: Vec<BacktraceFrame>,
    pub(crate) names: InternedNames,
}

impl Interpreter {
    pub fn new(state: EngineState) -> Self {
        let names = InternedNames::new(&state.interner);
        Interpreter {
            env: Environment::new(state.globals.clone()),
            arena: SharedArena::new(ExprArena::new()),
            depth: CallDepth::new(state.max_call_depth),
            call_stack: Vec::new(),
            names,
            state,
        }
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Evaluate a parsed program at top level.
    ///
    /// Declarations at the top level become globals.
    pub fn eval_program(&mut self, program: &Program) -> EvalResult {
        let root = program.root;
        self.with_frame(program.arena.clone(), None, |this| this.eval(root))
            .map_err(ControlAction::into_error)
    }

    /// Call a function value from the host.
    pub fn call_function(&mut self, function: &FunctionValue, args: Vec<BoxedValue>) -> EvalResult {
        self.call_function_value(function, args, None)
    }

    /// Call the overloads registered under `name` from the host.
    pub fn call(&mut self, name: &str, args: Vec<BoxedValue>) -> EvalResult {
        let name = self.state.interner.intern(name);
        self.call_named(name, args, None)
    }

    /// Resolve `path` through the module system and evaluate the file
    /// unconditionally.
    pub fn eval_file(&mut self, path: &str) -> EvalResult {
        self.load_module(path, false).map_err(ControlAction::into_error)
    }

    /// Evaluate one node, attaching its span to errors raised below it
    /// that carry none yet.
    pub(crate) fn eval(&mut self, id: ExprId) -> Flow {
        let span = self.arena.span(id);
        ensure_sufficient_stack(|| self.eval_inner(id)).map_err(|action| match action {
            ControlAction::Error(mut err) => {
                if err.span.is_none() {
                    err.span = Some(span);
                }
                ControlAction::Error(err)
            }
            other => other,
        })
    }

    fn eval_inner(&mut self, id: ExprId) -> Flow {
        let expr = self.arena.get_expr(id).clone();
        let span = expr.span;
        match expr.kind {
            ExprKind::Number(lit) => Ok(BoxedValue::number(number_from_literal(lit))),
            ExprKind::Bool(value) => Ok(BoxedValue::bool(value)),
            ExprKind::Str(text) => Ok(BoxedValue::string(&*self.state.interner.lookup(text))),
            ExprKind::Char(c) => Ok(BoxedValue::new(chai_boxed::Payload::Char(c))),
            ExprKind::Vector(items) => self.eval_vector(items),
            ExprKind::Map(entries) => self.eval_map(entries),

            ExprKind::Ident(name) => self.eval_ident(name),
            ExprKind::Decl { name, kind, init } => self.eval_decl(name, kind, init),
            ExprKind::Assign { target, value } => self.eval_assign(target, value),
            ExprKind::CompoundAssign { op, target, value } => {
                self.eval_compound_assign(op, target, value, span)
            }

            ExprKind::Unary { op, operand } => self.eval_unary(op, operand, span),
            ExprKind::Binary { op, left, right } => self.eval_binary(op, left, right, span),
            ExprKind::Ternary {
                cond,
                then_branch,
                else_branch,
            } => {
                let branch = if self.eval_condition(cond)? {
                    then_branch
                } else {
                    else_branch
                };
                self.eval(branch)
            }

            ExprKind::Call { callee, args } => self.eval_call(callee, args, span),
            ExprKind::MethodCall {
                receiver,
                method,
                args,
            } => self.eval_method_call(receiver, method, args, span),
            ExprKind::Member { receiver, name } => self.eval_member(receiver, name, span),
            ExprKind::Index { receiver, index } => self.eval_index(receiver, index, span),

            ExprKind::Lambda {
                captures,
                params,
                body,
            } => self.eval_lambda(captures, params, body),
            ExprKind::Def {
                name,
                class,
                params,
                guard,
                body,
            } => {
                self.define_function(name, class, params, guard, body)?;
                Ok(BoxedValue::void())
            }
            ExprKind::Class { name, body } => self.eval_class(name, body),
            ExprKind::Attr { class, name } => self.eval_attr(class, name),

            ExprKind::Block(stmts) => self.with_scope(|this| this.eval_sequence(stmts)),
            ExprKind::Script(stmts) => self.eval_sequence(stmts),
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => self.eval_if(cond, then_branch, else_branch),
            ExprKind::While { cond, body } => self.eval_while(cond, body),
            ExprKind::For {
                init,
                cond,
                step,
                body,
            } => self.eval_for(init, cond, step, body),
            ExprKind::Break => Err(ControlAction::Break),
            ExprKind::Continue => Err(ControlAction::Continue),
            ExprKind::Return(value) => {
                let value = match value {
                    Some(value) => self.eval(value)?,
                    None => BoxedValue::void(),
                };
                Err(ControlAction::Return(value))
            }
            ExprKind::Throw(value) => {
                let value = self.eval(value)?;
                Err(chai_boxed::EvalError::throw(value).into())
            }
            ExprKind::Try {
                body,
                catches,
                finally,
            } => self.eval_try(body, catches, finally),
            ExprKind::Use { path, once } => {
                let path = self.eval(path)?;
                let Some(path) = path.as_string() else {
                    return Err(chai_boxed::errors::type_mismatch(
                        "string path",
                        &path.type_name_hint(),
                    )
                    .into());
                };
                self.load_module(&path, once)
            }
        }
    }

    /// Evaluate statements in order; the value is the last statement's.
    fn eval_sequence(&mut self, stmts: ExprRange) -> Flow {
        let arena = self.arena.clone();
        let mut last = BoxedValue::void();
        for &stmt in arena.get_expr_list(stmts) {
            last = self.eval(stmt)?;
        }
        Ok(last)
    }

    fn eval_vector(&mut self, items: ExprRange) -> Flow {
        let arena = self.arena.clone();
        let mut values = Vec::with_capacity(items.len());
        for &item in arena.get_expr_list(items) {
            values.push(self.eval(item)?.duplicate());
        }
        Ok(BoxedValue::vector(values))
    }

    fn eval_map(&mut self, entries: ExprRange) -> Flow {
        let arena = self.arena.clone();
        let mut map = std::collections::BTreeMap::new();
        for pair in arena.get_expr_list(entries).chunks_exact(2) {
            let key = self.eval(pair[0])?;
            let Some(key) = key.as_string() else {
                return Err(
                    chai_boxed::errors::type_mismatch("string key", &key.type_name_hint()).into(),
                );
            };
            let value = self.eval(pair[1])?.duplicate();
            map.insert(key, value);
        }
        Ok(BoxedValue::map(map))
    }

    /// Run `f` inside a fresh local scope.
    pub(crate) fn with_scope<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.env.push_scope();
        let result = f(self);
        self.env.pop_scope();
        result
    }

    /// Run `f` in a new frame over `arena`.
    ///
    /// `initial` becomes the frame's only local scope; `None` runs at top
    /// level, where declarations go to the globals.
    pub(crate) fn with_frame<R>(
        &mut self,
        arena: SharedArena,
        initial: Option<crate::Scope>,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let saved_arena = std::mem::replace(&mut self.arena, arena);
        let saved = match initial {
            Some(scope) => self.env.enter_frame(scope),
            None => self.env.enter_top_level(),
        };
        let result = f(self);
        self.env.exit_frame(saved);
        self.arena = saved_arena;
        result
    }

    /// Innermost frames of the script call stack.
    fn backtrace(&self) -> EvalBacktrace {
        EvalBacktrace::new(
            self.call_stack
                .iter()
                .rev()
                .take(MAX_BACKTRACE_FRAMES)
                .cloned()
                .collect(),
        )
    }

    pub(crate) fn name_str(&self, name: Name) -> Arc<str> {
        self.state.interner.lookup(name)
    }
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("scopes", &self.env.depth())
            .field("call_depth", &self.depth.current())
            .finish_non_exhaustive()
    }
}

fn number_from_literal(lit: NumberLit) -> Number {
    match lit {
        NumberLit::Int(v) => Number::I32(v),
        NumberLit::Long(v) => Number::I64(v),
        NumberLit::Unsigned(v) => Number::U32(v),
        NumberLit::UnsignedLong(v) => Number::U64(v),
        NumberLit::Float(bits) => Number::F32(f32::from_bits(bits)),
        NumberLit::Double(bits) => Number::F64(f64::from_bits(bits)),
    }
}
