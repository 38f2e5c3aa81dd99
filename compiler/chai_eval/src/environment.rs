//! Variable scoping.
//!
//! Globals live in an engine-wide [`Globals`] registry; locals in a scope
//! stack owned by the interpreter. A function call starts a new frame: the
//! caller's local scopes are set aside, so a function body sees its own
//! parameters, its captures and the globals, never the caller's locals.
//!
//! Declarations made with no local scope open (top level of an `eval` or of
//! a `use`d file) go to the globals and persist across evaluations.

use crate::SharedMutableRegistry;
use chai_boxed::errors::const_violation;
use chai_boxed::{BoxedValue, EvalError};
use chai_ir::Name;
use rustc_hash::FxHashMap;

/// Engine-wide bindings.
#[derive(Default, Debug)]
pub struct Globals {
    values: FxHashMap<Name, BoxedValue>,
}

impl Globals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: Name) -> Option<BoxedValue> {
        self.values.get(&name).cloned()
    }

    pub fn contains(&self, name: Name) -> bool {
        self.values.contains_key(&name)
    }

    /// Bind `name`, replacing any previous binding unless that binding is a
    /// constant.
    pub fn define(&mut self, name: Name, value: BoxedValue) -> Result<(), EvalError> {
        if self.values.get(&name).is_some_and(BoxedValue::is_const) {
            return Err(const_violation(""));
        }
        self.values.insert(name, value);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A single local scope.
#[derive(Clone, Debug, Default)]
pub struct Scope {
    bindings: FxHashMap<Name, BoxedValue>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` in this scope, shadowing any outer binding.
    pub fn define(&mut self, name: Name, value: BoxedValue) {
        self.bindings.insert(name, value);
    }

    pub fn lookup(&self, name: Name) -> Option<&BoxedValue> {
        self.bindings.get(&name)
    }
}

/// Saved local scopes of a suspended frame.
#[must_use = "a suspended frame must be restored"]
pub struct SavedFrame(Vec<Scope>);

/// Scope stack over the engine globals.
pub struct Environment {
    globals: SharedMutableRegistry<Globals>,
    scopes: Vec<Scope>,
}

impl Environment {
    pub fn new(globals: SharedMutableRegistry<Globals>) -> Self {
        Environment {
            globals,
            scopes: Vec::new(),
        }
    }

    pub fn globals(&self) -> &SharedMutableRegistry<Globals> {
        &self.globals
    }

    /// Push a new local scope.
    #[inline]
    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::new());
    }

    /// Pop the innermost local scope.
    #[inline]
    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Number of open local scopes.
    #[inline]
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Start a frame whose only local scope is `initial`.
    pub fn enter_frame(&mut self, initial: Scope) -> SavedFrame {
        SavedFrame(std::mem::replace(&mut self.scopes, vec![initial]))
    }

    /// Start a frame with no local scopes (top level of a loaded file).
    pub fn enter_top_level(&mut self) -> SavedFrame {
        SavedFrame(std::mem::take(&mut self.scopes))
    }

    pub fn exit_frame(&mut self, saved: SavedFrame) {
        self.scopes = saved.0;
    }

    /// Bind in the innermost scope, or globally at top level.
    pub fn define(&mut self, name: Name, value: BoxedValue) -> Result<(), EvalError> {
        match self.scopes.last_mut() {
            Some(scope) => {
                scope.define(name, value);
                Ok(())
            }
            None => self.globals.write().define(name, value),
        }
    }

    /// Bind in the global scope.
    pub fn define_global(&mut self, name: Name, value: BoxedValue) -> Result<(), EvalError> {
        self.globals.write().define(name, value)
    }

    /// Look up `name`, innermost scope first, then the globals.
    pub fn lookup(&self, name: Name) -> Option<BoxedValue> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.lookup(name).cloned())
            .or_else(|| self.globals.read().get(name))
    }
}
