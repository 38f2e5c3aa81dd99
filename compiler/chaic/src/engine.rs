//! The embedding surface.
//!
//! An [`Engine`] owns one set of registries (functions, types, globals,
//! used files). Every `eval` runs a fresh [`Interpreter`] over them, so
//! definitions made by one evaluation are visible to the next.
//!
//! ```ignore
//! let engine = Engine::new();
//! engine.add_fn("add", |a: i32, b: i32| a + b)?;
//! assert_eq!(engine.eval_as::<i32>("add(1, 2)")?, 3);
//! ```

use crate::exception::{ChaiError, ExceptionSpec};
use crate::parser::ChaiParser;
use chai_boxed::errors::{name_conflict, non_const_value, undefined_variable};
use chai_boxed::{
    BoxedValue, Conversion, EvalError, EvalNote, FromBoxed, FunctionValue, IntoArgs, IntoBoxed,
    NativeCallable, OwnershipMode, ParamConstraint, ProxyFunction, TypeRegistry, TypeTag,
};
use chai_eval::{
    buffer_handler, register_prelude, stdout_handler, EngineState, Interpreter, ModuleResolver,
    ModuleSystem, Program, ScriptParser, SearchPathResolver, SharedPrintHandler,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Environment variable holding extra module search directories, in the
/// platform's path-list syntax.
pub const MODULE_PATH_ENV: &str = "CHAI_MODULE_PATH";

/// How a host type is registered.
#[derive(Clone, Copy)]
pub struct TypeDescriptor {
    register: fn(&mut TypeRegistry, &str) -> Result<TypeTag, EvalError>,
}

impl TypeDescriptor {
    pub fn of<T: 'static>() -> Self {
        TypeDescriptor {
            register: |registry, name| registry.register_native::<T>(name, false),
        }
    }

    /// Values of `T` cannot be viewed through a const reference.
    pub fn mutable_only<T: 'static>() -> Self {
        TypeDescriptor {
            register: |registry, name| registry.register_native::<T>(name, true),
        }
    }
}

impl std::fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TypeDescriptor")
    }
}

/// Something the host can bind to a name.
#[derive(Debug)]
pub enum Registration {
    /// One more overload under the name.
    Function(ProxyFunction),
    /// A host type, visible to scripts by the name.
    Type(TypeDescriptor),
    /// A global value.
    Object(BoxedValue),
}

/// Engine configuration.
pub struct EngineBuilder {
    search_paths: Vec<PathBuf>,
    max_call_depth: Option<usize>,
    print: Option<SharedPrintHandler>,
    parser: Option<Arc<dyn ScriptParser>>,
    resolver: Option<Arc<dyn ModuleResolver>>,
    modules: bool,
    prelude: bool,
}

impl EngineBuilder {
    pub fn new() -> Self {
        EngineBuilder {
            search_paths: Vec::new(),
            max_call_depth: None,
            print: None,
            parser: None,
            resolver: None,
            modules: true,
            prelude: true,
        }
    }

    /// Add a directory searched by `use` and `eval_file`.
    #[must_use]
    pub fn search_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_paths.push(dir.into());
        self
    }

    /// Add the directories listed in `CHAI_MODULE_PATH`.
    #[must_use]
    pub fn search_paths_from_env(mut self) -> Self {
        if let Some(paths) = std::env::var_os(MODULE_PATH_ENV) {
            self.search_paths.extend(std::env::split_paths(&paths));
        }
        self
    }

    #[must_use]
    pub fn max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = Some(depth);
        self
    }

    #[must_use]
    pub fn print_handler(mut self, handler: SharedPrintHandler) -> Self {
        self.print = Some(handler);
        self
    }

    /// Capture `print` output in a buffer instead of writing to stdout.
    #[must_use]
    pub fn capture_output(self) -> Self {
        self.print_handler(buffer_handler())
    }

    /// Replace the bundled parser.
    #[must_use]
    pub fn parser(mut self, parser: Arc<dyn ScriptParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Replace the search-path resolver used by `use` and `eval_file`.
    #[must_use]
    pub fn resolver(mut self, resolver: Arc<dyn ModuleResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Disable `use` and `eval_file`.
    #[must_use]
    pub fn without_modules(mut self) -> Self {
        self.modules = false;
        self
    }

    /// Start without the builtin functions.
    #[must_use]
    pub fn without_prelude(mut self) -> Self {
        self.prelude = false;
        self
    }

    pub fn build(self) -> Engine {
        let parser = self
            .parser
            .unwrap_or_else(|| Arc::new(ChaiParser) as Arc<dyn ScriptParser>);

        let mut state = EngineState::new();
        if let Some(depth) = self.max_call_depth {
            state.max_call_depth = depth;
        }
        state.print = self.print.unwrap_or_else(stdout_handler);
        if self.modules {
            let search_paths = self.search_paths;
            let resolver = self.resolver.unwrap_or_else(|| {
                Arc::new(SearchPathResolver::new(search_paths)) as Arc<dyn ModuleResolver>
            });
            state.modules = Some(ModuleSystem::new(Arc::clone(&parser), resolver));
        }
        if self.prelude {
            register_prelude(&state);
        }

        tracing::debug!(
            modules = state.modules.is_some(),
            max_call_depth = state.max_call_depth,
            "engine created"
        );
        Engine { state, parser }
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A scripting engine instance.
///
/// Cloning shares the registries; an `Engine` is `Send + Sync`.
#[derive(Clone)]
pub struct Engine {
    state: EngineState,
    parser: Arc<dyn ScriptParser>,
}

impl Engine {
    /// Engine with the prelude, stdout printing and modules resolved
    /// against the working directory.
    pub fn new() -> Self {
        EngineBuilder::new().build()
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn print_handler(&self) -> &SharedPrintHandler {
        &self.state.print
    }

    // ===== Registration =====

    /// Bind `item` to `name`.
    ///
    /// Functions append an overload. A name cannot be both a global object
    /// and a function or type.
    pub fn add(&self, item: Registration, name: &str) -> Result<(), ChaiError> {
        let interned = self.state.interner.intern(name);
        match item {
            Registration::Function(function) => {
                if self.state.globals.read().contains(interned) {
                    return Err(name_conflict(name, "a global object").into());
                }
                tracing::debug!(name, arity = function.arity(), "registered function");
                self.state.add_function(name, function);
            }
            Registration::Type(descriptor) => {
                if self.state.globals.read().contains(interned) {
                    return Err(name_conflict(name, "a global object").into());
                }
                (descriptor.register)(&mut self.state.types.write(), name)?;
                tracing::debug!(name, "registered type");
            }
            Registration::Object(value) => {
                let existing_type = {
                    let types = self.state.types.read();
                    types.lookup(name).map(|tag| types.name_of(tag))
                };
                if let Some(existing) = existing_type {
                    return Err(name_conflict(name, &format!("type `{existing}`")).into());
                }
                if self.state.functions.read().contains(interned) {
                    return Err(name_conflict(name, "a function").into());
                }
                self.state.globals.write().define(interned, value)?;
                tracing::debug!(name, "registered global");
            }
        }
        Ok(())
    }

    /// Register a host closure; parameter constraints come from its
    /// argument types.
    pub fn add_fn<Args, F: NativeCallable<Args>>(&self, name: &str, f: F) -> Result<(), ChaiError> {
        self.add(Registration::Function(ProxyFunction::native(name, f)), name)
    }

    pub fn add_type<T: 'static>(&self, name: &str) -> Result<(), ChaiError> {
        self.add(Registration::Type(TypeDescriptor::of::<T>()), name)
    }

    pub fn add_type_mutable_only<T: 'static>(&self, name: &str) -> Result<(), ChaiError> {
        self.add(Registration::Type(TypeDescriptor::mutable_only::<T>()), name)
    }

    /// Register a conversion used by [`Engine::boxed_cast_with_conversions`].
    ///
    /// Both ends must name a single runtime type.
    pub fn add_conversion<A, B, F>(&self, f: F) -> Result<(), ChaiError>
    where
        A: FromBoxed,
        B: FromBoxed + IntoBoxed,
        F: Fn(A) -> B + Send + Sync + 'static,
    {
        let from = concrete_tag::<A>()?;
        let to = concrete_tag::<B>()?;
        let conversion: Conversion =
            Arc::new(move |value: &BoxedValue| Ok(f(A::from_boxed(value)?).into_boxed()));
        self.state.types.write().add_conversion(from, to, conversion);
        tracing::debug!(
            from = std::any::type_name::<A>(),
            to = std::any::type_name::<B>(),
            "registered conversion"
        );
        Ok(())
    }

    /// Bind a global. Shared and reference values stay aliased to their
    /// source.
    pub fn add_global(&self, value: impl IntoBoxed, name: &str) -> Result<(), ChaiError> {
        self.add(Registration::Object(value.into_boxed()), name)
    }

    /// Bind a read-only global.
    ///
    /// Values aliasing other storage and values of mutable-only types are
    /// rejected with `NonConstValue`.
    pub fn add_global_const(&self, value: impl IntoBoxed, name: &str) -> Result<(), ChaiError> {
        let value = value.into_boxed();
        if matches!(value.mode(), OwnershipMode::Shared | OwnershipMode::Reference) {
            return Err(non_const_value(name).into());
        }
        let value = value
            .rebox(OwnershipMode::ConstReference, &self.state.types.read())
            .map_err(|err| non_const_value(name).with_note(EvalNote::new(err.message)))?;
        self.add(Registration::Object(value), name)
    }

    // ===== Evaluation =====

    /// Parse `text` without evaluating it.
    pub fn parse(&self, text: &str) -> Result<Program, ChaiError> {
        self.parser
            .parse(text, &self.state.interner)
            .map_err(ChaiError::Parse)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(len = text.len()))]
    pub fn eval(&self, text: &str) -> Result<BoxedValue, ChaiError> {
        let program = self.parse(text)?;
        Ok(Interpreter::new(self.state.clone()).eval_program(&program)?)
    }

    /// Evaluate and extract the result.
    pub fn eval_as<T: FromBoxed>(&self, text: &str) -> Result<T, ChaiError> {
        let value = self.eval(text)?;
        Ok(self.boxed_cast_with_conversions(&value)?)
    }

    /// Evaluate; a script throw matching an entry of `spec` comes back as
    /// [`ChaiError::Caught`].
    pub fn eval_with_spec(&self, text: &str, spec: &ExceptionSpec) -> Result<BoxedValue, ChaiError> {
        match self.eval(text) {
            Err(ChaiError::Eval(err)) if err.is_script_throw() => {
                let caught = err
                    .thrown
                    .as_ref()
                    .and_then(|thrown| spec.catch(thrown, &self.state.types.read()));
                match caught {
                    Some(caught) => Err(ChaiError::Caught(caught)),
                    None => Err(ChaiError::Eval(err)),
                }
            }
            other => other,
        }
    }

    /// Resolve `path` through the module system and evaluate the file.
    ///
    /// Unlike `use`, the file is evaluated even if it was loaded before.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn eval_file(&self, path: &str) -> Result<BoxedValue, ChaiError> {
        Ok(Interpreter::new(self.state.clone()).eval_file(path)?)
    }

    /// Extract `T`, falling back to a registered conversion from the value's
    /// type to `T`.
    pub fn boxed_cast_with_conversions<T: FromBoxed>(
        &self,
        value: &BoxedValue,
    ) -> Result<T, EvalError> {
        let err = match T::from_boxed(value) {
            Ok(extracted) => return Ok(extracted),
            Err(err) => err,
        };
        let ParamConstraint::Exact { tag, .. } = T::constraint() else {
            return Err(err);
        };
        let conversion = self.state.types.read().conversion(value.type_tag(), tag);
        match conversion {
            Some(conversion) => T::from_boxed(&conversion(value)?),
            None => Err(err),
        }
    }

    // ===== Host → script calls =====

    /// Handle to the function bound to `name`: a global holding a function
    /// value, else the overloads registered under it.
    pub fn function(&self, name: &str) -> Result<FunctionHandle, ChaiError> {
        let interned = self.state.interner.intern(name);
        let global = self.state.globals.read().get(interned);
        if let Some(function) = global.and_then(|value| value.as_function()) {
            return Ok(self.handle(function));
        }
        if self.state.functions.read().contains(interned) {
            return Ok(self.handle(FunctionValue::Overloads(interned)));
        }
        Err(undefined_variable(name).into())
    }

    /// Handle to a function value, e.g. a lambda returned by `eval`.
    pub fn handle(&self, function: FunctionValue) -> FunctionHandle {
        FunctionHandle {
            state: self.state.clone(),
            function,
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// A script function callable from the host.
#[derive(Clone, Debug)]
pub struct FunctionHandle {
    state: EngineState,
    function: FunctionValue,
}

impl FunctionHandle {
    pub fn call(&self, args: &[BoxedValue]) -> Result<BoxedValue, ChaiError> {
        self.call_with(args)
    }

    /// Call with host values, e.g. `handle.call_with((1, "a"))`.
    pub fn call_with(&self, args: impl IntoArgs) -> Result<BoxedValue, ChaiError> {
        Ok(Interpreter::new(self.state.clone()).call_function(&self.function, args.into_args())?)
    }

    pub fn call_as<T: FromBoxed>(&self, args: impl IntoArgs) -> Result<T, ChaiError> {
        let value = self.call_with(args)?;
        Ok(T::from_boxed(&value)?)
    }

    pub fn function(&self) -> &FunctionValue {
        &self.function
    }
}

fn concrete_tag<T: FromBoxed>() -> Result<TypeTag, EvalError> {
    match T::constraint() {
        ParamConstraint::Exact { tag, .. } => Ok(tag),
        _ => Err(EvalError::new(format!(
            "`{}` has no single runtime type",
            std::any::type_name::<T>()
        ))),
    }
}

#[cfg(test)]
mod tests;
