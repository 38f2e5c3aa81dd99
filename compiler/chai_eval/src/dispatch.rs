//! Dispatch engine.
//!
//! The [`DispatchTable`] maps a function name to its overloads in
//! registration order. [`resolve`] picks the overload for one call:
//!
//! 1. **Collect** overloads of the name with the call's arity.
//! 2. **Filter** by parameter constraints.
//! 3. **Filter** survivors by guard, in registration order.
//! 4. **Select**: one survivor wins; several are ranked, and the winner
//!    must dominate every other survivor or the call is ambiguous. With no
//!    survivor, steps 2 to 4 are retried once, over the overloads the
//!    type filter rejected, allowing lossless numeric widening; converted
//!    arguments go to the guard and the body.
//!
//! Registration order never breaks ties. Guards are run without any
//! registry lock held, since they may call back into script.

use crate::SharedMutableRegistry;
use chai_boxed::errors::{ambiguous_call, no_matching_function};
use chai_boxed::{BoxedValue, EvalError, ProxyFunction, TypeRegistry};
use chai_ir::Name;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Overloads by function name.
#[derive(Default)]
pub struct DispatchTable {
    by_name: FxHashMap<Name, Vec<Arc<ProxyFunction>>>,
}

impl DispatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an overload. Existing overloads are never replaced.
    pub fn add(&mut self, name: Name, function: Arc<ProxyFunction>) {
        self.by_name.entry(name).or_default().push(function);
    }

    /// Snapshot of the overloads registered under `name`.
    pub fn overloads(&self, name: Name) -> Vec<Arc<ProxyFunction>> {
        self.by_name.get(&name).cloned().unwrap_or_default()
    }

    pub fn contains(&self, name: Name) -> bool {
        self.by_name.contains_key(&name)
    }

    /// Number of overloads registered under `name`.
    pub fn count(&self, name: Name) -> usize {
        self.by_name.get(&name).map_or(0, Vec::len)
    }

    /// Number of distinct function names.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl std::fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchTable")
            .field("names", &self.by_name.len())
            .finish_non_exhaustive()
    }
}

/// The overload chosen for a call, with the arguments to call it with.
#[derive(Debug)]
pub struct Selected {
    pub function: Arc<ProxyFunction>,
    /// The call's arguments, or their widened conversions.
    pub args: Vec<BoxedValue>,
    /// Whether the numeric-widening retry produced the match.
    pub widened: bool,
}

/// Resolve a call to `name` among `overloads`.
///
/// `check_guard` runs a guard function with the candidate's arguments and
/// returns its boolean result.
#[tracing::instrument(level = "debug", skip_all, fields(name = %name, arity = args.len()))]
pub fn resolve<G>(
    name: &str,
    overloads: &[Arc<ProxyFunction>],
    args: &[BoxedValue],
    types: &SharedMutableRegistry<TypeRegistry>,
    mut check_guard: G,
) -> Result<Selected, EvalError>
where
    G: FnMut(&ProxyFunction, &[BoxedValue]) -> Result<bool, EvalError>,
{
    let arity = args.len();
    let collected: Vec<&Arc<ProxyFunction>> =
        overloads.iter().filter(|f| f.arity() == arity).collect();

    // Exact pass. Overloads that fail the type filter are the only ones
    // the widening retry considers, so no guard runs twice.
    let (typed, rejected): (Vec<_>, Vec<_>) = {
        let registry = types.read();
        collected
            .into_iter()
            .partition(|f| f.types_match(args, &registry))
    };
    tracing::trace!(typed = typed.len(), rejected = rejected.len(), "type filter");
    let typed: Vec<(&Arc<ProxyFunction>, Vec<BoxedValue>)> =
        typed.into_iter().map(|f| (f, args.to_vec())).collect();
    let survivors = filter_guards(typed, &mut check_guard)?;
    if !survivors.is_empty() {
        return select(name, arity, overloads.len(), survivors, false);
    }

    // Widening retry.
    let widened: Vec<(&Arc<ProxyFunction>, Vec<BoxedValue>)> = {
        let registry = types.read();
        rejected
            .into_iter()
            .filter_map(|f| f.widen_args(args, &registry).map(|converted| (f, converted)))
            .collect()
    };
    tracing::trace!(widened = widened.len(), "widening retry");
    let survivors = filter_guards(widened, &mut check_guard)?;
    if survivors.is_empty() {
        return Err(no_matching_function(name, arity, overloads.len()));
    }
    select(name, arity, overloads.len(), survivors, true)
}

fn filter_guards<'f, G>(
    candidates: Vec<(&'f Arc<ProxyFunction>, Vec<BoxedValue>)>,
    check_guard: &mut G,
) -> Result<Vec<(&'f Arc<ProxyFunction>, Vec<BoxedValue>)>, EvalError>
where
    G: FnMut(&ProxyFunction, &[BoxedValue]) -> Result<bool, EvalError>,
{
    let mut survivors = Vec::with_capacity(candidates.len());
    for (function, args) in candidates {
        let passes = match function.guard() {
            Some(guard) => check_guard(guard, &args)?,
            None => true,
        };
        if passes {
            survivors.push((function, args));
        }
    }
    Ok(survivors)
}

fn select(
    name: &str,
    arity: usize,
    considered: usize,
    mut survivors: Vec<(&Arc<ProxyFunction>, Vec<BoxedValue>)>,
    widened: bool,
) -> Result<Selected, EvalError> {
    let winner = if survivors.len() == 1 {
        0
    } else {
        let dominant = (0..survivors.len()).find(|&i| {
            survivors
                .iter()
                .enumerate()
                .all(|(j, (other, _))| i == j || survivors[i].0.dominates(other))
        });
        match dominant {
            Some(index) => index,
            None => {
                tracing::debug!(name, survivors = survivors.len(), "ambiguous call");
                return Err(ambiguous_call(name, arity, considered));
            }
        }
    };
    let (function, args) = survivors.swap_remove(winner);
    tracing::debug!(name, widened, "dispatched");
    Ok(Selected {
        function: Arc::clone(function),
        args,
        widened,
    })
}

#[cfg(test)]
mod tests;
