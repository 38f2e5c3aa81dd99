//! Stack safety for the recursive parser and evaluator.
//!
//! Two independent limits apply to deeply nested scripts:
//!
//! - [`ensure_sufficient_stack`] grows the native stack on demand so that a
//!   deeply nested expression never overflows the host thread.
//! - [`CallDepth`] counts script-level function calls so that runaway
//!   recursion (`def f() { f() }`) fails with an error instead of consuming
//!   memory without bound.
//!
//! On WASM targets stack growth is a passthrough; the depth limit still
//! applies.

/// Minimum stack space to keep available (100KB red zone).
const RED_ZONE: usize = 100 * 1024;

/// Stack space to allocate when growing (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Default maximum number of nested script calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 2048;

/// Run `f`, growing the stack first if less than the red zone remains.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM version - just call directly (WASM has its own stack management).
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

/// Script call-depth counter.
///
/// `enter` is called when a script function body starts and `exit` when it
/// finishes, on every path. The counter is per evaluator; nested evaluators
/// (guards, `use`d files) start from the depth of their parent.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CallDepth {
    current: usize,
    max: usize,
}

/// Returned by [`CallDepth::enter`] when the limit would be exceeded.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DepthExceeded {
    pub max: usize,
}

impl CallDepth {
    pub const fn new(max: usize) -> Self {
        CallDepth { current: 0, max }
    }

    /// Start counting from `current` (used when spawning a child evaluator).
    pub const fn starting_at(current: usize, max: usize) -> Self {
        CallDepth { current, max }
    }

    #[inline]
    pub const fn current(&self) -> usize {
        self.current
    }

    #[inline]
    pub const fn max(&self) -> usize {
        self.max
    }

    /// Enter one call level.
    #[inline]
    pub fn enter(&mut self) -> Result<(), DepthExceeded> {
        if self.current >= self.max {
            return Err(DepthExceeded { max: self.max });
        }
        self.current += 1;
        Ok(())
    }

    /// Leave one call level.
    #[inline]
    pub fn exit(&mut self) {
        self.current = self.current.saturating_sub(1);
    }
}

impl Default for CallDepth {
    fn default() -> Self {
        CallDepth::new(DEFAULT_MAX_CALL_DEPTH)
    }
}
