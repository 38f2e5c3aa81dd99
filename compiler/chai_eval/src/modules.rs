//! Module loading seams for `use` and `eval_file`.
//!
//! - [`ScriptParser`] turns source text into a [`Program`]
//! - [`ModuleResolver`] turns the path written in script into a file
//!
//! The used-file set is keyed by the resolved path, so `use("a.chai")` and
//! `use("./a.chai")` load once when both resolve to the same file.

use chai_boxed::errors::module_error;
use chai_boxed::EvalError;
use chai_ir::{ExprId, SharedArena, StringInterner};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A parsed script: the arena and its `Script` root node.
#[derive(Clone, Debug)]
pub struct Program {
    pub arena: SharedArena,
    pub root: ExprId,
}

/// Source text → AST.
pub trait ScriptParser: Send + Sync {
    fn parse(&self, source: &str, interner: &StringInterner) -> Result<Program, EvalError>;
}

/// Script-visible module path → file on disk.
pub trait ModuleResolver: Send + Sync {
    fn resolve(&self, path: &str) -> Result<PathBuf, EvalError>;
}

/// Resolves against an ordered list of search directories.
///
/// Absolute paths are used as-is. Relative paths are tried against each
/// search directory in order, then against the working directory. The
/// first existing file wins and is canonicalized.
#[derive(Clone, Debug, Default)]
pub struct SearchPathResolver {
    search_paths: Vec<PathBuf>,
}

impl SearchPathResolver {
    pub fn new(search_paths: impl IntoIterator<Item = PathBuf>) -> Self {
        SearchPathResolver {
            search_paths: search_paths.into_iter().collect(),
        }
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    pub fn push(&mut self, dir: PathBuf) {
        self.search_paths.push(dir);
    }
}

impl ModuleResolver for SearchPathResolver {
    fn resolve(&self, path: &str) -> Result<PathBuf, EvalError> {
        let requested = Path::new(path);
        let candidates: Vec<PathBuf> = if requested.is_absolute() {
            vec![requested.to_path_buf()]
        } else {
            self.search_paths
                .iter()
                .map(|dir| dir.join(requested))
                .chain(std::iter::once(requested.to_path_buf()))
                .collect()
        };
        for candidate in candidates {
            if candidate.is_file() {
                return candidate
                    .canonicalize()
                    .map_err(|e| module_error(path, e.to_string()));
            }
        }
        Err(module_error(path, "file not found in search paths"))
    }
}

/// Parser and resolver used by one engine.
#[derive(Clone)]
pub struct ModuleSystem {
    pub parser: Arc<dyn ScriptParser>,
    pub resolver: Arc<dyn ModuleResolver>,
}

impl ModuleSystem {
    pub fn new(parser: Arc<dyn ScriptParser>, resolver: Arc<dyn ModuleResolver>) -> Self {
        ModuleSystem { parser, resolver }
    }

    /// Read and parse a resolved file.
    pub fn load(&self, path: &Path, interner: &StringInterner) -> Result<Program, EvalError> {
        let display = path.display().to_string();
        let source =
            std::fs::read_to_string(path).map_err(|e| module_error(&display, e.to_string()))?;
        self.parser
            .parse(&source, interner)
            .map_err(|e| module_error(&display, e.message))
    }
}

impl std::fmt::Debug for ModuleSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ModuleSystem")
    }
}
