//! The bundled front end behind the engine's parser seam.

use chai_boxed::errors::parse_error;
use chai_boxed::EvalError;
use chai_eval::{Program, ScriptParser};
use chai_ir::StringInterner;

/// [`ScriptParser`] over `chai_parse`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChaiParser;

impl ScriptParser for ChaiParser {
    fn parse(&self, source: &str, interner: &StringInterner) -> Result<Program, EvalError> {
        chai_parse::parse(source, interner)
            .map(|parsed| Program {
                arena: parsed.arena,
                root: parsed.root,
            })
            .map_err(|err| parse_error(&err.message, err.span))
    }
}
