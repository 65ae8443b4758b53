//! Parser façade
//!
//! Wraps `oxc_parser` so the rest of the pipeline sees either a clean program
//! or a [`ParseFailure`]. A failure is an expected outcome (template-only
//! blocks, syntax the parser rejects) and callers turn it into "leave the file
//! unchanged".

use crate::filter::ScriptLang;
use oxc_allocator::Allocator;
use oxc_ast::ast::Program;
use oxc_parser::Parser;
use oxc_span::SourceType;

/// Parsed program borrowed from the caller's allocator
pub struct SyntaxTree<'a> {
    pub program: Program<'a>,
    pub source_text: &'a str,
}

impl<'a> SyntaxTree<'a> {
    pub fn program(&self) -> &Program<'a> {
        &self.program
    }
}

/// Why a file could not be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    /// First diagnostic reported by the parser
    pub message: String,
    /// Total number of diagnostics
    pub error_count: usize,
    /// The parser gave up entirely instead of recovering
    pub panicked: bool,
}

impl std::fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} parse errors)", self.message, self.error_count)
    }
}

/// Map a script language onto the OXC source type.
///
/// Everything is parsed as an ES module; `.ts` stays non-JSX so generic casts
/// like `<T>value` keep working.
pub fn source_type(lang: ScriptLang) -> SourceType {
    match lang {
        ScriptLang::Js => SourceType::mjs(),
        ScriptLang::Jsx => SourceType::jsx(),
        ScriptLang::Ts => SourceType::ts(),
        ScriptLang::Tsx => SourceType::tsx(),
    }
}

/// Parse `text` as `lang`.
///
/// Any diagnostic counts as a failure: a partially recovered AST could yield
/// spans that do not line up with what the author wrote.
pub fn parse<'a>(
    allocator: &'a Allocator,
    text: &'a str,
    lang: ScriptLang,
) -> Result<SyntaxTree<'a>, ParseFailure> {
    let ret = Parser::new(allocator, text, source_type(lang)).parse();

    if ret.panicked || !ret.errors.is_empty() {
        let message = ret
            .errors
            .first()
            .map(|err| err.to_string())
            .unwrap_or_else(|| "parser aborted".to_string());
        return Err(ParseFailure {
            message,
            error_count: ret.errors.len(),
            panicked: ret.panicked,
        });
    }

    Ok(SyntaxTree {
        program: ret.program,
        source_text: text,
    })
}
