//! Emission: final text, import injection and source map
//!
//! Output is only produced when at least one handler was rewritten. In that
//! case the fallback import is prepended (unless its marker is already in the
//! file; a `#!` line stays first) and a source map is generated from the
//! patch buffer's segments:
//!
//! - text copied from the original maps to its own position, character by
//!   character in `hires` mode, per line otherwise;
//! - the original handler inside each rewrite is copied text, so it keeps its
//!   mappings;
//! - inserted text (guard, fallback, import) maps to the start of the span
//!   that introduced it.

use crate::config::TargetSpec;
use crate::error::Result;
use crate::filter::FileKind;
use crate::patch::{Origin, PatchBuffer, Piece};
use crate::position::{LineCol, LineIndex};
use oxc_sourcemap::{SourceMap, SourceMapBuilder};
use std::fmt;

/// Why a file was left as it is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The transform is switched off
    Disabled,
    /// Development-mode bypass is active
    Bypassed,
    /// The id is not a processable script
    Filtered(FileKind),
    /// The text does not contain the function name; the parser never ran
    NoCandidateText,
    /// The text could not be parsed
    ParseFailed,
    /// Parsed, but no call was rewritten
    NoMatch,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("transform disabled"),
            Self::Bypassed => f.write_str("development bypass active"),
            Self::Filtered(FileKind::NonScriptMarkup) => f.write_str("markup without script block"),
            Self::Filtered(_) => f.write_str("excluded by filter"),
            Self::NoCandidateText => f.write_str("target function not referenced"),
            Self::ParseFailed => f.write_str("could not be parsed"),
            Self::NoMatch => f.write_str("no rewritable call"),
        }
    }
}

/// A generated → original position pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    pub generated: LineCol,
    pub original: LineCol,
}

/// Rewritten module
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub code: String,
    pub map: SourceMap,
    /// Number of handlers wrapped
    pub rewrites: usize,
    /// Whether the import directive was prepended
    pub import_injected: bool,
}

/// Outcome of transforming one file
#[derive(Debug, Clone)]
pub enum TransformResult {
    /// Keep the file as it is. This is not an empty replacement.
    Unchanged(SkipReason),
    Transformed(TransformOutput),
}

impl TransformResult {
    pub fn is_transformed(&self) -> bool {
        matches!(self, Self::Transformed(_))
    }

    pub fn output(&self) -> Option<&TransformOutput> {
        match self {
            Self::Transformed(output) => Some(output),
            Self::Unchanged(_) => None,
        }
    }

    /// Host-friendly form: `None` means "leave the module alone"
    pub fn into_output(self) -> Option<TransformOutput> {
        match self {
            Self::Transformed(output) => Some(output),
            Self::Unchanged(_) => None,
        }
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            Self::Unchanged(reason) => Some(*reason),
            Self::Transformed(_) => None,
        }
    }
}

/// Turn a patch buffer into the final result.
///
/// `rewrites == 0` yields `Unchanged(NoMatch)`.
pub fn finalize(
    mut buffer: PatchBuffer<'_>,
    rewrites: usize,
    spec: &TargetSpec,
    id: &str,
) -> Result<TransformResult> {
    if rewrites == 0 {
        return Ok(TransformResult::Unchanged(SkipReason::NoMatch));
    }

    let import_injected = !buffer.original().contains(spec.import.marker.as_str());
    if import_injected {
        inject_import(&mut buffer, &spec.import.statement)?;
    }

    let code = buffer.render();
    let mappings = build_mappings(&buffer, spec.sourcemap.hires);
    let map = build_source_map(id, buffer.original(), &mappings);

    Ok(TransformResult::Transformed(TransformOutput {
        code,
        map,
        rewrites,
        import_injected,
    }))
}

/// Put `statement` at the top of the module, after the hashbang line if any
fn inject_import(buffer: &mut PatchBuffer<'_>, statement: &str) -> Result<()> {
    let original = buffer.original();
    if !original.starts_with("#!") {
        buffer.prepend(statement);
        return Ok(());
    }

    let (line_end, separator) = match memchr::memchr(b'\n', original.as_bytes()) {
        Some(newline) => (newline + 1, ""),
        None => (original.len(), "\n"),
    };
    buffer.overwrite_with(
        0..line_end,
        vec![
            Piece::Original(0..line_end),
            Piece::Inserted(format!("{separator}{statement}")),
        ],
    )
}

/// Compute mappings for the buffer's output, in generated order
pub fn build_mappings(buffer: &PatchBuffer<'_>, hires: bool) -> Vec<Mapping> {
    let index = LineIndex::new(buffer.original());
    let mut mappings = Vec::new();
    let mut generated = LineCol::default();

    for segment in buffer.segments() {
        match segment.origin {
            Origin::Inserted { anchor } => {
                mappings.push(Mapping {
                    generated,
                    original: index.line_col(anchor),
                });
                generated.advance_str(segment.text);
            }
            Origin::Original(start) => {
                let mut original = index.line_col(start);
                let mut line_start = true;
                for c in segment.text.chars() {
                    if c != '\n' && (hires || line_start) {
                        mappings.push(Mapping {
                            generated,
                            original,
                        });
                    }
                    line_start = c == '\n';
                    generated.advance(c);
                    original.advance(c);
                }
            }
        }
    }
    mappings
}

/// Encode mappings as a source map with `id` as the only source
pub fn build_source_map(id: &str, original: &str, mappings: &[Mapping]) -> SourceMap {
    let mut builder = SourceMapBuilder::default();
    let source_id = builder.add_source_and_content(id, original);
    for mapping in mappings {
        builder.add_token(
            mapping.generated.line,
            mapping.generated.column,
            mapping.original.line,
            mapping.original.column,
            Some(source_id),
            None,
        );
    }
    builder.into_sourcemap()
}
