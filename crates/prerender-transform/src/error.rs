//! Error types for configuration loading and the transform pipeline.
//!
//! Most "failures" inside the pipeline are not errors at all: unparseable input,
//! malformed call sites and files without matches all degrade to
//! [`TransformResult::Unchanged`](crate::TransformResult::Unchanged). The types here
//! cover the few conditions a caller must actually react to.

use miette::Diagnostic;
use std::ops::Range;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building or validating a [`TargetSpec`](crate::TargetSpec).
#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    /// A name that must be a bare JavaScript identifier is not one
    #[error("invalid identifier for `{field}`: '{value}'")]
    #[diagnostic(
        code(prerender::config::invalid_identifier),
        help("Use a plain identifier such as `usePrerenderData` (no dots, spaces or quotes)")
    )]
    InvalidIdentifier { field: &'static str, value: String },

    /// The rendered fallback would re-trigger the candidate pre-check
    #[error("fallback `{fallback}` contains the target function name `{function_name}`")]
    #[diagnostic(
        code(prerender::config::reentrant_fallback),
        help("Rename the fallback symbol so a second pass over the output cannot match it")
    )]
    ReentrantFallback {
        fallback: String,
        function_name: String,
    },

    /// The import statement does not carry its own uniqueness marker
    #[error("import statement does not contain its marker `{marker}`")]
    #[diagnostic(
        code(prerender::config::missing_marker),
        help("The marker must be a substring of the statement, usually the `from '...'` clause")
    )]
    MissingImportMarker { marker: String },

    /// The import statement does not bind the fallback symbol
    #[error("import statement does not bind the fallback symbol `{symbol}`")]
    #[diagnostic(
        code(prerender::config::fallback_not_imported),
        help("Set `import.statement` to an import that declares `{symbol}`, e.g. `import {{ __neverReachable as {symbol} }} from '...';`")
    )]
    FallbackNotImported { symbol: String },

    /// A glob pattern failed to compile
    #[error("invalid glob pattern '{pattern}': {source}")]
    #[diagnostic(code(prerender::config::invalid_glob))]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// A required text field is empty
    #[error("`{field}` must not be empty")]
    #[diagnostic(code(prerender::config::empty_field))]
    EmptyField { field: &'static str },

    /// Configuration file not found
    #[error("config file not found: {}", .0.display())]
    #[diagnostic(code(prerender::config::not_found))]
    NotFound(PathBuf),

    /// Layered extraction (file/env) failed
    #[error("failed to load configuration: {0}")]
    #[diagnostic(
        code(prerender::config::extract),
        help("Check prerender.toml syntax and PRERENDER_* environment variables")
    )]
    Extract(#[from] Box<figment::Error>),
}

impl ConfigError {
    pub fn invalid_identifier(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            field,
            value: value.into(),
        }
    }

    pub fn invalid_glob(pattern: impl Into<String>, source: globset::Error) -> Self {
        Self::InvalidGlob {
            pattern: pattern.into(),
            source,
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Extract(Box::new(err))
    }
}

/// Fatal errors raised by the transform itself.
///
/// These indicate an internal-consistency violation. Output is never produced
/// when one of them occurs.
#[derive(Error, Debug, Diagnostic, PartialEq, Eq)]
pub enum TransformError {
    /// Two edits claimed overlapping byte ranges of the original text
    #[error("overlapping edits at {first:?} and {second:?}")]
    #[diagnostic(
        code(prerender::transform::overlapping_edit),
        help("This is a bug in the call-site rewriter; please report it with the input file")
    )]
    OverlappingEdit {
        first: Range<usize>,
        second: Range<usize>,
    },

    /// An edit range falls outside the original text or splits a character
    #[error("edit range {range:?} is not valid for a source of {len} bytes")]
    #[diagnostic(code(prerender::transform::invalid_range))]
    InvalidRange { range: Range<usize>, len: usize },
}

/// Result type for transform operations
pub type Result<T> = std::result::Result<T, TransformError>;
