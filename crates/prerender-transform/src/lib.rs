//! Build-time guard for prerender-only data handlers
//!
//! Rewrites every direct call `usePrerenderData(key, handler, ...)` so that the
//! handler is only reachable behind a build-time flag:
//!
//! ```text
//! usePrerenderData('posts', () => db.posts())
//!   ↓
//! import { __neverReachable as __neverReachable_prerender } from '#nuxt-prerender-kit/runtime';
//! usePrerenderData('posts', import.meta.prerender ? () => db.posts() : __neverReachable_prerender())
//! ```
//!
//! When the bundler replaces the guard with `false` for the client build, the
//! handler (and everything only it imports) becomes dead code and is dropped.
//!
//! # Pipeline
//!
//! - **Filter**: module id → [`FileKind`], plus a substring pre-check
//! - **Analyzer**: OXC parse of the script text
//! - **Rewriter**: find target calls, wrap each handler in a [`PatchBuffer`]
//! - **Emit**: prepend the import once, render text and source map
//!
//! # Example
//!
//! ```rust
//! use prerender_transform::{BuildMode, PrerenderTransform, TargetSpec};
//!
//! let transform = PrerenderTransform::new(TargetSpec::default(), BuildMode::Production)?;
//! let result = transform.transform(
//!     "/app/pages/index.ts",
//!     "const posts = usePrerenderData('posts', fetchPosts)",
//! )?;
//!
//! let output = result.into_output().expect("handler is rewritten");
//! assert!(output.code.contains("import.meta.prerender ? fetchPosts :"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod analyzer;
mod config;
pub mod emit;
mod error;
mod filter;
mod patch;
mod position;
mod rewriter;
mod transform;

pub use analyzer::{ParseFailure, SyntaxTree, parse, source_type};
pub use config::{
    DEFAULT_CONFIG_FILE, DEFAULT_FALLBACK_SYMBOL, DEFAULT_FUNCTION_NAME, DEFAULT_GUARD,
    DEFAULT_RUNTIME_MODULE, ENV_PREFIX, FallbackShape, FallbackSpec, ImportDirective,
    SourceMapOptions, TargetSpec,
};
pub use emit::{Mapping, SkipReason, TransformOutput, TransformResult};
pub use error::{ConfigError, Result, TransformError};
pub use filter::{CandidateFile, FileKind, MatchFilter, ModuleId, ScriptLang};
pub use patch::{Edit, Origin, PatchBuffer, Piece, Segment};
pub use position::{LineCol, LineIndex};
pub use rewriter::{CallMatch, MatchStatus, find_call_sites, rewrite};
pub use transform::{BuildMode, PrerenderTransform};

// Re-exported so callers of `parse` do not need a direct OXC dependency
pub use oxc_allocator::Allocator;
pub use oxc_sourcemap::SourceMap;
