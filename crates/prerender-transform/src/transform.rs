//! The transform entry point
//!
//! [`PrerenderTransform`] ties the stages together for one module at a time:
//!
//! ```text
//! enabled? → dev bypass? → filter(id) → pre-check(text) → parse → match → rewrite → emit
//! ```
//!
//! Every early exit yields [`TransformResult::Unchanged`] with the reason, so
//! hosts can keep the original module and tests can observe which stage
//! stopped the pipeline.

use crate::analyzer;
use crate::config::TargetSpec;
use crate::emit::{SkipReason, TransformResult, finalize};
use crate::error::{ConfigError, Result};
use crate::filter::MatchFilter;
use crate::patch::PatchBuffer;
use crate::rewriter::{CallMatch, find_call_sites, rewrite};
use oxc_allocator::Allocator;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Build mode reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Dev server; handlers stay callable when the bypass is on
    Development,
    #[default]
    Production,
}

/// Guards prerender-only handlers in JS/TS modules
#[derive(Debug, Clone)]
pub struct PrerenderTransform {
    spec: TargetSpec,
    filter: MatchFilter,
    mode: BuildMode,
}

impl PrerenderTransform {
    /// Create a transform for `spec` running under `mode`.
    ///
    /// The spec is validated again, since builder-made specs never went
    /// through [`TargetSpec::load`].
    ///
    /// # Arguments
    ///
    /// * `spec` - What to look for and what to wrap handlers with
    /// * `mode` - Build mode reported by the host; `Development` together with
    ///   `devBypass` turns every transform into a no-op
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] raised by [`TargetSpec::validate`].
    ///
    /// # Examples
    ///
    /// ```
    /// use prerender_transform::{BuildMode, PrerenderTransform, TargetSpec};
    ///
    /// let transform = PrerenderTransform::new(TargetSpec::default(), BuildMode::Production)?;
    /// let result = transform
    ///     .transform("/app/pages/index.ts", "usePrerenderData('posts', fetchPosts)")
    ///     .expect("edits never overlap");
    /// assert!(result.is_transformed());
    /// # Ok::<(), prerender_transform::ConfigError>(())
    /// ```
    pub fn new(spec: TargetSpec, mode: BuildMode) -> std::result::Result<Self, ConfigError> {
        spec.validate()?;
        let filter = MatchFilter::new(&spec)?;
        Ok(Self { spec, filter, mode })
    }

    /// Name reported to hosts in logs and plugin lists
    pub fn name(&self) -> &'static str {
        "prerender-kit:transform"
    }

    pub fn spec(&self) -> &TargetSpec {
        &self.spec
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    /// Whether the development bypass turns every transform into a no-op
    pub fn is_bypassed(&self) -> bool {
        self.spec.dev_bypass && self.mode == BuildMode::Development
    }

    /// Transform one module.
    ///
    /// Returns `Unchanged` for anything that is not rewritten, including
    /// files that fail to parse. An error is only returned when the rewriter
    /// produces inconsistent edits.
    pub fn transform(&self, id: &str, code: &str) -> Result<TransformResult> {
        if !self.spec.enabled {
            return Ok(TransformResult::Unchanged(SkipReason::Disabled));
        }
        if self.is_bypassed() {
            debug!("[prerender-kit] Development bypass active, skipping {}", id);
            return Ok(TransformResult::Unchanged(SkipReason::Bypassed));
        }

        let matches = match self.analyze(id, code) {
            Ok(matches) => matches,
            Err(reason) => return Ok(TransformResult::Unchanged(reason)),
        };

        let mut buffer = PatchBuffer::new(code);
        let rewrites = rewrite(&matches, &self.spec, &mut buffer)?;
        let result = finalize(buffer, rewrites, &self.spec, id)?;

        if let Some(output) = result.output() {
            debug!(
                "[prerender-kit] Transformed {} ({} handlers guarded, {} → {} bytes)",
                id,
                output.rewrites,
                code.len(),
                output.code.len()
            );
        } else {
            debug!(
                "[prerender-kit] No rewritable call in {} ({} found)",
                id,
                matches.len()
            );
        }
        Ok(result)
    }

    /// Find the target calls of one module without rewriting anything.
    ///
    /// Ignores `enabled` and the development bypass. `Err` carries the
    /// reason the module was not inspected.
    pub fn scan(&self, id: &str, code: &str) -> std::result::Result<Vec<CallMatch>, SkipReason> {
        self.analyze(id, code)
    }

    fn analyze(&self, id: &str, code: &str) -> std::result::Result<Vec<CallMatch>, SkipReason> {
        let candidate = match self.filter.should_process(id, code) {
            Ok(Some(candidate)) => candidate,
            Ok(None) => return Err(SkipReason::NoCandidateText),
            Err(kind) => {
                debug!("[prerender-kit] Skipping {} ({:?})", id, kind);
                return Err(SkipReason::Filtered(kind));
            }
        };

        let allocator = Allocator::default();
        let tree = match analyzer::parse(&allocator, candidate.text, candidate.lang()) {
            Ok(tree) => tree,
            Err(failure) => {
                debug!("[prerender-kit] Could not parse {}: {}", id, failure);
                return Err(SkipReason::ParseFailed);
            }
        };

        Ok(find_call_sites(&tree, &self.spec))
    }
}
