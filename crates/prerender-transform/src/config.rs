//! Transform configuration
//!
//! [`TargetSpec`] describes which function to look for, what to wrap its
//! handler with, and which files are eligible. It is built once (from defaults,
//! the builder methods, or a layered config file) and then shared read-only by
//! every transform invocation.
//!
//! ## Loading
//!
//! ```text
//! defaults → prerender.toml / explicit file → PRERENDER_* env vars
//! ```
//!
//! ```rust,no_run
//! use prerender_transform::TargetSpec;
//! use std::path::Path;
//!
//! let spec = TargetSpec::load(Some(Path::new("prerender.toml")))?;
//! # Ok::<(), prerender_transform::ConfigError>(())
//! ```

use crate::error::ConfigError;
use figment::{
    Figment,
    providers::{Env, Format as _, Json, Serialized, Toml},
};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default name of the composable whose handler gets guarded
pub const DEFAULT_FUNCTION_NAME: &str = "usePrerenderData";

/// Default build-time guard, statically replaced by the bundler per build target
pub const DEFAULT_GUARD: &str = "import.meta.prerender";

/// Default fallback symbol, imported under an alias to avoid clashing with user code
pub const DEFAULT_FALLBACK_SYMBOL: &str = "__neverReachable_prerender";

/// Default runtime module that provides the fallback symbol
pub const DEFAULT_RUNTIME_MODULE: &str = "#nuxt-prerender-kit/runtime";

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "prerender.toml";

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "PRERENDER_";

/// Shape of the expression substituted for the handler outside the guard.
///
/// Different runtimes expect different call shapes, so this is an explicit
/// choice rather than something inferred from the symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackShape {
    /// `__fallback`: the symbol itself is passed as the handler
    Identifier,
    /// `__fallback()`: zero-argument invocation
    #[default]
    Call,
    /// `__fallback('key')`: invocation with the call's key argument, so the
    /// runtime error can name the offending call
    KeyedCall,
}

/// The fallback symbol and how it is rendered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackSpec {
    pub symbol: String,
    #[serde(default)]
    pub shape: FallbackShape,
}

impl Default for FallbackSpec {
    fn default() -> Self {
        Self {
            symbol: DEFAULT_FALLBACK_SYMBOL.to_string(),
            shape: FallbackShape::default(),
        }
    }
}

impl FallbackSpec {
    /// Render the fallback expression for one call site.
    ///
    /// `key` is the verbatim source text of the call's first argument and is
    /// only used by [`FallbackShape::KeyedCall`]. Use
    /// [`TargetSpec::render_fallback`] when rendering for a real call site.
    pub fn render(&self, key: &str) -> String {
        match self.shape {
            FallbackShape::Identifier => self.symbol.clone(),
            FallbackShape::Call => format!("{}()", self.symbol),
            FallbackShape::KeyedCall => format!("{}({})", self.symbol, key),
        }
    }
}

/// Import statement prepended to transformed files, plus the marker whose
/// presence means the import is already there
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDirective {
    pub statement: String,
    pub marker: String,
}

impl Default for ImportDirective {
    fn default() -> Self {
        Self::for_module(DEFAULT_FALLBACK_SYMBOL, DEFAULT_RUNTIME_MODULE)
    }
}

impl ImportDirective {
    /// Build the directive that imports `__neverReachable` from `module` under `alias`
    pub fn for_module(alias: &str, module: &str) -> Self {
        Self {
            statement: format!("import {{ __neverReachable as {alias} }} from '{module}';\n"),
            marker: format!("from '{module}'"),
        }
    }
}

/// Source map generation options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMapOptions {
    /// Emit a mapping for every character instead of one per segment
    #[serde(default = "default_true")]
    pub hires: bool,
}

impl Default for SourceMapOptions {
    fn default() -> Self {
        Self { hires: true }
    }
}

fn default_true() -> bool {
    true
}

/// Immutable description of what to rewrite and where
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TargetSpec {
    /// Bare identifier of the target function
    pub function_name: String,

    /// Guard expression text, true only in the prerender build
    pub guard: String,

    /// Substitute used for the handler outside the guard
    pub fallback: FallbackSpec,

    /// Import for the fallback symbol
    pub import: ImportDirective,

    /// Glob patterns for files to transform
    pub include: Vec<String>,

    /// Glob patterns for files to leave alone
    pub exclude: Vec<String>,

    /// Extensions of markup files whose script blocks are addressed via query strings
    pub markup_extensions: Vec<String>,

    /// Skip every file while the host runs in development mode
    pub dev_bypass: bool,

    /// Master switch
    pub enabled: bool,

    pub sourcemap: SourceMapOptions,
}

impl Default for TargetSpec {
    fn default() -> Self {
        Self {
            function_name: DEFAULT_FUNCTION_NAME.to_string(),
            guard: DEFAULT_GUARD.to_string(),
            fallback: FallbackSpec::default(),
            import: ImportDirective::default(),
            include: vec![
                "**/*.ts".to_string(),
                "**/*.vue".to_string(),
                "**/*.tsx".to_string(),
                "**/*.jsx".to_string(),
            ],
            exclude: vec!["**/node_modules/**".to_string()],
            markup_extensions: vec!["vue".to_string()],
            dev_bypass: true,
            enabled: true,
            sourcemap: SourceMapOptions::default(),
        }
    }
}

impl TargetSpec {
    /// Create a spec with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target function name
    pub fn with_function_name(mut self, name: impl Into<String>) -> Self {
        self.function_name = name.into();
        self
    }

    /// Set the guard expression
    pub fn with_guard(mut self, guard: impl Into<String>) -> Self {
        self.guard = guard.into();
        self
    }

    /// Set the fallback symbol and shape
    pub fn with_fallback(mut self, symbol: impl Into<String>, shape: FallbackShape) -> Self {
        self.fallback = FallbackSpec {
            symbol: symbol.into(),
            shape,
        };
        self
    }

    /// Render the fallback for one call site.
    ///
    /// `KeyedCall` falls back to the `Call` shape when there is no key text
    /// (spread key) or when the key text mentions the function name, so the
    /// fallback branch never contains a target call or its handler.
    ///
    /// ```rust
    /// use prerender_transform::{FallbackShape, TargetSpec};
    ///
    /// let spec = TargetSpec::default().with_fallback("__neverReachable_prerender", FallbackShape::KeyedCall);
    /// assert_eq!(spec.render_fallback(Some("'posts'")), "__neverReachable_prerender('posts')");
    /// assert_eq!(
    ///     spec.render_fallback(Some("usePrerenderData('a', load)")),
    ///     "__neverReachable_prerender()"
    /// );
    /// ```
    pub fn render_fallback(&self, key: Option<&str>) -> String {
        match (self.fallback.shape, key) {
            (FallbackShape::KeyedCall, Some(key)) if !key.contains(self.function_name.as_str()) => {
                self.fallback.render(key)
            }
            (FallbackShape::KeyedCall, _) => format!("{}()", self.fallback.symbol),
            _ => self.fallback.render(""),
        }
    }

    /// Set the import directive
    pub fn with_import(mut self, statement: impl Into<String>, marker: impl Into<String>) -> Self {
        self.import = ImportDirective {
            statement: statement.into(),
            marker: marker.into(),
        };
        self
    }

    /// Replace the include patterns
    pub fn with_include<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the exclude patterns
    pub fn with_exclude<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable the development-mode bypass
    pub fn with_dev_bypass(mut self, enabled: bool) -> Self {
        self.dev_bypass = enabled;
        self
    }

    /// Enable or disable the transform entirely
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Toggle per-character source map resolution
    pub fn with_hires_sourcemap(mut self, hires: bool) -> Self {
        self.sourcemap.hires = hires;
        self
    }

    /// Load configuration from defaults, a config file and the environment.
    ///
    /// Priority: environment variables > config file > defaults. When `path` is
    /// `None`, `prerender.toml` in the working directory is used if present.
    /// Files ending in `.json` are read as JSON, everything else as TOML.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                figment = merge_file(figment, path);
            }
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    figment = merge_file(figment, default_path);
                }
            }
        }

        // PRERENDER_FUNCTIONNAME, PRERENDER_FALLBACK_SHAPE, ...
        figment = figment.merge(
            Env::prefixed(ENV_PREFIX)
                .split("_")
                .map(|key| env_key(key.as_str()).into())
                .lowercase(false),
        );

        Self::from_figment(&figment)
    }

    /// Extract and validate a spec from an existing figment
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let spec: Self = figment.extract()?;
        spec.validate()?;
        Ok(spec)
    }

    /// Check the invariants the transform relies on.
    ///
    /// The rendered fallback must never contain the function name: the
    /// candidate pre-check is what stops a second pass over transformed output
    /// from matching the code this pass generated. Per-call key text is kept
    /// out of it by [`TargetSpec::render_fallback`]. The import statement must
    /// bind the fallback symbol it is injected for.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_identifier(&self.function_name) {
            return Err(ConfigError::invalid_identifier(
                "functionName",
                &self.function_name,
            ));
        }
        if !is_identifier(&self.fallback.symbol) {
            return Err(ConfigError::invalid_identifier(
                "fallback.symbol",
                &self.fallback.symbol,
            ));
        }

        let rendered = self.fallback.render("");
        if rendered.contains(self.function_name.as_str()) {
            return Err(ConfigError::ReentrantFallback {
                fallback: rendered,
                function_name: self.function_name.clone(),
            });
        }

        if self.guard.trim().is_empty() {
            return Err(ConfigError::EmptyField { field: "guard" });
        }
        if self.import.marker.is_empty() {
            return Err(ConfigError::EmptyField {
                field: "import.marker",
            });
        }
        if !self.import.statement.contains(self.import.marker.as_str()) {
            return Err(ConfigError::MissingImportMarker {
                marker: self.import.marker.clone(),
            });
        }
        if !contains_identifier(&self.import.statement, &self.fallback.symbol) {
            return Err(ConfigError::FallbackNotImported {
                symbol: self.fallback.symbol.clone(),
            });
        }

        build_glob_set(&self.include)?;
        build_glob_set(&self.exclude)?;
        Ok(())
    }
}

/// Map an environment key (`FUNCTIONNAME`, `FALLBACK.SHAPE`) onto the
/// camelCase field names used by the serialized spec.
fn env_key(key: &str) -> String {
    let lower = key.to_ascii_lowercase();
    match lower.as_str() {
        "functionname" => "functionName".to_string(),
        "markupextensions" => "markupExtensions".to_string(),
        "devbypass" => "devBypass".to_string(),
        _ => lower,
    }
}

fn merge_file(figment: Figment, path: &Path) -> Figment {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => figment.merge(Json::file(path)),
        _ => figment.merge(Toml::file(path)),
    }
}

/// Compile a list of glob patterns into a single set.
pub(crate) fn build_glob_set(patterns: &[String]) -> Result<GlobSet, ConfigError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob =
            Glob::new(pattern).map_err(|err| ConfigError::invalid_glob(pattern.as_str(), err))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|err| ConfigError::invalid_glob(patterns.join(", "), err))
}

/// ASCII-only identifier check; `$` and `_` are allowed anywhere.
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Whether `ident` occurs in `text` as a whole identifier token
fn contains_identifier(text: &str, ident: &str) -> bool {
    let is_ident_char = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '$';
    text.match_indices(ident).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + ident.len()..].chars().next();
        !before.is_some_and(is_ident_char) && !after.is_some_and(is_ident_char)
    })
}
