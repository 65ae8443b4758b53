//! File eligibility
//!
//! Decides from a module id (and, for the pre-check, its text) whether a file
//! should reach the parser at all.
//!
//! Host build tools address the script block of a markup file with a query
//! string, e.g. `/src/App.vue?vue&type=script&setup=true&lang.ts`. The raw
//! `App.vue` id and the `type=template` / `type=style` variants carry the same
//! logical code (or none), so only the script variant is processed.

use crate::config::{TargetSpec, build_glob_set};
use crate::error::ConfigError;
use globset::GlobSet;
use memchr::memmem;

/// Language of a script, deciding which syntax the parser accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptLang {
    Js,
    Jsx,
    Ts,
    Tsx,
}

impl ScriptLang {
    /// Map a file extension or `lang` attribute onto a language
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "js" | "mjs" | "cjs" => Some(Self::Js),
            "jsx" => Some(Self::Jsx),
            "ts" | "mts" | "cts" | "typescript" => Some(Self::Ts),
            "tsx" => Some(Self::Tsx),
            _ => None,
        }
    }

    /// Whether inline markup (JSX) syntax is accepted
    pub fn allows_jsx(self) -> bool {
        matches!(self, Self::Jsx | Self::Tsx)
    }
}

/// What a module id refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// A standalone script module (`.ts`, `.tsx`, ...)
    PlainModule(ScriptLang),
    /// The script block extracted from a markup file
    EmbeddedScriptBlock(ScriptLang),
    /// A markup file itself, or one of its non-script blocks
    NonScriptMarkup,
    /// Filtered out by globs, virtual module prefix or unknown extension
    Excluded,
}

impl FileKind {
    /// Script language, for kinds that get parsed
    pub fn lang(self) -> Option<ScriptLang> {
        match self {
            Self::PlainModule(lang) | Self::EmbeddedScriptBlock(lang) => Some(lang),
            Self::NonScriptMarkup | Self::Excluded => None,
        }
    }

    /// Whether files of this kind are handed to the parser
    pub fn is_processable(self) -> bool {
        self.lang().is_some()
    }
}

/// A module id split into its logical path and query parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleId<'a> {
    /// Path with backslashes normalized to `/`, query removed
    pub path: String,
    /// Raw query string without the leading `?`
    pub query: Option<&'a str>,
}

impl<'a> ModuleId<'a> {
    /// Split a module id at the first `?`.
    ///
    /// # Examples
    ///
    /// ```
    /// use prerender_transform::ModuleId;
    ///
    /// let id = ModuleId::parse("C:\\app\\App.vue?vue&type=script&lang.ts");
    /// assert_eq!(id.path, "C:/app/App.vue");
    /// assert_eq!(id.query, Some("vue&type=script&lang.ts"));
    /// assert!(id.is_script_block());
    /// ```
    pub fn parse(id: &'a str) -> Self {
        let (path, query) = match id.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (id, None),
        };
        Self {
            path: path.replace('\\', "/"),
            query,
        }
    }

    /// Extension of the logical path, without the dot
    pub fn extension(&self) -> Option<&str> {
        let file_name = self.path.rsplit('/').next()?;
        let (_, ext) = file_name.rsplit_once('.')?;
        Some(ext)
    }

    /// Iterate `key` / `key=value` pairs of the query
    pub fn params(&self) -> impl Iterator<Item = (&'a str, Option<&'a str>)> + 'a {
        self.query
            .into_iter()
            .flat_map(|query| query.split('&'))
            .filter(|param| !param.is_empty())
            .map(|param| match param.split_once('=') {
                Some((key, value)) => (key, Some(value)),
                None => (param, None),
            })
    }

    /// Whether the query selects the script block of a markup file
    pub fn is_script_block(&self) -> bool {
        self.params().any(|(key, value)| {
            matches!((key, value), ("type", Some("script")) | ("setup", Some("true")))
        })
    }

    /// Language requested by the query, as `lang.ts` or `lang=ts`
    pub fn query_lang(&self) -> Option<ScriptLang> {
        self.params().find_map(|(key, value)| {
            if let Some(ext) = key.strip_prefix("lang.") {
                return ScriptLang::from_extension(ext);
            }
            match (key, value) {
                ("lang", Some(ext)) => ScriptLang::from_extension(ext),
                _ => None,
            }
        })
    }
}

/// A file that passed the filter and is about to be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile<'a> {
    pub id: &'a str,
    pub text: &'a str,
    pub kind: FileKind,
}

impl CandidateFile<'_> {
    /// Language to parse the text as; plain JS when the kind carries none
    pub fn lang(&self) -> ScriptLang {
        self.kind.lang().unwrap_or(ScriptLang::Js)
    }
}

/// Compiled include/exclude globs plus the candidate pre-check
#[derive(Debug, Clone)]
pub struct MatchFilter {
    include: GlobSet,
    exclude: GlobSet,
    markup_extensions: Vec<String>,
    function_name: String,
}

impl MatchFilter {
    /// Compile the include/exclude globs of `spec`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidGlob`] if a pattern does not compile.
    ///
    /// # Examples
    ///
    /// ```
    /// use prerender_transform::{FileKind, MatchFilter, ScriptLang, TargetSpec};
    ///
    /// let filter = MatchFilter::new(&TargetSpec::default())?;
    /// assert_eq!(filter.classify("/app/a.ts"), FileKind::PlainModule(ScriptLang::Ts));
    /// assert_eq!(filter.classify("/app/App.vue"), FileKind::NonScriptMarkup);
    /// assert_eq!(filter.classify("/app/node_modules/x/a.ts"), FileKind::Excluded);
    /// # Ok::<(), prerender_transform::ConfigError>(())
    /// ```
    pub fn new(spec: &TargetSpec) -> Result<Self, ConfigError> {
        Ok(Self {
            include: build_glob_set(&spec.include)?,
            exclude: build_glob_set(&spec.exclude)?,
            markup_extensions: spec.markup_extensions.clone(),
            function_name: spec.function_name.clone(),
        })
    }

    /// Classify a module id without looking at its content
    pub fn classify(&self, id: &str) -> FileKind {
        // Virtual modules (rollup convention)
        if id.starts_with('\0') {
            return FileKind::Excluded;
        }

        let module = ModuleId::parse(id);
        if !self.include.is_match(&module.path) || self.exclude.is_match(&module.path) {
            return FileKind::Excluded;
        }

        let Some(ext) = module.extension() else {
            return FileKind::Excluded;
        };

        if self.markup_extensions.iter().any(|markup| markup == ext) {
            if module.query.is_some() && module.is_script_block() {
                return FileKind::EmbeddedScriptBlock(module.query_lang().unwrap_or(ScriptLang::Js));
            }
            return FileKind::NonScriptMarkup;
        }

        match ScriptLang::from_extension(ext) {
            Some(lang) => FileKind::PlainModule(lang),
            None => FileKind::Excluded,
        }
    }

    /// Whether `text` can possibly contain a target call.
    ///
    /// Absence of the function name guarantees no match, so the parser is
    /// skipped. This is also what keeps a second pass over transformed output
    /// from matching the fallback it generated.
    pub fn contains_candidate(&self, text: &str) -> bool {
        memmem::find(text.as_bytes(), self.function_name.as_bytes()).is_some()
    }

    /// Classify `id` and, for processable kinds, run the pre-check.
    ///
    /// Returns `Err(kind)` with the rejecting kind when the file is not
    /// processable, `Ok(None)` when it is processable but cannot match.
    pub fn should_process<'a>(
        &self,
        id: &'a str,
        text: &'a str,
    ) -> Result<Option<CandidateFile<'a>>, FileKind> {
        let kind = self.classify(id);
        if !kind.is_processable() {
            return Err(kind);
        }
        if !self.contains_candidate(text) {
            return Ok(None);
        }
        Ok(Some(CandidateFile { id, text, kind }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> MatchFilter {
        MatchFilter::new(&TargetSpec::default()).unwrap()
    }

    #[test]
    fn test_module_id_parse() {
        let id = ModuleId::parse("/src/App.vue?vue&type=script&setup=true&lang.ts");
        assert_eq!(id.path, "/src/App.vue");
        assert_eq!(id.extension(), Some("vue"));
        assert!(id.is_script_block());
        assert_eq!(id.query_lang(), Some(ScriptLang::Ts));
    }

    #[test]
    fn test_module_id_windows_path() {
        let id = ModuleId::parse("C:\\project\\src\\data.ts");
        assert_eq!(id.path, "C:/project/src/data.ts");
        assert_eq!(id.query, None);
        assert_eq!(id.extension(), Some("ts"));
    }

    #[test]
    fn test_module_id_lang_value_form() {
        let id = ModuleId::parse("/src/App.vue?vue&type=script&lang=tsx");
        assert_eq!(id.query_lang(), Some(ScriptLang::Tsx));
    }

    #[test]
    fn test_classify_plain_modules() {
        let filter = filter();
        assert_eq!(
            filter.classify("/src/data.ts"),
            FileKind::PlainModule(ScriptLang::Ts)
        );
        assert_eq!(
            filter.classify("/src/Page.tsx"),
            FileKind::PlainModule(ScriptLang::Tsx)
        );
        assert_eq!(
            filter.classify("/src/Page.jsx"),
            FileKind::PlainModule(ScriptLang::Jsx)
        );
    }

    #[test]
    fn test_classify_excluded() {
        let filter = filter();
        // Not in the default include set
        assert_eq!(filter.classify("/src/data.js"), FileKind::Excluded);
        assert_eq!(filter.classify("/src/style.css"), FileKind::Excluded);
        // Excluded directory
        assert_eq!(
            filter.classify("/app/node_modules/lib/index.ts"),
            FileKind::Excluded
        );
        // Virtual module
        assert_eq!(filter.classify("\0virtual:data.ts"), FileKind::Excluded);
    }

    #[test]
    fn test_classify_markup_variants() {
        let filter = filter();
        assert_eq!(filter.classify("/src/App.vue"), FileKind::NonScriptMarkup);
        assert_eq!(
            filter.classify("/src/App.vue?vue&type=template&lang.js"),
            FileKind::NonScriptMarkup
        );
        assert_eq!(
            filter.classify("/src/App.vue?vue&type=style&index=0&lang.css"),
            FileKind::NonScriptMarkup
        );
        assert_eq!(
            filter.classify("/src/App.vue?vue&type=script&setup=true&lang.ts"),
            FileKind::EmbeddedScriptBlock(ScriptLang::Ts)
        );
        assert_eq!(
            filter.classify("/src/App.vue?vue&type=script"),
            FileKind::EmbeddedScriptBlock(ScriptLang::Js)
        );
    }

    #[test]
    fn test_query_on_plain_module_is_ignored_for_globs() {
        let filter = filter();
        assert_eq!(
            filter.classify("/src/data.ts?import&v=123"),
            FileKind::PlainModule(ScriptLang::Ts)
        );
    }

    #[test]
    fn test_custom_exclude() {
        let spec = TargetSpec::default().with_exclude(["**/generated/**"]);
        let filter = MatchFilter::new(&spec).unwrap();
        assert_eq!(filter.classify("/src/generated/api.ts"), FileKind::Excluded);
        assert_eq!(
            filter.classify("/app/node_modules/lib/index.ts"),
            FileKind::PlainModule(ScriptLang::Ts)
        );
    }

    #[test]
    fn test_should_process_precheck() {
        let filter = filter();
        assert_eq!(
            filter.should_process("/src/a.ts", "const x = useAsyncData('k', fn)"),
            Ok(None)
        );

        let candidate = filter
            .should_process("/src/a.ts", "usePrerenderData('k', fn)")
            .unwrap()
            .unwrap();
        assert_eq!(candidate.kind, FileKind::PlainModule(ScriptLang::Ts));
        assert_eq!(candidate.lang(), ScriptLang::Ts);
    }

    #[test]
    fn test_should_process_rejects_style_block_with_name_in_text() {
        let filter = filter();
        let result = filter.should_process(
            "/src/App.vue?vue&type=style&index=0&lang.css",
            ".a::after { content: 'usePrerenderData' }",
        );
        assert_eq!(result, Err(FileKind::NonScriptMarkup));
    }
}
