//! Call-site matching and handler rewriting
//!
//! Finds every call of the form `target(key, handler, ...)` where `target` is a
//! bare identifier equal to the configured function name, and wraps the
//! handler argument in place:
//!
//! ```text
//! usePrerenderData('k', async () => load())
//!                       └──────────────────┘
//! usePrerenderData('k', import.meta.prerender ? async () => load() : __fallback())
//! ```
//!
//! Only direct calls match. `api.usePrerenderData(...)`, renamed imports and
//! optional calls (`usePrerenderData?.(...)`) are left alone.

use crate::analyzer::SyntaxTree;
use crate::config::TargetSpec;
use crate::error::Result;
use crate::patch::{PatchBuffer, Piece};
use oxc_ast::ast::{Argument, CallExpression, Expression};
use oxc_ast_visit::{Visit, walk};
use oxc_span::GetSpan;
use std::ops::Range;
use tracing::trace;

/// What the rewriter does with a matched call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStatus {
    /// Has a key and a handler; the handler gets wrapped
    Rewritable,
    /// Fewer than two arguments
    TooFewArguments,
    /// The handler is a spread element
    SpreadArgument,
    /// The handler already is `<guard> ? handler : fallback`
    AlreadyGuarded,
    /// Sits inside a handler that is (or already was) wrapped
    InsideGuardedHandler,
}

/// A call of the target function found in the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallMatch {
    pub callee: String,
    /// Byte range of the whole call expression
    pub span: Range<usize>,
    pub argument_count: usize,
    /// Byte range of the first argument, if it is not a spread
    pub key: Option<Range<usize>>,
    /// Byte range of the second argument, if it is not a spread
    pub handler: Option<Range<usize>>,
    pub status: MatchStatus,
}

impl CallMatch {
    pub fn is_rewritable(&self) -> bool {
        self.status == MatchStatus::Rewritable
    }

    /// Source text of the key argument
    pub fn key_text<'s>(&self, source: &'s str) -> Option<&'s str> {
        self.key.clone().map(|range| &source[range])
    }
}

/// Walk the tree and collect every call of the target function, in source order
pub fn find_call_sites(tree: &SyntaxTree<'_>, spec: &TargetSpec) -> Vec<CallMatch> {
    let mut collector = CallSiteCollector {
        function_name: &spec.function_name,
        guard: spec.guard.trim(),
        source: tree.source_text,
        guarded_depth: 0,
        matches: Vec::new(),
    };
    collector.visit_program(tree.program());
    collector.matches
}

/// Record the handler wrap of every rewritable match in `buffer`.
///
/// Returns the number of rewrites. Matches are expected in source order from
/// [`find_call_sites`]; an overlap between two of them is an internal error.
pub fn rewrite(
    matches: &[CallMatch],
    spec: &TargetSpec,
    buffer: &mut PatchBuffer<'_>,
) -> Result<usize> {
    let mut rewrites = 0;
    for call in matches.iter().filter(|call| call.is_rewritable()) {
        let Some(handler) = call.handler.clone() else {
            continue;
        };
        let fallback = spec.render_fallback(call.key_text(buffer.original()));
        buffer.overwrite_with(
            handler.clone(),
            vec![
                Piece::Inserted(format!("{} ? ", spec.guard)),
                Piece::Original(handler.clone()),
                Piece::Inserted(format!(" : {fallback}")),
            ],
        )?;
        trace!(
            "[prerender-kit] wrapped handler of {} at {}..{}",
            call.callee, handler.start, handler.end
        );
        rewrites += 1;
    }
    Ok(rewrites)
}

/// Whether `call` is a direct, non-optional call of `name`
fn is_target_call(call: &CallExpression<'_>, name: &str) -> bool {
    if call.optional {
        return false;
    }
    match &call.callee {
        Expression::Identifier(ident) => ident.name.as_str() == name,
        _ => false,
    }
}

fn span_range(node: &impl GetSpan) -> Range<usize> {
    let span = node.span();
    span.start as usize..span.end as usize
}

struct CallSiteCollector<'s> {
    function_name: &'s str,
    guard: &'s str,
    source: &'s str,
    /// Number of enclosing handlers that are guarded
    guarded_depth: usize,
    matches: Vec<CallMatch>,
}

impl CallSiteCollector<'_> {
    fn classify(&self, call: &CallExpression<'_>) -> MatchStatus {
        if self.guarded_depth > 0 {
            return MatchStatus::InsideGuardedHandler;
        }
        if call.arguments.len() < 2 {
            return MatchStatus::TooFewArguments;
        }
        // A spread key still leaves the handler in place; only a spread
        // handler has no single expression to wrap.
        if matches!(call.arguments[1], Argument::SpreadElement(_)) {
            return MatchStatus::SpreadArgument;
        }
        if self.is_guarded(&call.arguments[1]) {
            return MatchStatus::AlreadyGuarded;
        }
        MatchStatus::Rewritable
    }

    fn is_guarded(&self, handler: &Argument<'_>) -> bool {
        match handler.as_expression() {
            Some(Expression::ConditionalExpression(cond)) => {
                let test = span_range(&cond.test);
                self.source[test].trim() == self.guard
            }
            _ => false,
        }
    }

    fn argument_range(arg: Option<&Argument<'_>>) -> Option<Range<usize>> {
        match arg {
            Some(Argument::SpreadElement(_)) | None => None,
            Some(arg) => Some(span_range(arg)),
        }
    }
}

impl<'a> Visit<'a> for CallSiteCollector<'_> {
    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if !is_target_call(call, self.function_name) {
            walk::walk_call_expression(self, call);
            return;
        }

        let status = self.classify(call);
        self.matches.push(CallMatch {
            callee: self.function_name.to_string(),
            span: span_range(call),
            argument_count: call.arguments.len(),
            key: Self::argument_range(call.arguments.first()),
            handler: Self::argument_range(call.arguments.get(1)),
            status,
        });

        // Target calls inside a wrapped handler are already behind the guard;
        // descending with a raised depth keeps their edits from nesting.
        let guards_handler = matches!(
            status,
            MatchStatus::Rewritable | MatchStatus::AlreadyGuarded
        );
        self.visit_expression(&call.callee);
        if let Some(type_arguments) = &call.type_arguments {
            self.visit_ts_type_parameter_instantiation(type_arguments);
        }
        for (index, arg) in call.arguments.iter().enumerate() {
            let guarded = guards_handler && index == 1;
            if guarded {
                self.guarded_depth += 1;
            }
            self.visit_argument(arg);
            if guarded {
                self.guarded_depth -= 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::parse;
    use crate::filter::ScriptLang;
    use oxc_allocator::Allocator;

    fn keyed_spec() -> TargetSpec {
        let import = crate::ImportDirective::for_module("__nr", "#rt");
        TargetSpec::default()
            .with_fallback("__nr", crate::FallbackShape::KeyedCall)
            .with_import(import.statement, import.marker)
    }

    fn rewrite_all(code: &str, spec: &TargetSpec) -> String {
        let allocator = Allocator::default();
        let tree = parse(&allocator, code, ScriptLang::Ts).unwrap();
        let matches = find_call_sites(&tree, spec);
        let mut buffer = PatchBuffer::new(code);
        rewrite(&matches, spec, &mut buffer).unwrap();
        buffer.render()
    }

    fn scan(code: &str) -> Vec<CallMatch> {
        let allocator = Allocator::default();
        let tree = parse(&allocator, code, ScriptLang::Tsx).unwrap();
        find_call_sites(&tree, &TargetSpec::default())
    }

    #[test]
    fn test_finds_direct_call() {
        let code = "usePrerenderData('key', async () => { return 1 })";
        let matches = scan(code);
        assert_eq!(matches.len(), 1);
        let call = &matches[0];
        assert_eq!(call.status, MatchStatus::Rewritable);
        assert_eq!(call.argument_count, 2);
        assert_eq!(call.key_text(code), Some("'key'"));
        assert_eq!(
            &code[call.handler.clone().unwrap()],
            "async () => { return 1 }"
        );
        assert_eq!(call.span, 0..code.len());
    }

    #[test]
    fn test_ignores_member_and_optional_calls() {
        let code = r#"
            api.usePrerenderData('a', fn)
            usePrerenderData?.('b', fn)
            const alias = usePrerenderData
            alias('c', fn)
            useAsyncData('d', fn)
        "#;
        assert!(scan(code).is_empty());
    }

    #[test]
    fn test_arity_and_spread() {
        let code = r#"
            usePrerenderData('only-key')
            usePrerenderData()
            usePrerenderData(...args)
            usePrerenderData('k', ...handlers)
            usePrerenderData(...keys, loadSecret)
        "#;
        let matches = scan(code);
        let statuses: Vec<_> = matches.iter().map(|call| call.status).collect();
        assert_eq!(
            statuses,
            vec![
                MatchStatus::TooFewArguments,
                MatchStatus::TooFewArguments,
                MatchStatus::TooFewArguments,
                MatchStatus::SpreadArgument,
                MatchStatus::Rewritable,
            ]
        );
        assert_eq!(matches[4].key, None);
        assert!(matches[4].handler.is_some());
    }

    #[test]
    fn test_already_guarded_handler() {
        let code = "usePrerenderData('k', import.meta.prerender ? fn : __neverReachable_prerender())";
        let matches = scan(code);
        assert_eq!(matches[0].status, MatchStatus::AlreadyGuarded);

        // A different test expression is not our guard
        let code = "usePrerenderData('k', isServer ? fn : other)";
        assert_eq!(scan(code)[0].status, MatchStatus::Rewritable);
    }

    #[test]
    fn test_nested_call_inside_handler() {
        let code = r#"
            usePrerenderData('outer', async () => {
                return usePrerenderData('inner', load)
            }, { lazy: usePrerenderData('opts', other) })
        "#;
        let statuses: Vec<_> = scan(code).into_iter().map(|call| call.status).collect();
        assert_eq!(
            statuses,
            vec![
                MatchStatus::Rewritable,
                MatchStatus::InsideGuardedHandler,
                MatchStatus::Rewritable,
            ]
        );
    }

    #[test]
    fn test_finds_calls_in_jsx_and_generics() {
        let code = r#"
            const data = await usePrerenderData<Post[]>('posts', fetchPosts)
            export const View = () => <List items={usePrerenderData('items', fetchItems)} />
        "#;
        let matches = scan(code);
        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(CallMatch::is_rewritable));
        assert!(matches[0].span.start < matches[1].span.start);
    }

    #[test]
    fn test_rewrite_records_edits() {
        let code = "usePrerenderData('a', f1); usePrerenderData('b', f2, opts)";
        let allocator = Allocator::default();
        let tree = parse(&allocator, code, ScriptLang::Ts).unwrap();
        let spec = keyed_spec();
        let matches = find_call_sites(&tree, &spec);

        let mut buffer = PatchBuffer::new(code);
        let count = rewrite(&matches, &spec, &mut buffer).unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            buffer.render(),
            "usePrerenderData('a', import.meta.prerender ? f1 : __nr('a')); \
             usePrerenderData('b', import.meta.prerender ? f2 : __nr('b'), opts)"
        );
    }

    #[test]
    fn test_keyed_fallback_never_copies_a_target_call() {
        let code = "usePrerenderData(usePrerenderData('a', secretLoader), g)";
        let out = rewrite_all(code, &keyed_spec());
        assert_eq!(
            out,
            "usePrerenderData(usePrerenderData('a', import.meta.prerender ? secretLoader : __nr('a')), \
             import.meta.prerender ? g : __nr())"
        );
        // The only unguarded occurrence of the loader is gone
        assert_eq!(out.matches("secretLoader").count(), 1);
    }

    #[test]
    fn test_keyed_fallback_skips_key_naming_the_function() {
        let out = rewrite_all("usePrerenderData('usePrerenderData:posts', g)", &keyed_spec());
        assert_eq!(
            out,
            "usePrerenderData('usePrerenderData:posts', import.meta.prerender ? g : __nr())"
        );
        let (_, fallback) = out.rsplit_once(" : ").unwrap();
        assert!(!fallback.contains("usePrerenderData"));
    }

    #[test]
    fn test_spread_key_is_rewritten() {
        let out = rewrite_all("usePrerenderData(...keys, loadSecret)", &keyed_spec());
        assert_eq!(
            out,
            "usePrerenderData(...keys, import.meta.prerender ? loadSecret : __nr())"
        );
    }
}
