//! Scan command implementation.
//!
//! Prints one line per target call to stdout:
//!
//! ```text
//! src/pages/index.ts:12:17 'posts'
//! src/pages/index.ts:20:3 'authors' (too few arguments)
//! ```
//!
//! With `--id`, the single file is scanned as that module id, which is how
//! script blocks of markup files are addressed.

use crate::cli::ScanArgs;
use crate::error::{CliError, Result, ResultExt};
use crate::ui;
use prerender_transform::{
    BuildMode, CallMatch, LineIndex, MatchStatus, PrerenderTransform, TargetSpec,
};
use std::fs;
use std::path::Path;

/// Execute the scan command.
pub fn execute(args: ScanArgs, config: Option<&Path>) -> Result<()> {
    if args.id.is_some() && args.files.len() > 1 {
        return Err(CliError::Usage(format!(
            "--id applies to a single file, but {} files were given",
            args.files.len()
        )));
    }

    let spec = TargetSpec::load(config)?;
    let transform = PrerenderTransform::new(spec, BuildMode::Production)?;

    let mut total = 0;
    let mut rewritable = 0;
    for file in &args.files {
        let code = fs::read_to_string(file).with_path(file)?;
        let id = args
            .id
            .clone()
            .unwrap_or_else(|| file.to_string_lossy().into_owned());

        let matches = match transform.scan(&id, &code) {
            Ok(matches) => matches,
            Err(reason) => {
                ui::info(&format!("{}: skipped ({reason})", file.display()));
                continue;
            }
        };

        let index = LineIndex::new(&code);
        for call in &matches {
            println!("{}", format_call(&file.to_string_lossy(), &code, &index, call));
        }
        total += matches.len();
        rewritable += matches.iter().filter(|call| call.is_rewritable()).count();
    }

    ui::success(&format!(
        "{} call site{} found, {} rewritable",
        total,
        if total == 1 { "" } else { "s" },
        rewritable
    ));
    Ok(())
}

/// `path:line:col key [(status)]`, with one-based line and column
pub fn format_call(path: &str, code: &str, index: &LineIndex<'_>, call: &CallMatch) -> String {
    let position = index.line_col(call.span.start);
    let key = call.key_text(code).unwrap_or("<spread>");
    let mut line = format!(
        "{}:{}:{} {}",
        path,
        position.line + 1,
        position.column + 1,
        key
    );
    if let Some(note) = status_note(call.status) {
        line.push_str(" (");
        line.push_str(note);
        line.push(')');
    }
    line
}

fn status_note(status: MatchStatus) -> Option<&'static str> {
    match status {
        MatchStatus::Rewritable => None,
        MatchStatus::TooFewArguments => Some("too few arguments"),
        MatchStatus::SpreadArgument => Some("spread handler"),
        MatchStatus::AlreadyGuarded => Some("already guarded"),
        MatchStatus::InsideGuardedHandler => Some("inside guarded handler"),
    }
}
