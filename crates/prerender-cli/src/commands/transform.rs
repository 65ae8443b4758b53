//! Transform command implementation.

use crate::cli::TransformArgs;
use crate::error::{Result, ResultExt};
use crate::ui;
use prerender_transform::{BuildMode, PrerenderTransform, TargetSpec, TransformResult};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Execute the transform command.
///
/// Transformed code goes to `--out` or stdout. An unchanged file is reported
/// on stderr and nothing is written.
pub fn execute(args: TransformArgs, config: Option<&Path>) -> Result<()> {
    let spec = TargetSpec::load(config)?;
    let mode = if args.dev {
        BuildMode::Development
    } else {
        BuildMode::Production
    };
    let transform = PrerenderTransform::new(spec, mode)?;

    let code = fs::read_to_string(&args.file).with_path(&args.file)?;
    let id = args
        .id
        .clone()
        .unwrap_or_else(|| args.file.to_string_lossy().into_owned());
    debug!("Transforming {} as {}", args.file.display(), id);

    let output = match transform.transform(&id, &code)? {
        TransformResult::Transformed(output) => output,
        TransformResult::Unchanged(reason) => {
            ui::warning(&format!("unchanged: {reason}"));
            return Ok(());
        }
    };

    match &args.out {
        Some(path) => {
            fs::write(path, &output.code).with_path(path)?;
            ui::success(&format!(
                "Wrote {} ({} handler{} guarded)",
                path.display(),
                output.rewrites,
                if output.rewrites == 1 { "" } else { "s" }
            ));
        }
        None => print!("{}", output.code),
    }

    if let Some(path) = &args.map {
        fs::write(path, output.map.to_json_string()).with_path(path)?;
        debug!("Wrote source map {}", path.display());
    }

    Ok(())
}
