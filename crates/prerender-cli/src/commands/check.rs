//! Check command implementation.
//!
//! Validates configuration without touching any source file.

use crate::cli::CheckArgs;
use crate::error::Result;
use crate::ui;
use prerender_transform::{BuildMode, DEFAULT_CONFIG_FILE, PrerenderTransform, TargetSpec};
use std::path::Path;

/// Execute the check command.
///
/// Loads the layered configuration, compiles the file filter, and prints the
/// effective values to stdout.
pub fn execute(args: CheckArgs, config: Option<&Path>) -> Result<()> {
    match config {
        Some(path) => ui::info(&format!("Checking {}...", path.display())),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            ui::info(&format!("Checking {DEFAULT_CONFIG_FILE}..."))
        }
        None => ui::warning(&format!("No {DEFAULT_CONFIG_FILE} found, using defaults")),
    }

    let spec = TargetSpec::load(config)?;
    PrerenderTransform::new(spec.clone(), BuildMode::Production)?;

    let rendered = if args.json {
        serde_json::to_string_pretty(&spec)?
    } else {
        toml::to_string_pretty(&spec)?
    };
    println!("{}", rendered.trim_end());

    ui::success("Configuration is valid!");
    Ok(())
}
