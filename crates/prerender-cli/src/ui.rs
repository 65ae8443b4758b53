//! Status messages on stderr.
//!
//! Command results (transformed code, call-site lines, effective config) go to
//! stdout; these lines are the human-facing commentary around them.

use owo_colors::OwoColorize;

/// Print a success message to stderr.
///
/// # Arguments
///
/// * `message` - Message to display
///
/// # Examples
///
/// ```no_run
/// use prerender_cli::ui::success;
///
/// success("Wrote dist/index.js (2 handlers guarded)");
/// ```
pub fn success(message: &str) {
    eprintln!("{} {}", "✓".green().bold(), message);
}

/// Print an info message to stderr.
///
/// # Arguments
///
/// * `message` - Message to display
///
/// # Examples
///
/// ```no_run
/// use prerender_cli::ui::info;
///
/// info("src/styles.css: skipped (excluded by filter)");
/// ```
pub fn info(message: &str) {
    eprintln!("{} {}", "ℹ".blue().bold(), message);
}

/// Print a warning message to stderr.
///
/// Used when a file is left as it is, so the reason stays visible even
/// though nothing is written to stdout.
///
/// # Arguments
///
/// * `message` - Message to display
///
/// # Examples
///
/// ```no_run
/// use prerender_cli::ui::warning;
///
/// warning("unchanged: target function not referenced");
/// ```
pub fn warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message.yellow());
}
