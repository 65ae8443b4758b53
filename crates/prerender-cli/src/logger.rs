//! Logging setup for the prerender-kit CLI.
//!
//! # Verbosity
//!
//! 1. `--verbose`: DEBUG for the prerender crates
//! 2. `--quiet`: errors only
//! 3. `RUST_LOG`: custom filter
//! 4. Default: INFO
//!
//! The library logs per-file decisions (`[prerender-kit] Skipping ...`) at
//! DEBUG, so `--verbose` is the way to see why a file was left unchanged.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const VERBOSE_FILTER: &str = "prerender_transform=debug,prerender_cli=debug";
const QUIET_FILTER: &str = "prerender_transform=error,prerender_cli=error";
const DEFAULT_FILTER: &str = "prerender_transform=info,prerender_cli=info";

/// Build the filter for the given flags
pub fn build_filter(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Initialize the global tracing subscriber. Call once, before logging.
///
/// Logs go to stderr so transformed code on stdout stays clean.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color && should_use_colors())
        .compact();

    tracing_subscriber::registry()
        .with(build_filter(verbose, quiet))
        .with(fmt_layer)
        .init();
}

/// Whether colored output should be enabled.
///
/// `NO_COLOR` disables, `FORCE_COLOR` forces, otherwise stderr must be a
/// color-capable terminal.
pub fn should_use_colors() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    console::Term::stderr().features().colors_supported()
}
