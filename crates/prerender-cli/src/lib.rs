//! prerender-kit CLI
//!
//! A thin driver around [`prerender_transform`]: it loads configuration,
//! reads files from disk, and reports what the transform did with them.
//!
//! - [`cli`] - argument definitions
//! - [`commands`] - `transform`, `scan` and `check`
//! - [`error`] - CLI error type and miette rendering
//! - [`logger`] - tracing subscriber setup

pub mod cli;
pub mod commands;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{CliError, Result, ResultExt};
