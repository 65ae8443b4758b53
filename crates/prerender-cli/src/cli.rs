//! Command-line interface definition.
//!
//! - `prerender-kit transform` - rewrite one file and print the result
//! - `prerender-kit scan` - list target call sites
//! - `prerender-kit check` - validate and print the effective configuration

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// prerender-kit - guard prerender-only data handlers behind a build-time flag
#[derive(Parser, Debug)]
#[command(
    name = "prerender-kit",
    version,
    about = "Guard prerender-only data handlers behind a build-time flag",
    long_about = "Rewrites `usePrerenderData(key, handler)` calls so the handler is only\n\
                  reachable when the build-time guard is true, letting the client build\n\
                  drop handler code and everything only it imports."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file (TOML or JSON). Defaults to ./prerender.toml if present
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Transform a single file
    Transform(TransformArgs),

    /// List target call sites without rewriting
    Scan(ScanArgs),

    /// Validate configuration and print the effective values
    Check(CheckArgs),
}

#[derive(Args, Debug, Clone)]
pub struct TransformArgs {
    /// File to transform
    pub file: PathBuf,

    /// Module id to transform the file as (e.g. `/src/App.vue?vue&type=script&lang.ts`).
    /// Defaults to the file path
    #[arg(long, value_name = "ID")]
    pub id: Option<String>,

    /// Run as the development server would (enables the dev bypass)
    #[arg(long)]
    pub dev: bool,

    /// Write the transformed code here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Write the JSON source map here
    #[arg(long, value_name = "FILE")]
    pub map: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// Files to scan
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Module id to scan the file as (e.g. `/src/App.vue?vue&type=script&lang.ts`).
    /// Only valid with a single file; defaults to the file path
    #[arg(long, value_name = "ID")]
    pub id: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Print the effective configuration as JSON instead of TOML
    #[arg(long)]
    pub json: bool,
}
