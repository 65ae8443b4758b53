//! prerender-kit - command-line entry point.

use clap::Parser;
use miette::Result;
use prerender_cli::{cli, commands, error, logger};

fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);

    let config = args.config.as_deref();
    let result = match args.command {
        cli::Command::Transform(transform_args) => {
            commands::transform_execute(transform_args, config)
        }
        cli::Command::Scan(scan_args) => commands::scan_execute(scan_args, config),
        cli::Command::Check(check_args) => commands::check_execute(check_args, config),
    };

    result.map_err(error::cli_error_to_miette)
}
