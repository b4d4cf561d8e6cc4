//! Photo Describe CLI - resumable batch image description with a local vision model.

use clap::Parser;

mod commands;
mod config;
mod logging;
mod output;

use commands::{Cli, Commands, ExitCode};
use config::AppConfig;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let config = AppConfig::load();

    let command = match cli.command {
        Some(command) => command,
        None => {
            // Default behavior: run with flattened args
            if cli.run.folder.is_none() {
                eprintln!("error: No folder specified. Use --help for usage information.");
                return ExitCode::Error.into();
            }
            Commands::Run(cli.run)
        }
    };

    let exit_code = match command {
        Commands::Run(args) => {
            let args = commands::run::RunArgs::with_config(args, &config);
            let _guard = logging::init(cli.verbose, Some(&args.paths().log));
            match commands::run::run(&args) {
                Ok(outcome) => outcome.exit_code,
                Err(e) => {
                    tracing::error!("{e:#}");
                    eprintln!("error: {e:#}");
                    ExitCode::Error
                }
            }
        }
        Commands::Reset(ref args) => {
            let _guard = logging::init(cli.verbose, None);
            match commands::reset::run(args, &config) {
                Ok(()) => ExitCode::Success,
                Err(e) => {
                    eprintln!("error: {e:#}");
                    ExitCode::Error
                }
            }
        }
        Commands::Paths(ref args) => {
            commands::paths::run(args, &config);
            ExitCode::Success
        }
    };

    exit_code.into()
}
