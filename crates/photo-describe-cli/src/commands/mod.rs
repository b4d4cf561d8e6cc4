//! CLI command definitions and handlers.

pub mod paths;
pub mod reset;
pub mod run;

use clap::{Parser, Subcommand};

/// Photo Describe - resumable batch image description with a local vision model
#[derive(Parser)]
#[command(name = "photo-describe")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Shared run arguments (folder, service, batch settings).
    #[command(flatten)]
    pub run: run::RunArgs,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Describe every unprocessed image in a folder
    Run(run::RunArgs),
    /// Delete the checkpoint and output file to start over
    Reset(reset::ResetArgs),
    /// Print the resolved output, checkpoint and log locations
    Paths(paths::PathsArgs),
}

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Every image was described, or nothing was left to do.
    Success,
    /// The run completed but some images failed.
    ItemsFailed,
    /// The run could not start or could not be finalized.
    Error,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        match code {
            ExitCode::Success => Self::SUCCESS,
            ExitCode::ItemsFailed => Self::from(1),
            ExitCode::Error => Self::from(2),
        }
    }
}
