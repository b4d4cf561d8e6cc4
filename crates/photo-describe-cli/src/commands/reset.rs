//! Reset command - clear persisted state so the next run starts over.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use photo_describe_adapters::{JsonCheckpointStore, TextFileSink};
use tracing::info;

use crate::config::{AppConfig, StatePaths};

/// Arguments for the reset command
#[derive(Args, Clone, Default)]
pub struct ResetArgs {
    /// Output file (overrides config)
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Checkpoint file (overrides config)
    #[arg(long, value_name = "FILE")]
    pub checkpoint: Option<PathBuf>,

    /// Only delete the checkpoint; keep earlier descriptions
    #[arg(long)]
    pub keep_output: bool,
}

/// Run the reset command.
pub fn run(args: &ResetArgs, config: &AppConfig) -> Result<()> {
    let paths = StatePaths::resolve(
        config,
        args.output.as_deref(),
        args.checkpoint.as_deref(),
        None,
    );

    let removed = JsonCheckpointStore::new(&paths.checkpoint)
        .clear()
        .context("failed to delete checkpoint")?;
    report(removed, &paths.checkpoint);

    if !args.keep_output {
        let removed = TextFileSink::new(&paths.output)
            .clear()
            .context("failed to delete output file")?;
        report(removed, &paths.output);
    }

    Ok(())
}

fn report(removed: bool, path: &std::path::Path) {
    if removed {
        info!("Removed {}", path.display());
        eprintln!("removed {}", path.display());
    } else {
        eprintln!("not present: {}", path.display());
    }
}
