//! Paths command - show where state is kept.

use std::path::{Path, PathBuf};

use clap::Args;

use crate::config::{AppConfig, StatePaths};

/// Arguments for the paths command
#[derive(Args, Clone, Default)]
pub struct PathsArgs {
    /// Output file (overrides config)
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Checkpoint file (overrides config)
    #[arg(long, value_name = "FILE")]
    pub checkpoint: Option<PathBuf>,

    /// Log file (overrides config)
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

/// Run the paths command.
pub fn run(args: &PathsArgs, config: &AppConfig) {
    let paths = StatePaths::resolve(
        config,
        args.output.as_deref(),
        args.checkpoint.as_deref(),
        args.log_file.as_deref(),
    );
    for line in render(&paths) {
        println!("{line}");
    }
}

fn render(paths: &StatePaths) -> [String; 3] {
    let show = |p: &Path| std::path::absolute(p).unwrap_or_else(|_| p.to_path_buf());
    [
        format!("output: {}", show(&paths.output).display()),
        format!("checkpoint: {}", show(&paths.checkpoint).display()),
        format!("log: {}", show(&paths.log).display()),
    ]
}
