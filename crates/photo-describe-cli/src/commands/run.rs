//! Run command - describe every unprocessed image in a folder.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use photo_describe_adapters::{ollama, JsonCheckpointStore, OllamaClient, TextFileSink};
use photo_describe_core::{BatchCoordinator, RunConfig, RunSummary, DEFAULT_PROMPT};
use tracing::{debug, info};

use super::ExitCode;
use crate::config::{duration_from_secs, AppConfig, StatePaths, MAX_SECONDS};
use crate::output::{print_summary, ProgressReporter};

/// Parse a non-negative number of seconds, at most [`MAX_SECONDS`].
fn parse_seconds(s: &str) -> Result<Duration, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    duration_from_secs(value).ok_or_else(|| {
        format!("{value} is not a non-negative number of seconds up to {MAX_SECONDS}")
    })
}

/// Parse a strictly positive number of seconds.
fn parse_timeout(s: &str) -> Result<Duration, String> {
    let value = parse_seconds(s)?;
    if value.is_zero() {
        Err("timeout must be greater than zero".to_string())
    } else {
        Ok(value)
    }
}

/// Parse a count that must be at least one.
fn parse_positive(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("'{s}' is not a valid count")),
    }
}

/// Shared arguments for a batch run.
#[derive(Args, Clone, Default)]
pub struct RunArgs {
    /// Folder containing the images to describe
    pub folder: Option<PathBuf>,

    /// Instruction sent with every image
    #[arg(long)]
    pub prompt: Option<String>,

    /// Vision model name
    #[arg(long)]
    pub model: Option<String>,

    /// Ollama server URL
    #[arg(long, value_name = "URL")]
    pub host: Option<String>,

    /// Attempts per image (0 behaves as 1)
    #[arg(long, value_name = "N")]
    pub max_retries: Option<u32>,

    /// Seconds to wait between attempts
    #[arg(long, value_name = "SECS", value_parser = parse_seconds)]
    pub retry_delay: Option<Duration>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", value_parser = parse_timeout)]
    pub timeout: Option<Duration>,

    /// Upper bound on concurrent workers
    #[arg(long, value_name = "N", value_parser = parse_positive)]
    pub workers: Option<usize>,

    /// Completed images between checkpoint saves
    #[arg(long, value_name = "N", value_parser = parse_positive)]
    pub checkpoint_interval: Option<usize>,

    /// Output file for descriptions and error records
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Checkpoint file listing successfully described images
    #[arg(long, value_name = "FILE")]
    pub checkpoint: Option<PathBuf>,

    /// Log file
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Show progress bar even when stderr is not a terminal
    #[arg(long)]
    pub progress: bool,

    /// Suppress progress and summary output
    #[arg(short, long)]
    pub quiet: bool,

    /// Resolved file locations (populated by `with_config`, not from CLI).
    #[arg(skip)]
    paths: Option<StatePaths>,
}

impl RunArgs {
    /// Apply configuration file values, respecting CLI precedence.
    ///
    /// Layering priority (lowest to highest):
    /// 1. Hardcoded defaults (in accessor methods)
    /// 2. Config file values (XDG, then project-local)
    /// 3. CLI arguments (already set on self)
    ///
    /// Config values that fail validation are ignored here so they fall
    /// back to the defaults.
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        args.prompt = args.prompt.or_else(|| config.service.prompt.clone());
        args.model = args
            .model
            .or_else(|| config.service.model.clone())
            .filter(|m| !m.trim().is_empty());
        args.host = args.host.or_else(|| {
            config
                .service
                .host
                .clone()
                .filter(|h| h.starts_with("http://") || h.starts_with("https://"))
        });
        args.timeout = args.timeout.or_else(|| {
            config
                .service
                .timeout_secs
                .and_then(duration_from_secs)
                .filter(|t| !t.is_zero())
        });

        args.max_retries = args.max_retries.or(config.batch.max_retries);
        args.retry_delay = args
            .retry_delay
            .or_else(|| config.batch.retry_delay_secs.and_then(duration_from_secs));
        args.workers = args.workers.or(config.batch.workers.filter(|w| *w > 0));
        args.checkpoint_interval = args
            .checkpoint_interval
            .or(config.batch.checkpoint_interval.filter(|n| *n > 0));

        if !args.progress {
            args.progress = config.output.progress.unwrap_or(false);
        }

        args.paths = Some(StatePaths::resolve(
            config,
            args.output.as_deref(),
            args.checkpoint.as_deref(),
            args.log_file.as_deref(),
        ));

        args
    }

    /// File locations, with defaults when `with_config` was not applied.
    pub fn paths(&self) -> StatePaths {
        self.paths.clone().unwrap_or_else(|| {
            StatePaths::resolve(
                &AppConfig::default(),
                self.output.as_deref(),
                self.checkpoint.as_deref(),
                self.log_file.as_deref(),
            )
        })
    }

    /// Get host with fallback to the local Ollama default.
    fn host(&self) -> &str {
        self.host.as_deref().unwrap_or(ollama::DEFAULT_HOST)
    }

    /// Get model with fallback to the default vision model.
    fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(ollama::DEFAULT_MODEL)
    }

    /// Batch settings with hardcoded defaults filling the gaps.
    pub fn run_config(&self) -> RunConfig {
        let defaults = RunConfig::default();
        RunConfig {
            prompt: self
                .prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_PROMPT.to_string()),
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            retry_delay: self.retry_delay.unwrap_or(defaults.retry_delay),
            timeout: self.timeout.unwrap_or(defaults.timeout),
            max_workers: self.workers.unwrap_or(defaults.max_workers),
            checkpoint_interval: self
                .checkpoint_interval
                .unwrap_or(defaults.checkpoint_interval),
        }
    }
}

/// Result of running the run command.
#[allow(dead_code)] // Summary exposed for programmatic use
pub struct RunOutcome {
    pub summary: RunSummary,
    pub exit_code: ExitCode,
}

/// Run a batch.
///
/// Expects `args` to have been processed through `with_config()` first
/// to apply configuration file settings.
pub fn run(args: &RunArgs) -> Result<RunOutcome> {
    let Some(folder) = args.folder.as_deref() else {
        anyhow::bail!("No folder specified");
    };
    let config = args.run_config();
    let paths = args.paths();
    debug!("Run settings: {config:?}, files: {paths:?}");

    let client = OllamaClient::new(args.host(), args.model())
        .context("failed to build HTTP client")?;
    info!("Using model {} at {}", client.model(), client.host());

    let show_progress = !args.quiet && (args.progress || std::io::stderr().is_terminal());
    let reporter = Arc::new(ProgressReporter::new(args.quiet, show_progress));

    let coordinator = BatchCoordinator::new(
        Arc::new(client),
        Arc::new(JsonCheckpointStore::new(&paths.checkpoint)),
        Arc::new(TextFileSink::new(&paths.output)),
    )
    .with_progress_sink(reporter);
    info!(
        "Writing results to {}, checkpoint at {}",
        coordinator.output_location().display(),
        coordinator.checkpoint_location().display()
    );

    let summary = coordinator
        .run(folder, &config)
        .with_context(|| format!("failed to process {}", folder.display()))?;

    print_summary(&summary, args.quiet);

    let exit_code = if summary.has_failures() {
        ExitCode::ItemsFailed
    } else {
        ExitCode::Success
    };

    Ok(RunOutcome { summary, exit_code })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_seconds("1.5"), Ok(Duration::from_millis(1500)));
        assert_eq!(parse_seconds("0"), Ok(Duration::ZERO));
        assert!(parse_seconds("-1").is_err());
        assert!(parse_seconds("soon").is_err());
        assert!(parse_seconds("inf").is_err());
        assert!(parse_timeout("0").is_err());
        assert_eq!(parse_timeout("30"), Ok(Duration::from_secs(30)));
    }

    #[test]
    fn test_parse_seconds_rejects_huge_values() {
        assert!(parse_seconds("1e300").is_err());
        assert!(parse_timeout("1e20").is_err());
        assert!(parse_seconds("86401").is_err());
        assert_eq!(parse_seconds("86400"), Ok(Duration::from_secs(86_400)));
    }

    #[test]
    fn test_parse_positive() {
        assert_eq!(parse_positive("4"), Ok(4));
        assert!(parse_positive("0").is_err());
        assert!(parse_positive("-2").is_err());
    }

    #[test]
    fn test_defaults_without_config() {
        let args = RunArgs::default();
        assert_eq!(args.run_config(), RunConfig::default());
        assert_eq!(args.host(), ollama::DEFAULT_HOST);
        assert_eq!(args.model(), ollama::DEFAULT_MODEL);
        assert_eq!(args.paths().output, PathBuf::from("descriptions.txt"));
    }

    #[test]
    fn test_config_fills_unset_flags() {
        let config: AppConfig = toml::from_str(
            r"
[service]
model = 'bakllava'
timeout_secs = 12.0

[batch]
workers = 3
retry_delay_secs = 0.25

[paths]
checkpoint = 'state/done.json'
",
        )
        .unwrap();

        let args = RunArgs::with_config(RunArgs::default(), &config);
        let run = args.run_config();

        assert_eq!(args.model(), "bakllava");
        assert_eq!(run.timeout, Duration::from_secs(12));
        assert_eq!(run.max_workers, 3);
        assert_eq!(run.retry_delay, Duration::from_millis(250));
        assert_eq!(args.paths().checkpoint, PathBuf::from("state/done.json"));
    }

    #[test]
    fn test_cli_overrides_config() {
        let config: AppConfig = toml::from_str(
            r"
[service]
model = 'bakllava'

[batch]
workers = 3
",
        )
        .unwrap();
        let cli = RunArgs {
            model: Some("llava:13b".to_string()),
            workers: Some(8),
            output: Some(PathBuf::from("mine.txt")),
            ..RunArgs::default()
        };

        let args = RunArgs::with_config(cli, &config);

        assert_eq!(args.model(), "llava:13b");
        assert_eq!(args.run_config().max_workers, 8);
        assert_eq!(args.paths().output, PathBuf::from("mine.txt"));
    }

    #[test]
    fn test_out_of_range_config_durations_fall_back_to_defaults() {
        let config: AppConfig = toml::from_str(
            r"
[service]
timeout_secs = 1e20

[batch]
retry_delay_secs = 1e300
",
        )
        .unwrap();

        let run = RunArgs::with_config(RunArgs::default(), &config).run_config();

        assert_eq!(run.timeout, RunConfig::DEFAULT_TIMEOUT);
        assert_eq!(run.retry_delay, RunConfig::DEFAULT_RETRY_DELAY);
    }

    #[test]
    fn test_invalid_config_values_fall_back_to_defaults() {
        let config: AppConfig = toml::from_str(
            r"
[service]
host = 'localhost:11434'
timeout_secs = -5.0

[batch]
retry_delay_secs = -1.0
workers = 0
",
        )
        .unwrap();

        let args = RunArgs::with_config(RunArgs::default(), &config);
        let run = args.run_config();

        assert_eq!(args.host(), ollama::DEFAULT_HOST);
        assert_eq!(run.timeout, RunConfig::DEFAULT_TIMEOUT);
        assert_eq!(run.retry_delay, RunConfig::DEFAULT_RETRY_DELAY);
        assert_eq!(run.max_workers, RunConfig::DEFAULT_MAX_WORKERS);
    }
}
