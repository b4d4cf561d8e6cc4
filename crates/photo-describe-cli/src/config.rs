//! Configuration file support for photo-describe.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/photo-describe/config.toml` (lowest priority)
//! - Project-local: `.photo-describe.toml` (searched up directory tree)
//! - CLI flags (highest priority, applied separately)

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

/// File name of the project-local config.
pub const PROJECT_CONFIG_NAME: &str = ".photo-describe.toml";

/// Default locations of the files a run writes, relative to the working
/// directory.
pub mod default_paths {
    pub const OUTPUT: &str = "descriptions.txt";
    pub const CHECKPOINT: &str = "processed_images.json";
    pub const LOG: &str = "processing.log";
}

/// Longest accepted delay or timeout, in seconds (one day).
pub const MAX_SECONDS: f64 = 86_400.0;

/// Converts a seconds value from the CLI or a config file.
///
/// Returns `None` for negative, non-finite and over-long values.
pub fn duration_from_secs(value: f64) -> Option<Duration> {
    if value > MAX_SECONDS {
        return None;
    }
    Duration::try_from_secs_f64(value).ok()
}

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Description service settings.
    pub service: ServiceConfig,
    /// Retry, concurrency and checkpoint settings.
    pub batch: BatchConfig,
    /// Output, checkpoint and log locations.
    pub paths: PathsConfig,
    /// Terminal output settings.
    pub output: OutputConfig,
}

/// Description service configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the Ollama server.
    pub host: Option<String>,
    /// Vision model name.
    pub model: Option<String>,
    /// Instruction sent with every image.
    pub prompt: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: Option<f64>,
}

/// Batch configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Attempts per image.
    pub max_retries: Option<u32>,
    /// Pause between attempts in seconds.
    pub retry_delay_secs: Option<f64>,
    /// Upper bound on concurrent workers.
    pub workers: Option<usize>,
    /// Completions between checkpoint saves.
    pub checkpoint_interval: Option<usize>,
}

/// File locations.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub output: Option<PathBuf>,
    pub checkpoint: Option<PathBuf>,
    pub log: Option<PathBuf>,
}

/// Terminal output configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Show progress bar.
    pub progress: Option<bool>,
}

/// Resolved locations of the files a run reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePaths {
    pub output: PathBuf,
    pub checkpoint: PathBuf,
    pub log: PathBuf,
}

impl StatePaths {
    /// Resolves each location as CLI value, then config value, then default.
    pub fn resolve(
        config: &AppConfig,
        output: Option<&Path>,
        checkpoint: Option<&Path>,
        log: Option<&Path>,
    ) -> Self {
        let pick = |cli: Option<&Path>, file: Option<&PathBuf>, default: &str| {
            cli.map(Path::to_path_buf)
                .or_else(|| file.cloned())
                .unwrap_or_else(|| PathBuf::from(default))
        };
        Self {
            output: pick(output, config.paths.output.as_ref(), default_paths::OUTPUT),
            checkpoint: pick(
                checkpoint,
                config.paths.checkpoint.as_ref(),
                default_paths::CHECKPOINT,
            ),
            log: pick(log, config.paths.log.as_ref(), default_paths::LOG),
        }
    }
}

impl AppConfig {
    /// Load configuration from XDG and project-local files.
    ///
    /// Priority (lowest to highest):
    /// 1. XDG config: `~/.config/photo-describe/config.toml`
    /// 2. Project-local: `.photo-describe.toml` (searched up from cwd)
    ///
    /// Missing files are silently ignored. Invalid values and unreadable
    /// files are reported as warnings on stderr, since this runs before the
    /// log subscriber exists.
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(xdg_path) = xdg_config_path() {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_file(&xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        if let Some(project_path) = find_project_config() {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_file(&project_path) {
                config.merge(project_config);
            }
        }

        if let Err(e) = config.validate() {
            eprintln!("warning: {e}");
        }

        config
    }

    /// Validate configuration values are within acceptable ranges.
    fn validate(&self) -> Result<(), String> {
        if let Some(ref host) = self.service.host {
            if !(host.starts_with("http://") || host.starts_with("https://")) {
                return Err(format!(
                    "service.host must start with http:// or https://, got '{host}'"
                ));
            }
        }
        if let Some(ref model) = self.service.model {
            if model.trim().is_empty() {
                return Err("service.model must not be empty".to_string());
            }
        }
        if let Some(t) = self.service.timeout_secs {
            if duration_from_secs(t).filter(|d| !d.is_zero()).is_none() {
                return Err(format!(
                    "service.timeout_secs must be above 0 and at most {MAX_SECONDS}, got {t}"
                ));
            }
        }
        if let Some(d) = self.batch.retry_delay_secs {
            if duration_from_secs(d).is_none() {
                return Err(format!(
                    "batch.retry_delay_secs must be between 0 and {MAX_SECONDS}, got {d}"
                ));
            }
        }
        if self.batch.workers == Some(0) {
            return Err("batch.workers must be at least 1".to_string());
        }
        if self.batch.checkpoint_interval == Some(0) {
            return Err("batch.checkpoint_interval must be at least 1".to_string());
        }

        Ok(())
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    fn merge(&mut self, other: Self) {
        // Service
        self.service.host = other.service.host.or_else(|| self.service.host.take());
        self.service.model = other.service.model.or_else(|| self.service.model.take());
        self.service.prompt = other.service.prompt.or_else(|| self.service.prompt.take());
        self.service.timeout_secs = other.service.timeout_secs.or(self.service.timeout_secs);

        // Batch
        self.batch.max_retries = other.batch.max_retries.or(self.batch.max_retries);
        self.batch.retry_delay_secs = other
            .batch
            .retry_delay_secs
            .or(self.batch.retry_delay_secs);
        self.batch.workers = other.batch.workers.or(self.batch.workers);
        self.batch.checkpoint_interval = other
            .batch
            .checkpoint_interval
            .or(self.batch.checkpoint_interval);

        // Paths
        self.paths.output = other.paths.output.or_else(|| self.paths.output.take());
        self.paths.checkpoint = other
            .paths
            .checkpoint
            .or_else(|| self.paths.checkpoint.take());
        self.paths.log = other.paths.log.or_else(|| self.paths.log.take());

        // Output
        self.output.progress = other.output.progress.or(self.output.progress);
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("photo-describe").join("config.toml"))
}

/// Find project-local config by searching up from current directory.
fn find_project_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_in_parents(&cwd)
}

/// Search for `.photo-describe.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);

    while let Some(dir) = current {
        let config_path = dir.join(PROJECT_CONFIG_NAME);
        if config_path.exists() {
            return Some(config_path);
        }
        current = dir.parent();
    }

    None
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("warning: failed to read config file {}: {e}", path.display());
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            eprintln!("warning: ignoring config file {}: {e}", path.display());
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.service.host.is_none());
        assert!(config.batch.workers.is_none());
        assert!(config.paths.output.is_none());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: AppConfig = toml::from_str("").expect("parse empty config");
        assert!(config.service.model.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r"
[service]
host = 'http://gpu-box:11434'
model = 'llava:13b'
prompt = 'Describe the scene in one sentence.'
timeout_secs = 90.0

[batch]
max_retries = 5
retry_delay_secs = 0.5
workers = 4
checkpoint_interval = 20

[paths]
output = 'out/descriptions.txt'
checkpoint = 'out/done.json'
log = 'out/run.log'

[output]
progress = false
";
        let config: AppConfig = toml::from_str(toml).expect("parse full config");

        assert_eq!(config.service.host.as_deref(), Some("http://gpu-box:11434"));
        assert_eq!(config.service.model.as_deref(), Some("llava:13b"));
        assert_eq!(config.service.timeout_secs, Some(90.0));
        assert_eq!(config.batch.max_retries, Some(5));
        assert_eq!(config.batch.retry_delay_secs, Some(0.5));
        assert_eq!(config.batch.workers, Some(4));
        assert_eq!(config.batch.checkpoint_interval, Some(20));
        assert_eq!(
            config.paths.checkpoint,
            Some(PathBuf::from("out/done.json"))
        );
        assert_eq!(config.output.progress, Some(false));
    }

    #[test]
    fn test_merge_configs() {
        let mut base: AppConfig = toml::from_str(
            r"
[service]
model = 'llava:7b'

[batch]
workers = 2
",
        )
        .expect("parse base");

        let override_config: AppConfig = toml::from_str(
            r"
[service]
model = 'llava:13b'

[paths]
output = 'elsewhere.txt'
",
        )
        .expect("parse override");

        base.merge(override_config);

        assert_eq!(base.service.model.as_deref(), Some("llava:13b"));
        assert_eq!(base.batch.workers, Some(2));
        assert_eq!(base.paths.output, Some(PathBuf::from("elsewhere.txt")));
    }

    #[test]
    fn test_merge_empty_override_preserves_base() {
        let mut base: AppConfig = toml::from_str(
            r"
[batch]
max_retries = 7
",
        )
        .expect("parse base");

        base.merge(AppConfig::default());

        assert_eq!(base.batch.max_retries, Some(7));
    }

    #[test]
    fn test_invalid_toml_syntax_handled() {
        let toml = r"
[batch
workers = 2
";
        let result: Result<AppConfig, _> = toml::from_str(toml);
        assert!(result.is_err(), "invalid TOML should return error");
    }

    #[test]
    fn test_invalid_field_type_handled() {
        let toml = r#"
[batch]
workers = "many"
"#;
        let result: Result<AppConfig, _> = toml::from_str(toml);
        assert!(result.is_err(), "type mismatch should return error");
    }

    #[test]
    fn test_load_file_ignores_unparseable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PROJECT_CONFIG_NAME);
        std::fs::write(&path, "[service\nhost = 1").unwrap();

        assert!(load_file(&path).is_none());
    }

    #[test]
    fn test_find_config_in_parents() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(PROJECT_CONFIG_NAME), "").unwrap();

        let found = find_config_in_parents(&nested).expect("config found");
        assert_eq!(found, dir.path().join(PROJECT_CONFIG_NAME));
    }

    #[test]
    fn test_validate_rejects_bad_host() {
        let mut config = AppConfig::default();
        config.service.host = Some("localhost:11434".to_string());

        let result = config.validate();
        assert!(result.unwrap_err().contains("service.host"));
    }

    #[test]
    fn test_validate_rejects_zero_workers_and_interval() {
        let mut config = AppConfig::default();
        config.batch.workers = Some(0);
        assert!(config.validate().unwrap_err().contains("batch.workers"));

        let mut config = AppConfig::default();
        config.batch.checkpoint_interval = Some(0);
        assert!(config
            .validate()
            .unwrap_err()
            .contains("batch.checkpoint_interval"));
    }

    #[test]
    fn test_validate_rejects_negative_durations() {
        let mut config = AppConfig::default();
        config.batch.retry_delay_secs = Some(-1.0);
        assert!(config.validate().unwrap_err().contains("retry_delay_secs"));

        let mut config = AppConfig::default();
        config.service.timeout_secs = Some(0.0);
        assert!(config.validate().unwrap_err().contains("timeout_secs"));
    }

    #[test]
    fn test_validate_rejects_out_of_range_durations() {
        let mut config = AppConfig::default();
        config.batch.retry_delay_secs = Some(1e300);
        assert!(config.validate().unwrap_err().contains("retry_delay_secs"));

        let mut config = AppConfig::default();
        config.service.timeout_secs = Some(1e20);
        assert!(config.validate().unwrap_err().contains("timeout_secs"));

        let mut config = AppConfig::default();
        config.service.timeout_secs = Some(f64::NAN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duration_from_secs_bounds() {
        assert_eq!(duration_from_secs(0.0), Some(Duration::ZERO));
        assert_eq!(duration_from_secs(1.5), Some(Duration::from_millis(1500)));
        assert_eq!(duration_from_secs(MAX_SECONDS), Some(Duration::from_secs(86_400)));
        assert_eq!(duration_from_secs(MAX_SECONDS + 1.0), None);
        assert_eq!(duration_from_secs(-0.5), None);
        assert_eq!(duration_from_secs(f64::INFINITY), None);
        assert_eq!(duration_from_secs(1e300), None);
    }

    #[test]
    fn test_validate_empty_config_passes() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_state_paths_layering() {
        let config: AppConfig = toml::from_str(
            r"
[paths]
output = 'from-config.txt'
checkpoint = 'from-config.json'
",
        )
        .expect("parse paths");

        let paths = StatePaths::resolve(
            &config,
            Some(Path::new("from-cli.txt")),
            None,
            None,
        );

        assert_eq!(paths.output, PathBuf::from("from-cli.txt"));
        assert_eq!(paths.checkpoint, PathBuf::from("from-config.json"));
        assert_eq!(paths.log, PathBuf::from(default_paths::LOG));
    }
}
