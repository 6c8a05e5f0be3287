use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use crate::error::SchedulerError;
use crate::time_unit::TimeUnit;

/// Table holding scheduler settings in config files.
const SECTION: &str = "scheduler";
/// Environment overrides look like `TICKRUN_SCHEDULER__TICK_LENGTH=100ms`.
const ENV_PREFIX: &str = "TICKRUN";

/// Scheduler settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Wall-clock length of one host tick; converts async delays and periods into deadlines.
    pub tick_length: Duration,
    /// Runtime threads driving async timers.
    pub worker_threads: usize,
    /// Upper bound on async bodies executing at the same time.
    pub max_workers: usize,
    pub thread_name: String,
    /// How long `Scheduler::shutdown` waits for executing async bodies.
    pub shutdown_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_length: Duration::from_millis(50),
            worker_threads: 1,
            max_workers: 64,
            thread_name: "tickrun-worker".to_string(),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

/// Shape of the `[scheduler]` table; durations stay strings until resolved.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawSchedulerConfig {
    tick_length: String,
    worker_threads: usize,
    max_workers: usize,
    thread_name: String,
    shutdown_timeout: String,
}

impl Default for RawSchedulerConfig {
    fn default() -> Self {
        let defaults = SchedulerConfig::default();
        Self {
            tick_length: format!("{}ms", defaults.tick_length.as_millis()),
            worker_threads: defaults.worker_threads,
            max_workers: defaults.max_workers,
            thread_name: defaults.thread_name,
            shutdown_timeout: format!("{}ms", defaults.shutdown_timeout.as_millis()),
        }
    }
}

impl RawSchedulerConfig {
    fn resolve(self) -> Result<SchedulerConfig, SchedulerError> {
        let config = SchedulerConfig {
            tick_length: parse_duration_setting("tick_length", &self.tick_length)?,
            worker_threads: self.worker_threads,
            max_workers: self.max_workers,
            thread_name: self.thread_name,
            shutdown_timeout: parse_duration_setting("shutdown_timeout", &self.shutdown_timeout)?,
        };
        config.validate()?;
        Ok(config)
    }
}

fn parse_duration_setting(key: &str, value: &str) -> Result<Duration, SchedulerError> {
    TimeUnit::parse_to_duration(value).ok_or_else(|| {
        SchedulerError::InvalidArgument(format!("{} must be a duration like \"50ms\", got '{}'", key, value))
    })
}

impl SchedulerConfig {
    /// Read the `scheduler` table of an already built [`Config`]; a missing table means defaults.
    pub fn from_config(config: &Config) -> Result<Self, SchedulerError> {
        let raw = match config.get::<RawSchedulerConfig>(SECTION) {
            Ok(raw) => raw,
            Err(ConfigError::NotFound(_)) => RawSchedulerConfig::default(),
            Err(e) => return Err(e.into()),
        };
        raw.resolve()
    }

    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.tick_length.is_zero() {
            return Err(SchedulerError::InvalidArgument(
                "tick_length must be positive".to_string(),
            ));
        }
        if self.worker_threads == 0 {
            return Err(SchedulerError::InvalidArgument(
                "worker_threads must be at least 1".to_string(),
            ));
        }
        if self.max_workers == 0 {
            return Err(SchedulerError::InvalidArgument(
                "max_workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn load_config(path: &Path, format: FileFormat) -> Result<SchedulerConfig, SchedulerError> {
    let config = Config::builder()
        .add_source(File::from(path).format(format))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    SchedulerConfig::from_config(&config)
}

/// Load scheduler settings from a TOML file, with environment overrides
pub fn load_toml_config<P: AsRef<Path>>(path: P) -> Result<SchedulerConfig, SchedulerError> {
    load_config(path.as_ref(), FileFormat::Toml)
}

/// Load scheduler settings from a YAML file, with environment overrides
pub fn load_yaml_config<P: AsRef<Path>>(path: P) -> Result<SchedulerConfig, SchedulerError> {
    load_config(path.as_ref(), FileFormat::Yaml)
}
