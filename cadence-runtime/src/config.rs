use crate::error::ConfigError;
use crate::time_unit::TimeUnit;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::time::Duration;

/// Load config from a specific TOML file
///
/// `APP_` environment variables override file values; `__` separates table
/// levels, so `APP_SCHEDULER__FAILURE_POLICY` sets `scheduler.failure_policy`.
pub fn load_toml_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    load_layered(path.as_ref(), FileFormat::Toml, environment())
}

/// Load config from a specific YAML file, with the same `APP_` overrides
pub fn load_yaml_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    load_layered(path.as_ref(), FileFormat::Yaml, environment())
}

fn environment() -> Environment {
    Environment::with_prefix("APP").prefix_separator("_").separator("__")
}

fn load_layered(path: &Path, format: FileFormat, env: Environment) -> Result<Config, ConfigError> {
    let config = Config::builder()
        .add_source(File::from(path).format(format))
        .add_source(env)
        .build()?;
    Ok(config)
}

/// Resolve config placeholder like ${app.interval} or ${app.interval:default}
pub fn resolve_config_value(value: &str, config: &Config) -> Result<String, ConfigError> {
    let Some(inner) = value
        .strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
    else {
        return Ok(value.to_string());
    };

    if let Some((key, default_value)) = inner.split_once(':') {
        match config.get_string(key) {
            Ok(resolved) => Ok(resolved),
            Err(_) => Ok(default_value.to_string()),
        }
    } else {
        Ok(config.get_string(inner)?)
    }
}

/// What the run loop does when a task's action returns an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the scheduler and report the failure.
    #[default]
    FailFast,
    /// Log the failure and keep scanning.
    Isolate,
}

/// Run loop settings, read from the `[scheduler]` table.
///
/// ```toml
/// [scheduler]
/// failure_policy = "isolate"
/// idle_backoff = "10ms"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub failure_policy: FailurePolicy,

    /// Pause after a sweep in which nothing was due. Zero only yields to the
    /// runtime, so the loop keeps polling as fast as it is scheduled.
    #[serde(deserialize_with = "deserialize_backoff")]
    pub idle_backoff: Duration,
}

impl SchedulerConfig {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        match config.get::<SchedulerConfig>("scheduler") {
            Ok(settings) => Ok(settings),
            Err(config::ConfigError::NotFound(_)) => Ok(SchedulerConfig::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    pub fn with_idle_backoff(mut self, idle_backoff: Duration) -> Self {
        self.idle_backoff = idle_backoff;
        self
    }
}

fn deserialize_backoff<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    TimeUnit::parse_interval(&raw, TimeUnit::Milliseconds).map_err(serde::de::Error::custom)
}
