use super::Task;
use crate::config::resolve_config_value;
use crate::error::ConfigError;
use crate::priority::Priority;
use crate::runnable::TaskFuture;
use crate::time_unit::TimeUnit;
use config::Config;

/// A task declared with `#[periodic]`, before its settings are resolved.
///
/// Every field except `handler` may hold a `${key}` or `${key:default}`
/// placeholder that is looked up in the scheduler's config.
#[derive(Debug, Clone, Copy)]
pub struct DeclaredTask {
    pub name: &'static str,
    pub priority: &'static str,
    pub interval: &'static str,
    pub time_unit: &'static str,
    pub enabled: &'static str,
    pub handler: fn() -> TaskFuture<'static>,
}

impl DeclaredTask {
    /// Resolve placeholders and build the task, `None` when it is disabled.
    pub fn resolve(&self, config: &Config) -> Result<Option<Task>, ConfigError> {
        let enabled = resolve_config_value(self.enabled, config)?;
        let enabled = enabled
            .trim()
            .parse::<bool>()
            .map_err(|e| ConfigError::invalid("enabled", &enabled, e.to_string()))?;
        if !enabled {
            return Ok(None);
        }

        let priority = resolve_config_value(self.priority, config)?;
        let priority = priority
            .parse::<Priority>()
            .map_err(|e| ConfigError::invalid("priority", &priority, e))?;

        let time_unit = resolve_config_value(self.time_unit, config)?;
        let time_unit = time_unit
            .parse::<TimeUnit>()
            .map_err(|e| ConfigError::invalid("time_unit", &time_unit, e))?;

        let interval = resolve_config_value(self.interval, config)?;
        let interval = TimeUnit::parse_interval(&interval, time_unit)
            .map_err(|e| ConfigError::invalid("interval", &interval, e))?;

        let handler = self.handler;
        Ok(Some(Task::from_fn(self.name, priority, interval, move || handler())))
    }
}
