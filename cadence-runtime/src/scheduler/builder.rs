use super::scheduler::Scheduler;
use crate::config::{load_toml_config, load_yaml_config, SchedulerConfig};
use crate::error::{ConfigError, SchedulerError};
use crate::priority::Priority;
use crate::registry::PERIODIC_TASKS;
use crate::runnable::Runnable;
use crate::task::Task;
use config::Config;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Builder for the scheduler
pub struct SchedulerBuilder {
    config: Config,
    settings: Option<SchedulerConfig>,
    tasks: Vec<Task>,
    register_all: bool,
}

impl Default for SchedulerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerBuilder {
    /// Create a new scheduler builder with default config (empty)
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create with TOML config file
    pub fn with_toml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Ok(Self::with_config(load_toml_config(path)?))
    }

    /// Create with YAML config file
    pub fn with_yaml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Ok(Self::with_config(load_yaml_config(path)?))
    }

    /// Create with custom config
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            settings: None,
            tasks: Vec::new(),
            register_all: false,
        }
    }

    /// Use `settings` instead of the config's `[scheduler]` table
    pub fn settings(mut self, settings: SchedulerConfig) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Register a task
    pub fn task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    /// Register a [`Runnable`] implementation under `name`
    ///
    /// # Example
    ///
    /// ```rust
    /// use cadence_runtime::{Priority, Runnable, SchedulerBuilder, TaskFuture};
    /// use std::time::Duration;
    ///
    /// struct ReportTask;
    ///
    /// impl Runnable for ReportTask {
    ///     fn run(&self) -> TaskFuture<'_> {
    ///         Box::pin(async { Ok(()) })
    ///     }
    /// }
    ///
    /// let scheduler = SchedulerBuilder::new()
    ///     .runnable("report", Priority::Low, Duration::from_secs(60), ReportTask)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(scheduler.len(), 1);
    /// ```
    pub fn runnable<R>(self, name: impl Into<String>, priority: Priority, interval: Duration, instance: R) -> Self
    where
        R: Runnable + 'static,
    {
        self.task(Task::new(name, priority, interval, instance))
    }

    /// Also register every function marked with `#[periodic]`
    pub fn register_all(mut self) -> Self {
        self.register_all = true;
        self
    }

    /// Build the scheduler (does not start it yet)
    ///
    /// Reads the `[scheduler]` settings, adds the explicitly registered tasks
    /// in order and then, with [`register_all`](Self::register_all), every
    /// enabled `#[periodic]` function. Declared functions are collected in
    /// link order, so give them distinct priorities if their relative order
    /// matters.
    pub fn build(self) -> Result<Scheduler, SchedulerError> {
        let settings = match self.settings {
            Some(settings) => settings,
            None => SchedulerConfig::from_config(&self.config)?,
        };
        let mut scheduler = Scheduler::with_settings(settings);

        let explicit_tasks = self.tasks.len();
        for task in self.tasks {
            scheduler.add_task(task)?;
        }

        let mut declared_tasks = 0;
        if self.register_all {
            for entry in PERIODIC_TASKS.iter() {
                let declared = entry();
                match declared.resolve(&self.config)? {
                    Some(task) => {
                        scheduler.add_task(task)?;
                        declared_tasks += 1;
                    }
                    None => info!(task = declared.name, "Skipping disabled task"),
                }
            }
        }

        info!(
            explicit_tasks,
            declared_tasks,
            idle_backoff = ?scheduler.settings().idle_backoff,
            "Building scheduler"
        );

        Ok(scheduler)
    }
}
