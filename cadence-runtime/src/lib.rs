//! Cadence Runtime - Core runtime for priority-ordered periodic tasks
//!
//! This crate provides the task model, the round-robin run loop and the
//! cancellation sources that stop it.

mod cancel;
mod config;
mod error;
mod priority;
mod registry;
mod runnable;
mod scheduler;
mod task;
mod time_unit;

// Re-export public API
pub use cancel::{CancelSource, CtrlC, FirstOf, InputWatcher, Manual, Timeout, TriggerFuture};
pub use config::{
    load_toml_config, load_yaml_config, resolve_config_value, FailurePolicy, SchedulerConfig,
};
pub use error::{ConfigError, SchedulerError, TaskError};
pub use linkme;
pub use priority::Priority;
pub use registry::PERIODIC_TASKS;
pub use runnable::{FnRunnable, Runnable, TaskFuture};
pub use scheduler::{RunOutcome, Scheduler, SchedulerBuilder, SchedulerHandle};
pub use task::{DeclaredTask, Task};
pub use time_unit::TimeUnit;
pub use tokio_util::sync::CancellationToken;
