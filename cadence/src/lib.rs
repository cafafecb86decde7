//! # Cadence - priority-ordered periodic tasks for Rust
//!
//! Cadence keeps a set of named, prioritized, recurring tasks and runs the
//! most important one whose interval has elapsed, over and over, until it is
//! cancelled.
//!
//! ## Features
//!
//! - **Priorities**: tasks are scanned from `Critical` down to `Low`, equal
//!   priorities in registration order
//! - **Interval gating**: a task runs again only once strictly more than its
//!   interval has passed since its previous run started
//! - **Sequential execution**: one task at a time, each awaited to completion
//! - **Cooperative cancellation**: timers, stdin, Ctrl+C or your own token
//! - **Config support**: placeholders like `${jobs.sync.interval}` resolved from
//!   TOML/YAML files and `APP_` environment variables
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use cadence::{CancelSource, CtrlC, Priority, SchedulerBuilder, Task, Timeout};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scheduler = SchedulerBuilder::new()
//!         .task(Task::from_fn("heartbeat", Priority::High, Duration::from_secs(2), || async {
//!             println!("still alive");
//!             Ok(())
//!         }))
//!         .build()?;
//!
//!     let outcome = scheduler
//!         .start(cadence::CancellationToken::new())
//!         .run_until(CtrlC.or(Timeout(Duration::from_secs(60))))
//!         .await;
//!
//!     match outcome.into_result() {
//!         Ok(_) => println!("Scheduler stopped by cancellation."),
//!         Err(e) => eprintln!("Scheduler failed: {e}"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Declarative tasks
//!
//! ```rust,no_run
//! use cadence::{periodic, SchedulerBuilder};
//!
//! #[periodic(priority = "high", interval = "${jobs.sync.interval:30s}")]
//! async fn sync_inbox() {
//!     println!("syncing");
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let scheduler = SchedulerBuilder::with_toml("config/cadence.toml")?
//!     .register_all()
//!     .build()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! ```toml
//! [scheduler]
//! failure_policy = "fail_fast"   # or "isolate"
//! idle_backoff = "10ms"
//!
//! [jobs.sync]
//! interval = "45s"
//! ```

// Re-export macros
pub use cadence_macro::periodic;

// Re-export core types
pub use cadence_runtime::{
    CancelSource, CancellationToken, ConfigError, CtrlC, FailurePolicy, InputWatcher, Manual,
    Priority, RunOutcome, Runnable, Scheduler, SchedulerBuilder, SchedulerConfig, SchedulerError,
    SchedulerHandle, Task, TaskError, TaskFuture, TimeUnit, Timeout,
};

// Make cadence_runtime available for macro expansion
pub use cadence_runtime;
