mod declared;

pub use declared::DeclaredTask;

use crate::error::TaskError;
use crate::priority::Priority;
use crate::runnable::{FnRunnable, Runnable};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// A named unit of recurring work.
///
/// `name`, `priority` and `interval` are fixed at construction. `last_run` is
/// only written by [`Task::execute`], and once a task is registered the
/// scheduler is the only owner able to call it.
pub struct Task {
    name: String,
    priority: Priority,
    interval: Duration,
    last_run: Option<Instant>,
    action: Arc<dyn Runnable>,
}

impl Task {
    pub fn new<R>(name: impl Into<String>, priority: Priority, interval: Duration, action: R) -> Self
    where
        R: Runnable + 'static,
    {
        Self::with_action(name, priority, interval, Arc::new(action))
    }

    /// Build a task from a closure that produces the action's future.
    ///
    /// ```rust
    /// use cadence_runtime::{Priority, Task};
    /// use std::time::Duration;
    ///
    /// let task = Task::from_fn("heartbeat", Priority::High, Duration::from_secs(2), || async {
    ///     println!("still alive");
    ///     Ok(())
    /// });
    /// assert!(task.last_run().is_none());
    /// ```
    pub fn from_fn<F, Fut>(name: impl Into<String>, priority: Priority, interval: Duration, func: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        Self::new(name, priority, interval, FnRunnable::new(func))
    }

    pub fn with_action(
        name: impl Into<String>,
        priority: Priority,
        interval: Duration,
        action: Arc<dyn Runnable>,
    ) -> Self {
        Self {
            name: name.into(),
            priority,
            interval,
            last_run: None,
            action,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// When the last execution started, `None` if the task never ran.
    pub fn last_run(&self) -> Option<Instant> {
        self.last_run
    }

    /// A task is due when it never ran, or when strictly more than `interval`
    /// has passed since its last run started.
    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_run {
            None => true,
            Some(last_run) => now.saturating_duration_since(last_run) > self.interval,
        }
    }

    /// Stamp `last_run` and then run the action to completion.
    ///
    /// The stamp happens first, so a failed or slow run still counts as an
    /// attempt. Successive stamps are strictly increasing even when the clock
    /// has not moved. Action errors are returned untouched.
    pub async fn execute(&mut self) -> Result<(), TaskError> {
        let now = Instant::now();
        self.last_run = Some(match self.last_run {
            Some(previous) if previous >= now => previous + Duration::from_nanos(1),
            _ => now,
        });
        self.action.run().await
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("interval", &self.interval)
            .field("last_run", &self.last_run)
            .finish_non_exhaustive()
    }
}
