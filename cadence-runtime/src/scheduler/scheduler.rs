use super::handle::SchedulerHandle;
use crate::config::{FailurePolicy, SchedulerConfig};
use crate::error::SchedulerError;
use crate::task::Task;
use std::convert::Infallible;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Owns the registered tasks and drives the priority-ordered run loop.
///
/// Tasks can be added and removed while the scheduler is being configured.
/// [`Scheduler::run`] borrows the scheduler mutably for its whole duration, so
/// the task set cannot change while the loop is active.
#[derive(Debug, Default)]
pub struct Scheduler {
    tasks: Vec<Task>,
    settings: SchedulerConfig,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: SchedulerConfig) -> Self {
        Self {
            tasks: Vec::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &SchedulerConfig {
        &self.settings
    }

    /// Register a task. Names must be unique; a duplicate leaves the
    /// scheduler unchanged.
    pub fn add_task(&mut self, task: Task) -> Result<(), SchedulerError> {
        if self.tasks.iter().any(|existing| existing.name() == task.name()) {
            return Err(SchedulerError::DuplicateTask {
                name: task.name().to_string(),
            });
        }

        debug!(task = task.name(), priority = %task.priority(), interval = ?task.interval(), "Registered task");
        self.tasks.push(task);
        Ok(())
    }

    /// Remove a task by name and hand it back to the caller.
    pub fn remove_task(&mut self, name: &str) -> Result<Task, SchedulerError> {
        let position = self
            .tasks
            .iter()
            .position(|task| task.name() == name)
            .ok_or_else(|| SchedulerError::TaskNotFound {
                name: name.to_string(),
            })?;

        debug!(task = name, "Removed task");
        Ok(self.tasks.remove(position))
    }

    /// Tasks in their current storage order: insertion order until the first
    /// run sorts them by priority.
    pub fn list_tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, name: &str) -> Result<&Task, SchedulerError> {
        self.tasks
            .iter()
            .find(|task| task.name() == name)
            .ok_or_else(|| SchedulerError::TaskNotFound {
                name: name.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Highest priority first; `sort_by` is stable, so equal priorities keep
    /// their insertion order.
    fn sort_by_priority(&mut self) {
        self.tasks.sort_by(|a, b| b.priority().cmp(&a.priority()));
    }

    /// Run the selection loop until `cancel` fires or a task fails.
    ///
    /// Tasks are sorted once by priority, then scanned round-robin. Each step
    /// checks the token, executes the candidate if it is due and waits for it,
    /// yields to the runtime after every execution, then moves on to the next index whether or not the candidate ran. A
    /// running action is never interrupted; cancellation only stops the next
    /// step from starting.
    ///
    /// The loop never finishes normally. [`SchedulerError::Cancelled`] is the
    /// clean outcome; anything else is a failure.
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<Infallible, SchedulerError> {
        if self.tasks.is_empty() {
            return Err(SchedulerError::NoTasksRegistered);
        }

        self.sort_by_priority();
        info!(
            tasks = self.tasks.len(),
            order = ?self.tasks.iter().map(Task::name).collect::<Vec<_>>(),
            failure_policy = ?self.settings.failure_policy,
            "Starting scheduler loop"
        );

        let mut index = 0;
        let mut ran_this_sweep = false;

        loop {
            if cancel.is_cancelled() {
                info!("Scheduler loop cancelled");
                return Err(SchedulerError::Cancelled);
            }

            let task = &mut self.tasks[index];
            if task.is_due(Instant::now()) {
                ran_this_sweep = true;
                debug!(task = task.name(), priority = %task.priority(), "Executing task");

                if let Err(source) = task.execute().await {
                    match self.settings.failure_policy {
                        FailurePolicy::FailFast => {
                            error!(task = task.name(), error = %source, "Task failed, stopping scheduler");
                            return Err(SchedulerError::TaskFailed {
                                name: task.name().to_string(),
                                source,
                            });
                        }
                        FailurePolicy::Isolate => {
                            warn!(task = task.name(), error = %source, "Task failed, continuing");
                        }
                    }
                }

                // An action that never awaits would otherwise starve the
                // cancellation source on a current-thread runtime.
                tokio::task::yield_now().await;
            }

            index = (index + 1) % self.tasks.len();
            if index == 0 {
                if !ran_this_sweep {
                    self.idle(cancel).await;
                }
                ran_this_sweep = false;
            }
        }
    }

    /// Give the runtime a turn after a sweep where nothing was due.
    async fn idle(&self, cancel: &CancellationToken) {
        let backoff = self.settings.idle_backoff;
        if backoff.is_zero() {
            tokio::task::yield_now().await;
            return;
        }

        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(backoff) => {}
        }
    }

    /// Spawn the run loop on the tokio runtime and return a handle to it.
    pub fn start(mut self, cancel: CancellationToken) -> SchedulerHandle {
        let token = cancel.clone();
        let join = tokio::spawn(async move {
            let reason = match self.run(&token).await {
                Ok(never) => match never {},
                Err(reason) => reason,
            };
            (self, reason)
        });

        SchedulerHandle::new(cancel, join)
    }
}
