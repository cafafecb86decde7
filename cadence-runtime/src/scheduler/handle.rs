use super::scheduler::Scheduler;
use crate::cancel::CancelSource;
use crate::error::SchedulerError;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// How a spawned scheduler ended.
#[derive(Debug)]
pub struct RunOutcome {
    /// The scheduler with its run history, `None` if the loop panicked.
    pub scheduler: Option<Scheduler>,
    pub reason: SchedulerError,
}

impl RunOutcome {
    fn from_join(joined: Result<(Scheduler, SchedulerError), JoinError>) -> Self {
        match joined {
            Ok((scheduler, reason)) => Self {
                scheduler: Some(scheduler),
                reason,
            },
            Err(e) => Self {
                scheduler: None,
                reason: SchedulerError::Panicked {
                    message: panic_message(e),
                },
            },
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.reason.is_cancelled()
    }

    /// `Ok` with the scheduler on a clean cancellation, the failure otherwise.
    pub fn into_result(self) -> Result<Option<Scheduler>, SchedulerError> {
        if self.reason.is_cancelled() {
            Ok(self.scheduler)
        } else {
            Err(self.reason)
        }
    }
}

/// Handle for a running scheduler
/// Used to cancel the loop and collect its outcome
pub struct SchedulerHandle {
    cancel: CancellationToken,
    join: JoinHandle<(Scheduler, SchedulerError)>,
}

impl SchedulerHandle {
    pub(crate) fn new(cancel: CancellationToken, join: JoinHandle<(Scheduler, SchedulerError)>) -> Self {
        Self { cancel, join }
    }

    /// Token observed by the loop; cancelling it stops the scheduler.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the loop to end on its own.
    pub async fn wait(self) -> RunOutcome {
        RunOutcome::from_join(self.join.await)
    }

    /// Cancel the loop and wait for it to finish its current step.
    pub async fn stop(self) -> RunOutcome {
        self.cancel.cancel();
        self.wait().await
    }

    /// Race the loop against `source`, whichever finishes first wins.
    ///
    /// If the source fires first the token is cancelled. Either way the loop's
    /// own result is awaited afterwards, so a task failure that ended the loop
    /// is reported rather than hidden behind the cancellation. A source that
    /// fails still stops the loop, but the outcome is
    /// [`SchedulerError::SourceFailed`] instead of a clean cancellation.
    pub async fn run_until<S>(self, source: S) -> RunOutcome
    where
        S: CancelSource,
    {
        let Self { cancel, mut join } = self;

        let (joined, source_error) = tokio::select! {
            joined = &mut join => (Some(joined), None),
            fired = source.triggered() => match fired {
                Ok(()) => {
                    info!("Cancellation requested");
                    (None, None)
                }
                Err(e) => {
                    warn!(error = %e, "Cancellation source failed, stopping scheduler");
                    (None, Some(e))
                }
            },
        };

        cancel.cancel();
        let joined = match joined {
            Some(joined) => joined,
            None => join.await,
        };

        let mut outcome = RunOutcome::from_join(joined);
        if let Some(e) = source_error {
            if outcome.is_cancelled() {
                outcome.reason = SchedulerError::SourceFailed(e);
            }
        }
        outcome
    }
}

fn panic_message(error: JoinError) -> String {
    if !error.is_panic() {
        return error.to_string();
    }

    let payload = error.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
