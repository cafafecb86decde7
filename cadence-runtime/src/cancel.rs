//! Cancellation sources raced against a running scheduler.
//!
//! A source is anything that eventually decides the scheduler should stop: a
//! timer, a line on stdin, Ctrl+C, or a token held elsewhere. They are all
//! equivalent inputs to [`SchedulerHandle::run_until`](crate::SchedulerHandle::run_until),
//! which cancels the loop's token as soon as the source resolves.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Boxed future returned by [`CancelSource::triggered`].
pub type TriggerFuture = Pin<Box<dyn Future<Output = io::Result<()>> + Send>>;

/// Something that resolves once the scheduler should stop.
///
/// An `Err` still stops the scheduler and is reported as
/// [`SchedulerError::SourceFailed`](crate::SchedulerError::SourceFailed).
pub trait CancelSource: Send {
    fn triggered(self) -> TriggerFuture;

    /// Fire when either this source or `other` fires.
    fn or<B>(self, other: B) -> FirstOf<Self, B>
    where
        Self: Sized,
        B: CancelSource,
    {
        FirstOf { a: self, b: other }
    }
}

/// Fires after a fixed delay.
#[derive(Debug, Clone, Copy)]
pub struct Timeout(pub Duration);

impl CancelSource for Timeout {
    fn triggered(self) -> TriggerFuture {
        Box::pin(async move {
            tokio::time::sleep(self.0).await;
            debug!(after = ?self.0, "Timeout elapsed");
            Ok(())
        })
    }
}

/// Fires when a token owned by someone else is cancelled.
#[derive(Debug, Clone)]
pub struct Manual(pub CancellationToken);

impl CancelSource for Manual {
    fn triggered(self) -> TriggerFuture {
        Box::pin(async move {
            self.0.cancelled().await;
            Ok(())
        })
    }
}

/// Fires on Ctrl+C.
#[derive(Debug, Clone, Copy, Default)]
pub struct CtrlC;

impl CancelSource for CtrlC {
    fn triggered(self) -> TriggerFuture {
        Box::pin(async {
            tokio::signal::ctrl_c().await?;
            debug!("Received Ctrl+C");
            Ok(())
        })
    }
}

/// Fires when a line, or end of input, is read from `reader`.
pub struct InputWatcher<R> {
    reader: R,
}

impl<R> InputWatcher<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl InputWatcher<BufReader<Stdin>> {
    /// Watch the process's standard input.
    ///
    /// Tokio reads stdin on a blocking thread, so a runtime waiting on this
    /// source should be shut down with a timeout once the scheduler stops.
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R> CancelSource for InputWatcher<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    fn triggered(mut self) -> TriggerFuture {
        Box::pin(async move {
            let mut line = String::new();
            let read = self.reader.read_line(&mut line).await?;
            if read == 0 {
                debug!("Input closed");
            } else {
                debug!(input = line.trim_end(), "Input received");
            }
            Ok(())
        })
    }
}

/// Two sources combined with [`CancelSource::or`].
pub struct FirstOf<A, B> {
    a: A,
    b: B,
}

impl<A, B> CancelSource for FirstOf<A, B>
where
    A: CancelSource,
    B: CancelSource,
{
    fn triggered(self) -> TriggerFuture {
        let a = self.a.triggered();
        let b = self.b.triggered();
        Box::pin(async move {
            tokio::select! {
                fired = a => fired,
                fired = b => fired,
            }
        })
    }
}
