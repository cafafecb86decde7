use crate::error::TaskError;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by [`Runnable::run`].
pub type TaskFuture<'a> = Pin<Box<dyn Future<Output = Result<(), TaskError>> + Send + 'a>>;

/// The work a task performs each time it comes due.
///
/// Implement this trait on your struct to make it schedulable, or wrap a
/// closure with [`Task::from_fn`](crate::Task::from_fn).
///
/// # Example
///
/// ```rust
/// use cadence_runtime::{Runnable, TaskFuture};
///
/// struct CacheWarmer {
///     region: String,
/// }
///
/// impl Runnable for CacheWarmer {
///     fn run(&self) -> TaskFuture<'_> {
///         Box::pin(async move {
///             println!("Warming cache in {}", self.region);
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait Runnable: Send + Sync {
    /// Execute one run of the task
    fn run(&self) -> TaskFuture<'_>;
}
