use super::r#trait::{Runnable, TaskFuture};
use crate::error::TaskError;
use std::future::Future;

/// Adapts a closure returning a future into a [`Runnable`].
pub struct FnRunnable<F> {
    func: F,
}

impl<F> FnRunnable<F> {
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F, Fut> Runnable for FnRunnable<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    fn run(&self) -> TaskFuture<'_> {
        Box::pin((self.func)())
    }
}
