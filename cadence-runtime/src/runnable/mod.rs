mod r#trait;
mod func;

pub use r#trait::{Runnable, TaskFuture};
pub use func::FnRunnable;
