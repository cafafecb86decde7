use crate::task::DeclaredTask;

/// Global distributed slice collecting tasks declared with `#[periodic]`
#[linkme::distributed_slice]
pub static PERIODIC_TASKS: [fn() -> DeclaredTask] = [..];
