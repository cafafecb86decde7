use thiserror::Error;

/// Failure returned by a task's action.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Source(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl TaskError {
    pub fn msg(message: impl Into<String>) -> Self {
        TaskError::Message(message.into())
    }

    pub fn new<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        TaskError::Source(Box::new(error))
    }
}

impl From<std::io::Error> for TaskError {
    fn from(error: std::io::Error) -> Self {
        TaskError::new(error)
    }
}

impl From<String> for TaskError {
    fn from(message: String) -> Self {
        TaskError::Message(message)
    }
}

impl From<&str> for TaskError {
    fn from(message: &str) -> Self {
        TaskError::Message(message.to_string())
    }
}

/// Errors raised while loading or resolving configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid {field} '{value}': {reason}")]
    Invalid {
        field: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, value: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Every way a scheduler operation can end unsuccessfully, including the
/// deliberate [`SchedulerError::Cancelled`] shutdown.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("task '{name}' is already registered")]
    DuplicateTask { name: String },

    #[error("no task named '{name}' is registered")]
    TaskNotFound { name: String },

    #[error("task '{name}' failed: {source}")]
    TaskFailed {
        name: String,
        #[source]
        source: TaskError,
    },

    #[error("scheduler has no tasks to run")]
    NoTasksRegistered,

    #[error("operation cancelled")]
    Cancelled,

    /// The cancellation source itself failed, e.g. the Ctrl+C handler could
    /// not be installed. The loop was still stopped.
    #[error("cancellation source failed: {0}")]
    SourceFailed(#[source] std::io::Error),

    #[error("scheduler loop panicked: {message}")]
    Panicked { message: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SchedulerError {
    /// True for the clean shutdown outcome, false for every failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SchedulerError::Cancelled)
    }
}
