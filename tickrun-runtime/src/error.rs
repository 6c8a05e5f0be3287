use std::any::Any;
use std::fmt;

use thiserror::Error;

use crate::owner::OwnerId;
use crate::task::{Placement, TaskId};

/// Errors returned by the scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A submission argument was rejected; no task was created.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The id counter reached its upper bound.
    #[error("task id space exhausted")]
    IdsExhausted,

    /// The scheduler no longer accepts submissions.
    #[error("scheduler is shutting down")]
    ShuttingDown,

    /// The body of a call-and-wait task panicked.
    #[error("task {task_id} panicked: {message}")]
    TaskPanicked { task_id: TaskId, message: String },

    /// A call-and-wait task was cancelled before producing a value.
    #[error("task {0} was cancelled before it ran")]
    TaskCancelled(TaskId),

    /// Configuration could not be loaded or deserialized.
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),

    /// The worker runtime could not be started.
    #[error("failed to start worker runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

impl SchedulerError {
    /// Whether this error is a scheduling failure (reported as id `-1` by the `schedule_*` family).
    pub fn is_scheduling_failure(&self) -> bool {
        matches!(self, SchedulerError::IdsExhausted | SchedulerError::ShuttingDown)
    }
}

/// A task body that panicked during one of its occurrences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    pub task_id: TaskId,
    pub owner: OwnerId,
    pub placement: Placement,
    pub message: String,
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} task {} owned by {} failed: {}",
            self.placement, self.task_id, self.owner, self.message
        )
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
