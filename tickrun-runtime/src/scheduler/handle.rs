use std::fmt;
use std::sync::Arc;

use crate::owner::OwnerId;
use crate::shared::SchedulerShared;
use crate::task::{Placement, TaskId, TaskKind, TaskRecord, TaskState};

/// Handle for a scheduled task
/// Used to inspect and cancel the task
#[derive(Clone)]
pub struct TaskHandle {
    pub(crate) record: Arc<TaskRecord>,
    pub(crate) shared: Arc<SchedulerShared>,
}

impl TaskHandle {
    pub(crate) fn new(record: Arc<TaskRecord>, shared: Arc<SchedulerShared>) -> Self {
        Self { record, shared }
    }

    pub fn task_id(&self) -> TaskId {
        self.record.id()
    }

    pub fn owner(&self) -> OwnerId {
        self.record.owner()
    }

    pub fn kind(&self) -> TaskKind {
        self.record.kind()
    }

    pub fn placement(&self) -> Placement {
        self.record.placement()
    }

    /// Whether the task runs on the main thread
    pub fn is_sync(&self) -> bool {
        self.record.placement() == Placement::Sync
    }

    /// Snapshot of the run state; may be stale by the time it is read
    pub fn state(&self) -> TaskState {
        self.record.state()
    }

    pub fn is_cancelled(&self) -> bool {
        self.record.state() == TaskState::Cancelled
    }

    /// Cancel the task. An occurrence that is already executing finishes,
    /// but the task never runs again. Returns `false` if it was already
    /// finished or cancelled.
    pub fn cancel(&self) -> bool {
        self.shared.cancel_record(&self.record)
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("task_id", &self.task_id())
            .field("owner", &self.owner())
            .field("kind", &self.kind())
            .field("placement", &self.placement())
            .field("state", &self.state())
            .finish()
    }
}
