use std::fmt;

/// Identifier of a scheduled task.
///
/// Valid ids are positive and never reused while the process runs.
/// [`TaskId::INVALID`] (`-1`) signals that a task could not be scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(i32);

impl TaskId {
    pub const INVALID: TaskId = TaskId(-1);

    pub const fn get(self) -> i32 {
        self.0
    }

    pub const fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl From<i32> for TaskId {
    fn from(raw: i32) -> Self {
        TaskId(raw)
    }
}

impl From<TaskId> for i32 {
    fn from(id: TaskId) -> Self {
        id.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which thread executes a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placement {
    /// The host's main thread, during `TickDriver::advance`.
    Sync,
    /// A worker thread owned by the scheduler.
    Async,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    OneShot,
    /// Repeats every `period` ticks until cancelled. `period` is always positive.
    Repeating { period: u64 },
}

impl TaskKind {
    pub fn period(&self) -> Option<u64> {
        match self {
            TaskKind::OneShot => None,
            TaskKind::Repeating { period } => Some(*period),
        }
    }

    pub fn is_repeating(&self) -> bool {
        matches!(self, TaskKind::Repeating { .. })
    }
}

/// Run state of a task.
///
/// `Pending → Queued → Running → {Finished | Pending}`, with `Cancelled`
/// reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    /// Not yet due.
    Pending,
    /// Due and waiting for the main thread or a worker.
    Queued,
    Running,
    Cancelled,
    Finished,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Cancelled | TaskState::Finished)
    }
}
