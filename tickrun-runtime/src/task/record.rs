use std::thread::{self, ThreadId};
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::Notify;

use super::{Placement, TaskId, TaskKind, TaskState};
use crate::owner::OwnerId;
use crate::runnable::TaskBody;

/// Thread currently executing an occurrence. Only used to answer queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExecutingThread {
    pub(crate) id: ThreadId,
    pub(crate) name: Option<String>,
}

impl ExecutingThread {
    fn current() -> Self {
        let current = thread::current();
        Self {
            id: current.id(),
            name: current.name().map(str::to_string),
        }
    }
}

#[derive(Debug)]
struct Schedule {
    state: TaskState,
    next_run_tick: u64,
    next_run_deadline: Option<Instant>,
    executing: Option<ExecutingThread>,
}

/// Outcome of an occurrence, decided under the record lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Completion {
    Rescheduled,
    Finished,
    Cancelled,
}

/// Identity and run state of one scheduled unit of work.
///
/// Identity fields are immutable; the schedule is guarded by a per-record
/// lock that is never held while the body runs.
#[derive(Debug)]
pub(crate) struct TaskRecord {
    id: TaskId,
    owner: OwnerId,
    kind: TaskKind,
    placement: Placement,
    delay: u64,
    body: TaskBody,
    schedule: Mutex<Schedule>,
    cancelled: Notify,
}

impl TaskRecord {
    pub(crate) fn new(
        id: TaskId,
        owner: OwnerId,
        kind: TaskKind,
        placement: Placement,
        delay: u64,
        body: TaskBody,
        next_run_tick: u64,
    ) -> Self {
        Self {
            id,
            owner,
            kind,
            placement,
            delay,
            body,
            schedule: Mutex::new(Schedule {
                state: TaskState::Pending,
                next_run_tick,
                next_run_deadline: None,
                executing: None,
            }),
            cancelled: Notify::new(),
        }
    }

    pub(crate) fn id(&self) -> TaskId {
        self.id
    }

    pub(crate) fn owner(&self) -> OwnerId {
        self.owner
    }

    pub(crate) fn kind(&self) -> TaskKind {
        self.kind
    }

    pub(crate) fn placement(&self) -> Placement {
        self.placement
    }

    pub(crate) fn delay(&self) -> u64 {
        self.delay
    }

    pub(crate) fn body(&self) -> &TaskBody {
        &self.body
    }

    pub(crate) fn state(&self) -> TaskState {
        self.schedule.lock().state
    }

    pub(crate) fn next_run_tick(&self) -> u64 {
        self.schedule.lock().next_run_tick
    }

    pub(crate) fn next_run_deadline(&self) -> Option<Instant> {
        self.schedule.lock().next_run_deadline
    }

    pub(crate) fn set_next_run_deadline(&self, deadline: Instant) {
        self.schedule.lock().next_run_deadline = Some(deadline);
    }

    pub(crate) fn executing_thread(&self) -> Option<ExecutingThread> {
        self.schedule.lock().executing.clone()
    }

    /// Whether an occurrence is executing right now, even if already cancelled.
    pub(crate) fn is_executing(&self) -> bool {
        self.schedule.lock().executing.is_some()
    }

    /// Terminal with no occurrence still executing.
    pub(crate) fn is_evictable(&self) -> bool {
        let schedule = self.schedule.lock();
        schedule.state.is_terminal() && schedule.executing.is_none()
    }

    /// Pending → Queued if the record is due at `tick`.
    pub(crate) fn queue_if_due(&self, tick: u64) -> bool {
        let mut schedule = self.schedule.lock();
        if schedule.state == TaskState::Pending && schedule.next_run_tick <= tick {
            schedule.state = TaskState::Queued;
            return true;
        }
        false
    }

    /// Pending → Queued regardless of tick (async deadlines are checked by the timer).
    pub(crate) fn try_queue(&self) -> bool {
        let mut schedule = self.schedule.lock();
        if schedule.state == TaskState::Pending {
            schedule.state = TaskState::Queued;
            return true;
        }
        false
    }

    /// Queued → Running on the calling thread. Fails if cancelled meanwhile.
    pub(crate) fn try_start(&self) -> bool {
        let mut schedule = self.schedule.lock();
        if schedule.state != TaskState::Queued {
            return false;
        }
        schedule.state = TaskState::Running;
        schedule.executing = Some(ExecutingThread::current());
        true
    }

    /// Move to `Cancelled` from any non-terminal state.
    ///
    /// Returns the previous state, or `None` if the record was already terminal.
    /// A running occurrence is not interrupted.
    pub(crate) fn cancel(&self) -> Option<TaskState> {
        let previous = {
            let mut schedule = self.schedule.lock();
            if schedule.state.is_terminal() {
                return None;
            }
            std::mem::replace(&mut schedule.state, TaskState::Cancelled)
        };
        self.body.discard();
        self.cancelled.notify_one();
        Some(previous)
    }

    /// Resolves once the record has been cancelled.
    pub(crate) async fn cancelled(&self) {
        if self.state() == TaskState::Cancelled {
            return;
        }
        self.cancelled.notified().await;
    }

    /// End a sync occurrence that ran at `current_tick`.
    pub(crate) fn finish_sync(&self, current_tick: u64) -> Completion {
        let period = self.kind.period();
        self.finish(|schedule| {
            if let Some(period) = period {
                schedule.next_run_tick = current_tick.saturating_add(period);
            }
        })
    }

    /// End an async occurrence; a repeating record next fires at `next_deadline`.
    pub(crate) fn finish_async(&self, next_deadline: Instant) -> Completion {
        self.finish(|schedule| schedule.next_run_deadline = Some(next_deadline))
    }

    fn finish(&self, reschedule: impl FnOnce(&mut Schedule)) -> Completion {
        let mut schedule = self.schedule.lock();
        schedule.executing = None;
        match schedule.state {
            TaskState::Cancelled => Completion::Cancelled,
            _ if self.kind.is_repeating() => {
                schedule.state = TaskState::Pending;
                reschedule(&mut schedule);
                Completion::Rescheduled
            }
            _ => {
                schedule.state = TaskState::Finished;
                Completion::Finished
            }
        }
    }
}
