use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::call::{wrap_callable, SyncCall};
use super::handle::TaskHandle;
use crate::error::SchedulerError;
use crate::owner::OwnerId;
use crate::registry::TaskSpec;
use crate::runnable::{Runnable, TaskBody};
use crate::shared::SchedulerShared;
use crate::task::{Placement, TaskId, TaskKind, TaskState};
use crate::worker::{ActiveWorker, WorkerPool};

/// Public face of the scheduler, shared by every plugin.
///
/// Cloning is cheap and every clone talks to the same registry. Sync tasks
/// run inside [`TickDriver::advance`](crate::TickDriver::advance) on the
/// host's main thread; async tasks run on worker threads and must not touch
/// main-thread state.
///
/// Delays and periods are measured in ticks.
#[derive(Clone)]
pub struct Scheduler {
    pub(crate) shared: Arc<SchedulerShared>,
    pub(crate) workers: Arc<WorkerPool>,
    pub(crate) shutdown_timeout: Duration,
}

impl Scheduler {
    /// Single entry point behind every submission method
    fn schedule_internal(
        &self,
        owner: OwnerId,
        placement: Placement,
        kind: TaskKind,
        delay: u64,
        body: TaskBody,
    ) -> Result<TaskHandle, SchedulerError> {
        let owner = owner.validate()?;
        if kind.period() == Some(0) {
            return Err(SchedulerError::InvalidArgument(
                "period must be positive".to_string(),
            ));
        }
        if self.shared.is_shutting_down() {
            return Err(SchedulerError::ShuttingDown);
        }

        let next_run_tick = self.shared.current_tick().saturating_add(delay);
        let record = self.shared.registry.allocate(
            TaskSpec {
                owner,
                kind,
                placement,
                delay,
                body,
            },
            next_run_tick,
        )?;

        // shutdown may have swept the registry between the check above and the insert
        if self.shared.is_shutting_down() {
            record.cancel();
            self.shared.registry.remove(record.id());
            return Err(SchedulerError::ShuttingDown);
        }

        if placement == Placement::Async {
            if let Err(e) = self.workers.submit(Arc::clone(&self.shared), Arc::clone(&record)) {
                record.cancel();
                self.shared.registry.remove(record.id());
                return Err(e);
            }
        }

        debug!(
            task_id = %record.id(),
            owner = %owner,
            placement = ?placement,
            kind = ?kind,
            delay,
            "Scheduled task"
        );
        Ok(TaskHandle::new(record, Arc::clone(&self.shared)))
    }

    fn schedule_runnable<R>(
        &self,
        owner: OwnerId,
        placement: Placement,
        kind: TaskKind,
        delay: u64,
        task: R,
    ) -> Result<TaskHandle, SchedulerError>
    where
        R: Runnable + 'static,
    {
        self.schedule_internal(owner, placement, kind, delay, TaskBody::runnable(Arc::new(task)))
    }

    /// Map scheduling failures to [`TaskId::INVALID`]; argument errors are still raised.
    fn legacy_id(result: Result<TaskHandle, SchedulerError>) -> Result<TaskId, SchedulerError> {
        match result {
            Ok(handle) => Ok(handle.task_id()),
            Err(e) if e.is_scheduling_failure() => {
                warn!(error = %e, "Could not schedule task");
                Ok(TaskId::INVALID)
            }
            Err(e) => Err(e),
        }
    }

    // ---------------------------------------------------------------------
    // id-returning family
    // ---------------------------------------------------------------------

    /// Run `task` once on the main thread after `delay` ticks.
    ///
    /// Returns [`TaskId::INVALID`] if the task could not be scheduled.
    pub fn schedule_sync_delayed<R>(
        &self,
        owner: OwnerId,
        task: R,
        delay: u64,
    ) -> Result<TaskId, SchedulerError>
    where
        R: Runnable + 'static,
    {
        Self::legacy_id(self.run_later(owner, task, delay))
    }

    /// Run `task` on the main thread after `delay` ticks, then every `period` ticks.
    ///
    /// Returns [`TaskId::INVALID`] if the task could not be scheduled.
    pub fn schedule_sync_repeating<R>(
        &self,
        owner: OwnerId,
        task: R,
        delay: u64,
        period: u64,
    ) -> Result<TaskId, SchedulerError>
    where
        R: Runnable + 'static,
    {
        Self::legacy_id(self.run_timer(owner, task, delay, period))
    }

    /// Run `task` once on a worker thread after `delay` ticks.
    pub fn schedule_async_delayed<R>(
        &self,
        owner: OwnerId,
        task: R,
        delay: u64,
    ) -> Result<TaskId, SchedulerError>
    where
        R: Runnable + 'static,
    {
        Self::legacy_id(self.run_later_async(owner, task, delay))
    }

    /// Run `task` on a worker thread after `delay` ticks, then every `period` ticks.
    pub fn schedule_async_repeating<R>(
        &self,
        owner: OwnerId,
        task: R,
        delay: u64,
        period: u64,
    ) -> Result<TaskId, SchedulerError>
    where
        R: Runnable + 'static,
    {
        Self::legacy_id(self.run_timer_async(owner, task, delay, period))
    }

    // ---------------------------------------------------------------------
    // handle-returning family
    // ---------------------------------------------------------------------

    /// Run `task` on the main thread on the next tick
    pub fn run_sync<R>(&self, owner: OwnerId, task: R) -> Result<TaskHandle, SchedulerError>
    where
        R: Runnable + 'static,
    {
        self.schedule_runnable(owner, Placement::Sync, TaskKind::OneShot, 0, task)
    }

    /// Run `task` on a worker thread as soon as possible
    pub fn run_async<R>(&self, owner: OwnerId, task: R) -> Result<TaskHandle, SchedulerError>
    where
        R: Runnable + 'static,
    {
        self.schedule_runnable(owner, Placement::Async, TaskKind::OneShot, 0, task)
    }

    /// Run `task` on the main thread after `delay` ticks
    pub fn run_later<R>(
        &self,
        owner: OwnerId,
        task: R,
        delay: u64,
    ) -> Result<TaskHandle, SchedulerError>
    where
        R: Runnable + 'static,
    {
        self.schedule_runnable(owner, Placement::Sync, TaskKind::OneShot, delay, task)
    }

    /// Run `task` on a worker thread after `delay` ticks
    pub fn run_later_async<R>(
        &self,
        owner: OwnerId,
        task: R,
        delay: u64,
    ) -> Result<TaskHandle, SchedulerError>
    where
        R: Runnable + 'static,
    {
        self.schedule_runnable(owner, Placement::Async, TaskKind::OneShot, delay, task)
    }

    /// Run `task` on the main thread after `delay` ticks, then every `period` ticks
    pub fn run_timer<R>(
        &self,
        owner: OwnerId,
        task: R,
        delay: u64,
        period: u64,
    ) -> Result<TaskHandle, SchedulerError>
    where
        R: Runnable + 'static,
    {
        self.schedule_runnable(owner, Placement::Sync, TaskKind::Repeating { period }, delay, task)
    }

    /// Run `task` on a worker thread after `delay` ticks, then every `period` ticks.
    ///
    /// Occurrences never overlap: a late occurrence waits for the previous one to return.
    pub fn run_timer_async<R>(
        &self,
        owner: OwnerId,
        task: R,
        delay: u64,
        period: u64,
    ) -> Result<TaskHandle, SchedulerError>
    where
        R: Runnable + 'static,
    {
        self.schedule_runnable(owner, Placement::Async, TaskKind::Repeating { period }, delay, task)
    }

    // ---------------------------------------------------------------------
    // cross-thread calls
    // ---------------------------------------------------------------------

    /// Schedule `call` on the main thread for the next tick and return a
    /// handle to its result.
    pub fn call_sync_method<T, F>(&self, owner: OwnerId, call: F) -> Result<SyncCall<T>, SchedulerError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (body, receiver) = wrap_callable(call);
        let handle = self.schedule_internal(
            owner,
            Placement::Sync,
            TaskKind::OneShot,
            0,
            TaskBody::callable(body),
        )?;
        Ok(SyncCall::new(handle, receiver))
    }

    /// Run `call` on the main thread and block until it returns.
    ///
    /// Must NOT be called from the main thread (it would wait for a tick that
    /// can never happen) nor from inside an async context. There is no
    /// timeout; use [`call_sync_method`](Self::call_sync_method) with
    /// [`SyncCall::wait_timeout`] for a bounded wait.
    pub fn call_sync_and_wait<T, F>(&self, owner: OwnerId, call: F) -> Result<T, SchedulerError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        self.call_sync_method(owner, call)?.wait()
    }

    // ---------------------------------------------------------------------
    // cancellation
    // ---------------------------------------------------------------------

    /// Cancel a task by id. Unknown and already finished ids are ignored.
    pub fn cancel(&self, id: impl Into<TaskId>) {
        let id = id.into();
        if let Some(record) = self.shared.registry.lookup(id) {
            if self.shared.cancel_record(&record) {
                debug!(task_id = %id, "Cancelled task");
            }
        }
    }

    /// Cancel every task owned by `owner`; call when the owning plugin is disabled.
    /// Returns how many tasks were cancelled.
    pub fn cancel_tasks(&self, owner: OwnerId) -> usize {
        let cancelled = self
            .shared
            .registry
            .owned_by(owner)
            .iter()
            .filter(|record| self.shared.cancel_record(record))
            .count();
        info!(owner = %owner, cancelled, "Cancelled tasks of owner");
        cancelled
    }

    /// Cancel every task of every owner. Returns how many tasks were cancelled.
    pub fn cancel_all(&self) -> usize {
        let cancelled = self
            .shared
            .registry
            .all()
            .iter()
            .filter(|record| self.shared.cancel_record(record))
            .count();
        info!(cancelled, "Cancelled all tasks");
        cancelled
    }

    // ---------------------------------------------------------------------
    // queries (snapshots; may be stale by the time they are read)
    // ---------------------------------------------------------------------

    /// Whether an occurrence of the task is executing right now
    pub fn is_running(&self, id: impl Into<TaskId>) -> bool {
        self.shared
            .registry
            .lookup(id.into())
            .is_some_and(|record| record.is_executing())
    }

    /// Whether the task is due and waiting for the main thread or a worker
    pub fn is_queued(&self, id: impl Into<TaskId>) -> bool {
        self.shared
            .registry
            .lookup(id.into())
            .is_some_and(|record| record.state() == TaskState::Queued)
    }

    /// Look up a live task by id
    pub fn task(&self, id: impl Into<TaskId>) -> Option<TaskHandle> {
        self.shared
            .registry
            .lookup(id.into())
            .map(|record| TaskHandle::new(record, Arc::clone(&self.shared)))
    }

    /// Async occurrences currently executing on worker threads
    pub fn list_active_workers(&self) -> Vec<ActiveWorker> {
        self.shared
            .registry
            .all()
            .iter()
            .filter(|record| record.placement() == Placement::Async)
            .filter_map(|record| {
                record.executing_thread().map(|thread| ActiveWorker {
                    task_id: record.id(),
                    owner: record.owner(),
                    thread_id: thread.id,
                    thread_name: thread.name,
                })
            })
            .collect()
    }

    /// Every task that has not finished or been cancelled; order is unspecified
    pub fn list_pending_tasks(&self) -> Vec<TaskHandle> {
        self.shared
            .registry
            .pending()
            .into_iter()
            .map(|record| TaskHandle::new(record, Arc::clone(&self.shared)))
            .collect()
    }

    /// Ticks advanced so far by the [`TickDriver`](crate::TickDriver)
    pub fn current_tick(&self) -> u64 {
        self.shared.current_tick()
    }

    pub fn tick_length(&self) -> Duration {
        self.workers.tick_length()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shared.is_shutting_down()
    }

    /// Stop accepting tasks, cancel everything, and stop the worker threads,
    /// waiting up to the configured shutdown timeout for executing async bodies.
    ///
    /// Must not be called from inside a task body.
    pub fn shutdown(&self) {
        if !self.shared.begin_shutdown() {
            return;
        }
        info!("Shutting down scheduler");
        self.cancel_all();
        self.workers.shutdown(self.shutdown_timeout);
        info!("✅ Scheduler stopped");
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("current_tick", &self.current_tick())
            .field("tasks", &self.shared.registry.len())
            .field("workers", &self.workers)
            .finish()
    }
}
