use std::fmt;
use std::sync::Arc;
use std::thread::ThreadId;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info, warn};

use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::owner::OwnerId;
use crate::shared::SchedulerShared;
use crate::task::{Completion, TaskId, TaskRecord};

/// Longest delay a deadline is computed with; keeps `Instant` arithmetic in range.
const MAX_DELAY: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

/// An async task occurrence currently executing on a worker thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveWorker {
    pub task_id: TaskId,
    pub owner: OwnerId,
    pub thread_id: ThreadId,
    pub thread_name: Option<String>,
}

/// Background half of the scheduler.
///
/// Each async record gets its own timer task on a dedicated tokio runtime.
/// The timer sleeps until the record's deadline, then runs the body on the
/// blocking pool and waits for it before computing the next deadline, so
/// occurrences of one record never overlap. The blocking pool size
/// (`max_workers`) bounds how many bodies execute at once.
pub(crate) struct WorkerPool {
    runtime: Mutex<Option<Runtime>>,
    tick_length: Duration,
}

impl WorkerPool {
    pub(crate) fn new(config: &SchedulerConfig) -> Result<Self, SchedulerError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(config.worker_threads)
            .max_blocking_threads(config.max_workers)
            .thread_name(config.thread_name.clone())
            .enable_time()
            .build()?;

        Ok(Self {
            runtime: Mutex::new(Some(runtime)),
            tick_length: config.tick_length,
        })
    }

    pub(crate) fn tick_length(&self) -> Duration {
        self.tick_length
    }

    /// Start the timer for an async record. Its first deadline is `delay` ticks from now.
    pub(crate) fn submit(
        &self,
        shared: Arc<SchedulerShared>,
        record: Arc<TaskRecord>,
    ) -> Result<(), SchedulerError> {
        let runtime = self.runtime.lock();
        let runtime = runtime.as_ref().ok_or(SchedulerError::ShuttingDown)?;

        let delay = ticks_to_duration(self.tick_length, record.delay());
        record.set_next_run_deadline(deadline_after(Instant::now(), delay));
        runtime.spawn(drive_record(shared, record, self.tick_length));
        Ok(())
    }

    /// Stop the runtime, waiting up to `timeout` for executing bodies.
    ///
    /// Must not be called from inside a task body.
    pub(crate) fn shutdown(&self, timeout: Duration) {
        let runtime = self.runtime.lock().take();
        if let Some(runtime) = runtime {
            info!(timeout_ms = timeout.as_millis() as u64, "Shutting down worker pool");
            runtime.shutdown_timeout(timeout);
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.runtime.lock().is_some()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.get_mut().take() {
            runtime.shutdown_background();
        }
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("tick_length", &self.tick_length)
            .field("running", &self.is_running())
            .finish()
    }
}

pub(crate) fn ticks_to_duration(tick_length: Duration, ticks: u64) -> Duration {
    let nanos = tick_length.as_nanos().saturating_mul(u128::from(ticks));
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

fn deadline_after(from: Instant, delay: Duration) -> Instant {
    from + delay.min(MAX_DELAY)
}

/// Timer loop of one async record. Exits once the record is finished or cancelled.
async fn drive_record(shared: Arc<SchedulerShared>, record: Arc<TaskRecord>, tick_length: Duration) {
    let period = record
        .kind()
        .period()
        .map(|period| ticks_to_duration(tick_length, period));

    while let Some(deadline) = record.next_run_deadline() {
        tokio::select! {
            _ = tokio::time::sleep_until(deadline.into()) => {}
            _ = record.cancelled() => {}
        }

        if !record.try_queue() {
            shared.registry.remove(record.id());
            return;
        }
        if !shared.owner_enabled(&record) {
            shared.drop_orphan(&record);
            return;
        }

        let runner = Arc::clone(&record);
        let executed = tokio::task::spawn_blocking(move || {
            if !runner.try_start() {
                return None;
            }
            Some(runner.body().invoke())
        })
        .await;

        match executed {
            Ok(Some(Err(message))) => shared.report_failure(&record, message),
            Ok(_) => {}
            Err(error) => {
                warn!(task_id = %record.id(), error = %error, "Async occurrence did not complete");
            }
        }

        // A late occurrence is deferred to "now", never dropped or bunched up.
        let now = Instant::now();
        let next = period
            .map(|period| deadline_after(deadline, period).max(now))
            .unwrap_or(now);

        match record.finish_async(next) {
            Completion::Rescheduled => {
                debug!(task_id = %record.id(), "Rescheduled async task");
            }
            Completion::Finished | Completion::Cancelled => {
                shared.registry.remove(record.id());
                return;
            }
        }
    }
}
