use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{panic_message, TaskFailure};
use crate::owner::OwnerLiveness;
use crate::registry::TaskRegistry;
use crate::task::{TaskRecord, TaskState};

/// Callback receiving every task body failure
pub type FailureHook = Arc<dyn Fn(&TaskFailure) + Send + Sync>;

/// State shared by the facade, the tick driver and the worker pool.
pub(crate) struct SchedulerShared {
    pub(crate) registry: TaskRegistry,
    tick: AtomicU64,
    shutting_down: AtomicBool,
    liveness: Arc<dyn OwnerLiveness>,
    failure_hook: Option<FailureHook>,
}

impl SchedulerShared {
    pub(crate) fn new(liveness: Arc<dyn OwnerLiveness>, failure_hook: Option<FailureHook>) -> Self {
        Self {
            registry: TaskRegistry::new(),
            tick: AtomicU64::new(0),
            shutting_down: AtomicBool::new(false),
            liveness,
            failure_hook,
        }
    }

    pub(crate) fn current_tick(&self) -> u64 {
        self.tick.load(Ordering::SeqCst)
    }

    /// Advance the clock by one tick and return the new value.
    pub(crate) fn next_tick(&self) -> u64 {
        self.tick.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    pub(crate) fn begin_shutdown(&self) -> bool {
        !self.shutting_down.swap(true, Ordering::SeqCst)
    }

    /// Ask the host whether the record's owner is enabled. A panicking
    /// query counts as disabled.
    pub(crate) fn owner_enabled(&self, record: &TaskRecord) -> bool {
        let owner = record.owner();
        match panic::catch_unwind(AssertUnwindSafe(|| self.liveness.is_enabled(owner))) {
            Ok(enabled) => enabled,
            Err(payload) => {
                tracing::error!(
                    task_id = %record.id(),
                    owner = %owner,
                    error = %panic_message(&*payload),
                    "Owner liveness query panicked"
                );
                false
            }
        }
    }

    /// Cancel a record, evicting it unless an occurrence is still running;
    /// the executor evicts running records once their occurrence returns.
    pub(crate) fn cancel_record(&self, record: &TaskRecord) -> bool {
        match record.cancel() {
            Some(TaskState::Running) => true,
            Some(_) => {
                self.registry.remove(record.id());
                true
            }
            None => false,
        }
    }

    /// Cancel a record whose owner was disabled behind the scheduler's back.
    pub(crate) fn drop_orphan(&self, record: &TaskRecord) {
        tracing::warn!(
            task_id = %record.id(),
            owner = %record.owner(),
            "Owner is disabled, cancelling task instead of running it"
        );
        record.cancel();
        self.registry.remove(record.id());
    }

    pub(crate) fn report_failure(&self, record: &TaskRecord, message: String) {
        let failure = TaskFailure {
            task_id: record.id(),
            owner: record.owner(),
            placement: record.placement(),
            message,
        };
        tracing::error!(
            task_id = %failure.task_id,
            owner = %failure.owner,
            placement = ?failure.placement,
            error = %failure.message,
            "Task body panicked"
        );
        if let Some(hook) = &self.failure_hook {
            if panic::catch_unwind(AssertUnwindSafe(|| hook(&failure))).is_err() {
                tracing::error!(task_id = %failure.task_id, "Task failure hook panicked");
            }
        }
    }
}
