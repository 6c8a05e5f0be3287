use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::shared::SchedulerShared;
use crate::task::Completion;

/// What happened during one [`TickDriver::advance`] call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub tick: u64,
    /// Bodies invoked, including the ones that panicked.
    pub executed: usize,
    pub failed: usize,
    /// Due records skipped because they were cancelled or their owner is disabled.
    pub skipped: usize,
    /// Terminal records evicted from the registry.
    pub evicted: usize,
}

/// Main-thread half of the scheduler.
///
/// The host loop owns the only `TickDriver` and calls [`advance`](Self::advance)
/// once per tick. Sync task bodies run inline inside that call, which is
/// what gives them access to main-thread state.
pub struct TickDriver {
    shared: Arc<SchedulerShared>,
}

impl TickDriver {
    pub(crate) fn new(shared: Arc<SchedulerShared>) -> Self {
        Self { shared }
    }

    /// Number of ticks advanced so far
    pub fn current_tick(&self) -> u64 {
        self.shared.current_tick()
    }

    /// Advance the clock by one tick and run every due sync task.
    ///
    /// Due tasks run in ascending id order. Tasks submitted by a body during
    /// this call are considered on the next call at the earliest. Body panics
    /// are caught and reported; this method never blocks on other threads
    /// and never panics because of a task.
    pub fn advance(&mut self) -> TickSummary {
        let tick = self.shared.next_tick();
        let due = self.shared.registry.take_due_sync(tick);
        let mut summary = TickSummary {
            tick,
            ..TickSummary::default()
        };

        for record in due {
            if !self.shared.owner_enabled(&record) {
                self.shared.drop_orphan(&record);
                summary.skipped += 1;
                continue;
            }
            if !record.try_start() {
                // cancelled between selection and execution
                self.shared.registry.remove(record.id());
                summary.skipped += 1;
                continue;
            }

            let outcome = record.body().invoke();
            summary.executed += 1;
            if let Err(message) = outcome {
                summary.failed += 1;
                self.shared.report_failure(&record, message);
            }

            match record.finish_sync(tick) {
                Completion::Rescheduled => {
                    debug!(task_id = %record.id(), tick, next_run_tick = record.next_run_tick(), "Rescheduled sync task");
                }
                Completion::Finished | Completion::Cancelled => {
                    self.shared.registry.remove(record.id());
                }
            }
        }

        summary.evicted = self.shared.registry.sweep();
        summary
    }
}

impl fmt::Debug for TickDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickDriver")
            .field("current_tick", &self.current_tick())
            .finish()
    }
}
