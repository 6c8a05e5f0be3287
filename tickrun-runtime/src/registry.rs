use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::SchedulerError;
use crate::owner::OwnerId;
use crate::runnable::TaskBody;
use crate::task::{Placement, TaskId, TaskKind, TaskRecord};

/// Parameters of a new record
#[derive(Debug)]
pub(crate) struct TaskSpec {
    pub(crate) owner: OwnerId,
    pub(crate) kind: TaskKind,
    pub(crate) placement: Placement,
    pub(crate) delay: u64,
    pub(crate) body: TaskBody,
}

/// Store of every live task record, keyed (and therefore ordered) by id.
///
/// The map lock is only held for lookups and snapshots, never while a body runs.
/// Lock order is map, then record.
#[derive(Debug)]
pub(crate) struct TaskRegistry {
    records: Mutex<BTreeMap<TaskId, Arc<TaskRecord>>>,
    next_id: AtomicI32,
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskRegistry {
    pub(crate) fn new() -> Self {
        Self::starting_at(1)
    }

    fn starting_at(first_id: i32) -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
            next_id: AtomicI32::new(first_id),
        }
    }

    /// Create and store a record with a fresh id.
    ///
    /// Ids never wrap: once the counter reaches `i32::MAX` every further
    /// allocation fails with [`SchedulerError::IdsExhausted`].
    pub(crate) fn allocate(
        &self,
        spec: TaskSpec,
        next_run_tick: u64,
    ) -> Result<Arc<TaskRecord>, SchedulerError> {
        // Ids are drawn under the map lock so the map never holds a gap
        // that a lower id fills later.
        let mut records = self.records.lock();
        let raw = self
            .next_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |id| id.checked_add(1))
            .map_err(|_| SchedulerError::IdsExhausted)?;

        let record = Arc::new(TaskRecord::new(
            TaskId::from(raw),
            spec.owner,
            spec.kind,
            spec.placement,
            spec.delay,
            spec.body,
            next_run_tick,
        ));
        records.insert(record.id(), Arc::clone(&record));
        Ok(record)
    }

    pub(crate) fn lookup(&self, id: TaskId) -> Option<Arc<TaskRecord>> {
        self.records.lock().get(&id).cloned()
    }

    pub(crate) fn remove(&self, id: TaskId) -> Option<Arc<TaskRecord>> {
        self.records.lock().remove(&id)
    }

    pub(crate) fn owned_by(&self, owner: OwnerId) -> Vec<Arc<TaskRecord>> {
        self.records
            .lock()
            .values()
            .filter(|record| record.owner() == owner)
            .cloned()
            .collect()
    }

    /// Snapshot of every non-terminal record, ascending by id.
    pub(crate) fn pending(&self) -> Vec<Arc<TaskRecord>> {
        self.records
            .lock()
            .values()
            .filter(|record| !record.state().is_terminal())
            .cloned()
            .collect()
    }

    pub(crate) fn all(&self) -> Vec<Arc<TaskRecord>> {
        self.records.lock().values().cloned().collect()
    }

    /// Sync records due at `tick`, moved to `Queued` and returned in ascending id order.
    pub(crate) fn take_due_sync(&self, tick: u64) -> Vec<Arc<TaskRecord>> {
        self.records
            .lock()
            .values()
            .filter(|record| record.placement() == Placement::Sync && record.queue_if_due(tick))
            .cloned()
            .collect()
    }

    /// Evict terminal records with no occurrence still executing. Returns how many were removed.
    pub(crate) fn sweep(&self) -> usize {
        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|_, record| !record.is_evictable());
        before - records.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.records.lock().len()
    }
}
