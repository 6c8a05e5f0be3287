use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;

use super::Runnable;
use crate::error::panic_message;

/// One-shot body produced by the call-and-wait path; it delivers its own
/// result and reports a failure message back to the executor.
pub(crate) type CallableBody = Box<dyn FnOnce() -> Result<(), String> + Send>;

/// What a task executes
pub(crate) enum TaskBody {
    Runnable(Arc<dyn Runnable>),
    Callable(Mutex<Option<CallableBody>>),
}

impl TaskBody {
    pub(crate) fn runnable(task: Arc<dyn Runnable>) -> Self {
        TaskBody::Runnable(task)
    }

    pub(crate) fn callable(call: CallableBody) -> Self {
        TaskBody::Callable(Mutex::new(Some(call)))
    }

    /// Run one occurrence. A panic is caught here and returned as its message.
    pub(crate) fn invoke(&self) -> Result<(), String> {
        match self {
            TaskBody::Runnable(task) => panic::catch_unwind(AssertUnwindSafe(|| task.run()))
                .map_err(|payload| panic_message(&*payload)),
            TaskBody::Callable(slot) => {
                let call = slot.lock().take();
                match call {
                    Some(call) => panic::catch_unwind(AssertUnwindSafe(call))
                        .map_err(|payload| panic_message(&*payload))
                        .and_then(|outcome| outcome),
                    None => Ok(()),
                }
            }
        }
    }

    /// Drop a callable that will never run, releasing whoever waits on it.
    pub(crate) fn discard(&self) {
        if let TaskBody::Callable(slot) = self {
            slot.lock().take();
        }
    }
}

impl fmt::Debug for TaskBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskBody::Runnable(_) => f.write_str("Runnable"),
            TaskBody::Callable(_) => f.write_str("Callable"),
        }
    }
}
