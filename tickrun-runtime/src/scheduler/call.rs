use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use tokio::sync::oneshot;

use super::handle::TaskHandle;
use crate::error::{panic_message, SchedulerError};
use crate::runnable::CallableBody;
use crate::task::{TaskId, TaskState};

type Outcome<T> = Result<T, String>;

/// Wrap a value-producing closure into a one-shot body that delivers its
/// outcome through a single-use channel.
pub(crate) fn wrap_callable<T, F>(call: F) -> (CallableBody, oneshot::Receiver<Outcome<T>>)
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (sender, receiver) = oneshot::channel();
    let body: CallableBody = Box::new(move || {
        let outcome = panic::catch_unwind(AssertUnwindSafe(call))
            .map_err(|payload| panic_message(&*payload));
        let failure = outcome.as_ref().err().cloned();
        // the caller may have stopped waiting
        let _ = sender.send(outcome);
        match failure {
            Some(message) => Err(message),
            None => Ok(()),
        }
    });
    (body, receiver)
}

/// Result of a closure scheduled onto the main thread with
/// [`Scheduler::call_sync_method`](crate::Scheduler::call_sync_method).
///
/// The blocking methods must NOT be called from the main thread: the main
/// thread is the only one that can run the closure, so waiting there never
/// returns. They also must not be called from inside an async context.
pub struct SyncCall<T> {
    handle: TaskHandle,
    receiver: Option<oneshot::Receiver<Outcome<T>>>,
}

impl<T> SyncCall<T> {
    pub(crate) fn new(handle: TaskHandle, receiver: oneshot::Receiver<Outcome<T>>) -> Self {
        Self {
            handle,
            receiver: Some(receiver),
        }
    }

    pub fn task_id(&self) -> TaskId {
        self.handle.task_id()
    }

    /// Whether the closure has run or was cancelled
    pub fn is_done(&self) -> bool {
        self.handle.state().is_terminal()
    }

    pub fn is_cancelled(&self) -> bool {
        self.handle.state() == TaskState::Cancelled
    }

    /// Cancel the call if the closure has not started yet.
    /// Waiters then receive [`SchedulerError::TaskCancelled`].
    pub fn cancel(&self) -> bool {
        self.handle.cancel()
    }

    /// Block the calling thread until the closure has run on the main thread.
    ///
    /// Returns the closure's value, [`SchedulerError::TaskPanicked`] if it
    /// panicked, or [`SchedulerError::TaskCancelled`] if it will never run.
    pub fn wait(mut self) -> Result<T, SchedulerError> {
        let receiver = self.receiver.take().ok_or_else(already_taken)?;
        let outcome = receiver.blocking_recv();
        self.resolve(outcome)
    }

    /// Like [`wait`](Self::wait), giving up after `timeout`.
    ///
    /// `Ok(None)` means the timeout elapsed; the call stays scheduled and can
    /// be waited on again.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Result<Option<T>, SchedulerError> {
        let receiver = self.receiver.as_mut().ok_or_else(already_taken)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;

        match runtime.block_on(tokio::time::timeout(timeout, receiver)) {
            Ok(outcome) => {
                self.receiver = None;
                self.resolve(outcome).map(Some)
            }
            Err(_elapsed) => Ok(None),
        }
    }

    fn resolve(
        &self,
        outcome: Result<Outcome<T>, oneshot::error::RecvError>,
    ) -> Result<T, SchedulerError> {
        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(message)) => Err(SchedulerError::TaskPanicked {
                task_id: self.task_id(),
                message,
            }),
            Err(_) => Err(SchedulerError::TaskCancelled(self.task_id())),
        }
    }
}

fn already_taken() -> SchedulerError {
    SchedulerError::InvalidArgument("the result of this call was already taken".to_string())
}

impl<T> fmt::Debug for SyncCall<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncCall")
            .field("task_id", &self.task_id())
            .field("state", &self.handle.state())
            .field("waiting", &self.receiver.is_some())
            .finish()
    }
}
