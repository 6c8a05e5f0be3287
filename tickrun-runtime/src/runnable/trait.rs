/// Unit of work executed by the scheduler
///
/// Implement this trait on your struct to make it schedulable, or pass any
/// `Fn() + Send + Sync` closure directly.
///
/// # Example
///
/// ```rust
/// use tickrun_runtime::Runnable;
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// struct AutoSave {
///     saves: AtomicU32,
/// }
///
/// impl Runnable for AutoSave {
///     fn run(&self) {
///         self.saves.fetch_add(1, Ordering::SeqCst);
///     }
/// }
/// ```
///
/// A repeating body is invoked once per occurrence and never concurrently
/// with itself.
pub trait Runnable: Send + Sync {
    /// Execute one occurrence of the task
    fn run(&self);
}

impl<F> Runnable for F
where
    F: Fn() + Send + Sync,
{
    fn run(&self) {
        self()
    }
}
