mod builder;
mod call;
mod handle;
mod scheduler;

pub use builder::SchedulerBuilder;
pub use call::SyncCall;
pub use handle::TaskHandle;
pub use scheduler::Scheduler;
