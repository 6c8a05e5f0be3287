//! Tickrun Runtime - tick-synchronized task scheduling
//!
//! This crate provides the scheduler behind `tickrun`: sync tasks run on the
//! host's main thread inside [`TickDriver::advance`], async tasks run on a
//! worker pool, and both are managed through the shared [`Scheduler`].

mod config;
mod driver;
mod error;
mod owner;
mod registry;
mod runnable;
mod scheduler;
mod shared;
mod task;
mod time_unit;
mod worker;

// Re-export public API
pub use config::{load_toml_config, load_yaml_config, SchedulerConfig};
pub use driver::{TickDriver, TickSummary};
pub use error::{SchedulerError, TaskFailure};
pub use owner::{AlwaysEnabled, OwnerId, OwnerLiveness};
pub use runnable::Runnable;
pub use scheduler::{Scheduler, SchedulerBuilder, SyncCall, TaskHandle};
pub use shared::FailureHook;
pub use task::{Placement, TaskId, TaskKind, TaskState};
pub use time_unit::TimeUnit;
pub use worker::ActiveWorker;
