//! # Tickrun - Tick-Synchronized Task Scheduling for Plugin Hosts
//!
//! This library lets plugins of a tick-driven host (a game server, a
//! simulation loop) schedule work either on the host's main thread or on
//! background worker threads.
//!
//! ## Features
//!
//! - **Sync tasks**: Run on the main thread inside [`TickDriver::advance`], in ascending id order
//! - **Async tasks**: Run on a bounded worker pool, timed with the configured tick length
//! - **Delays and periods**: One-shot or repeating, measured in ticks
//! - **Owner-scoped cancellation**: Cancel every task of a plugin when it is disabled
//! - **Cross-thread calls**: Run a closure on the main thread and wait for its value
//! - **Config support**: Tick length and pool sizes from TOML, YAML or `TICKRUN_*` env vars
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tickrun::{OwnerId, SchedulerBuilder};
//!
//! fn main() -> Result<(), tickrun::SchedulerError> {
//!     let (scheduler, mut driver) = SchedulerBuilder::new().build()?;
//!     let plugin = OwnerId::new(1);
//!
//!     // Every 20 ticks on the main thread
//!     scheduler.run_timer(plugin, || println!("autosave"), 0, 20)?;
//!
//!     // Once, off the main thread, 5 ticks from now
//!     scheduler.run_later_async(plugin, || println!("fetching stats"), 5)?;
//!
//!     for _ in 0..100 {
//!         driver.advance();
//!         std::thread::sleep(scheduler.tick_length());
//!     }
//!
//!     scheduler.cancel_tasks(plugin);
//!     scheduler.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! Create `config/scheduler.toml`:
//!
//! ```toml
//! [scheduler]
//! tick_length = "50ms"
//! worker_threads = 2
//! max_workers = 16
//! thread_name = "tickrun-worker"
//! shutdown_timeout = "5s"
//! ```
//!
//! Or `config/scheduler.yaml`:
//!
//! ```yaml
//! scheduler:
//!   tick_length: 50ms
//!   max_workers: 16
//! ```
//!
//! You can also use environment variables with `TICKRUN_` prefix:
//!
//! ```bash
//! export TICKRUN_SCHEDULER__TICK_LENGTH=20ms
//! export TICKRUN_SCHEDULER__MAX_WORKERS=8
//! ```

// Re-export core types
pub use tickrun_runtime::{
    load_toml_config, load_yaml_config, ActiveWorker, AlwaysEnabled, FailureHook, OwnerId,
    OwnerLiveness, Placement, Runnable, Scheduler, SchedulerBuilder, SchedulerConfig,
    SchedulerError, SyncCall, TaskFailure, TaskHandle, TaskId, TaskKind, TaskState,
    TickDriver, TickSummary, TimeUnit,
};

// Make tickrun_runtime available to hosts that name it directly
pub use tickrun_runtime;
