use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::scheduler::Scheduler;
use crate::config::{load_toml_config, load_yaml_config, SchedulerConfig};
use crate::driver::TickDriver;
use crate::error::{SchedulerError, TaskFailure};
use crate::owner::{AlwaysEnabled, OwnerLiveness};
use crate::shared::{FailureHook, SchedulerShared};
use crate::worker::WorkerPool;

/// Builder for the scheduler
pub struct SchedulerBuilder {
    pub(crate) config: SchedulerConfig,
    pub(crate) liveness: Arc<dyn OwnerLiveness>,
    pub(crate) failure_hook: Option<FailureHook>,
}

impl Default for SchedulerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerBuilder {
    /// Create a new scheduler builder with default settings
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    /// Create with settings from a TOML file
    pub fn with_toml<P: AsRef<Path>>(path: P) -> Result<Self, SchedulerError> {
        Ok(Self::with_config(load_toml_config(path)?))
    }

    /// Create with settings from a YAML file
    pub fn with_yaml<P: AsRef<Path>>(path: P) -> Result<Self, SchedulerError> {
        Ok(Self::with_config(load_yaml_config(path)?))
    }

    /// Create with custom settings
    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            config,
            liveness: Arc::new(AlwaysEnabled),
            failure_hook: None,
        }
    }

    /// Wall-clock length of one tick, used to time async tasks
    pub fn tick_length(mut self, tick_length: Duration) -> Self {
        self.config.tick_length = tick_length;
        self
    }

    pub fn worker_threads(mut self, threads: usize) -> Self {
        self.config.worker_threads = threads;
        self
    }

    /// Maximum number of async bodies executing at the same time
    pub fn max_workers(mut self, workers: usize) -> Self {
        self.config.max_workers = workers;
        self
    }

    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.config.thread_name = name.into();
        self
    }

    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config.shutdown_timeout = timeout;
        self
    }

    /// Host query deciding whether a task's owner is still enabled
    pub fn liveness<L>(mut self, liveness: L) -> Self
    where
        L: OwnerLiveness + 'static,
    {
        self.liveness = Arc::new(liveness);
        self
    }

    /// Callback invoked for every task body that panics, in addition to the error log
    pub fn on_task_failure<F>(mut self, hook: F) -> Self
    where
        F: Fn(&TaskFailure) + Send + Sync + 'static,
    {
        self.failure_hook = Some(Arc::new(hook));
        self
    }

    /// Start the worker pool and return the shared scheduler together with
    /// the tick driver the host's main loop must own.
    pub fn build(self) -> Result<(Scheduler, TickDriver), SchedulerError> {
        self.config.validate()?;

        let workers = WorkerPool::new(&self.config)?;
        let shared = Arc::new(SchedulerShared::new(self.liveness, self.failure_hook));

        info!(
            tick_length_ms = self.config.tick_length.as_millis() as u64,
            worker_threads = self.config.worker_threads,
            max_workers = self.config.max_workers,
            "Scheduler started"
        );

        let scheduler = Scheduler {
            shared: Arc::clone(&shared),
            workers: Arc::new(workers),
            shutdown_timeout: self.config.shutdown_timeout,
        };
        Ok((scheduler, TickDriver::new(shared)))
    }
}

impl fmt::Debug for SchedulerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerBuilder")
            .field("config", &self.config)
            .field("failure_hook", &self.failure_hook.is_some())
            .finish()
    }
}
