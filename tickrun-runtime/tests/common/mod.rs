//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::thread;
use std::time::{Duration, Instant};

use tickrun_runtime::{OwnerId, Scheduler, SchedulerBuilder, TickDriver};

pub const PLUGIN: OwnerId = OwnerId::new(1);
pub const OTHER_PLUGIN: OwnerId = OwnerId::new(2);

/// Tick length used by every test scheduler.
pub const TICK: Duration = Duration::from_millis(5);

static TRACING: Once = Once::new();

/// Route scheduler logs to the test output; set `RUST_LOG` to see them.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Builder preconfigured with a short tick.
pub fn builder() -> SchedulerBuilder {
    init_tracing();
    SchedulerBuilder::new()
        .tick_length(TICK)
        .worker_threads(1)
        .max_workers(4)
        .thread_name("tickrun-test")
        .shutdown_timeout(Duration::from_secs(2))
}

pub fn scheduler() -> (Scheduler, TickDriver) {
    builder().build().expect("scheduler should start")
}

/// A body that counts its invocations.
pub fn counting_task() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    (count, move || {
        counter.fetch_add(1, Ordering::SeqCst);
    })
}

/// Poll `condition` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

/// Advance `driver` the given number of times.
pub fn advance_n(driver: &mut TickDriver, ticks: usize) {
    for _ in 0..ticks {
        driver.advance();
    }
}

/// Keep ticking, like a host loop, until `condition` holds or `timeout` elapses.
pub fn tick_until(
    driver: &mut TickDriver,
    timeout: Duration,
    mut condition: impl FnMut() -> bool,
) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        driver.advance();
        if condition() {
            return true;
        }
        thread::sleep(TICK);
    }
    condition()
}
