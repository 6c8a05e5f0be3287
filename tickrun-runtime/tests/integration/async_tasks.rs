//! Worker-thread task tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use tickrun_runtime::{Placement, TaskFailure, TaskState};

use crate::common::{builder, counting_task, scheduler, wait_until, PLUGIN};

const WAIT: Duration = Duration::from_secs(5);

/// Test: Async tasks run without the driver ever advancing.
#[test]
fn test_async_task_runs_off_the_main_thread() {
    let (scheduler, _driver) = scheduler();
    let (sender, receiver) = mpsc::channel();

    let handle = scheduler
        .run_async(PLUGIN, move || {
            let _ = sender.send(thread::current().id());
        })
        .unwrap();
    assert_eq!(handle.placement(), Placement::Async);

    let worker = receiver.recv_timeout(WAIT).unwrap();
    assert_ne!(worker, thread::current().id());
    assert!(wait_until(WAIT, || handle.state() == TaskState::Finished));
    assert!(wait_until(WAIT, || scheduler.task(handle.task_id()).is_none()));
}

/// Test: A delayed async task waits roughly its delay in ticks.
#[test]
fn test_delayed_async_task_waits() {
    let (scheduler, _driver) = builder()
        .tick_length(Duration::from_millis(20))
        .build()
        .unwrap();
    let (count, body) = counting_task();

    let id = scheduler.schedule_async_delayed(PLUGIN, body, 10).unwrap();
    assert!(id.is_valid());

    thread::sleep(Duration::from_millis(50));
    assert_eq!(count.load(Ordering::SeqCst), 0);

    assert!(wait_until(WAIT, || count.load(Ordering::SeqCst) == 1));
}

/// Test: A repeating async task keeps running until cancelled.
#[test]
fn test_repeating_async_task_repeats() {
    let (scheduler, _driver) = scheduler();
    let (count, body) = counting_task();

    let id = scheduler.schedule_async_repeating(PLUGIN, body, 0, 1).unwrap();
    assert!(wait_until(WAIT, || count.load(Ordering::SeqCst) >= 5));

    scheduler.cancel(id);
    assert!(wait_until(WAIT, || !scheduler.is_running(id)));
    let after_cancel = count.load(Ordering::SeqCst);
    thread::sleep(Duration::from_millis(50));
    assert_eq!(count.load(Ordering::SeqCst), after_cancel);
}

/// Test: Occurrences of one repeating async task never overlap, even when
/// the body takes longer than the period.
#[test]
fn test_repeating_async_occurrences_never_overlap() {
    let (scheduler, _driver) = scheduler();
    let in_flight = Arc::new(AtomicUsize::new(0));
    let max_in_flight = Arc::new(AtomicUsize::new(0));
    let runs = Arc::new(AtomicUsize::new(0));

    let body = {
        let in_flight = Arc::clone(&in_flight);
        let max_in_flight = Arc::clone(&max_in_flight);
        let runs = Arc::clone(&runs);
        move || {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            max_in_flight.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(20));
            in_flight.fetch_sub(1, Ordering::SeqCst);
            runs.fetch_add(1, Ordering::SeqCst);
        }
    };

    // Period of one 5ms tick, body of 20ms
    let handle = scheduler.run_timer_async(PLUGIN, body, 0, 1).unwrap();
    assert!(wait_until(WAIT, || runs.load(Ordering::SeqCst) >= 4));
    handle.cancel();

    assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
}

/// Test: Executing async occurrences are listed as active workers.
#[test]
fn test_list_active_workers() {
    let (scheduler, _driver) = scheduler();
    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let release_rx = Mutex::new(release_rx);

    let handle = scheduler
        .run_async(PLUGIN, move || {
            let _ = started_tx.send(());
            let _ = release_rx.lock().recv_timeout(WAIT);
        })
        .unwrap();

    started_rx.recv_timeout(WAIT).unwrap();
    let workers = scheduler.list_active_workers();
    assert_eq!(workers.len(), 1);
    assert_eq!(workers[0].task_id, handle.task_id());
    assert_eq!(workers[0].owner, PLUGIN);
    assert_eq!(workers[0].thread_name.as_deref(), Some("tickrun-test"));
    assert!(scheduler.is_running(handle.task_id()));
    assert_eq!(handle.state(), TaskState::Running);

    release_tx.send(()).unwrap();
    assert!(wait_until(WAIT, || scheduler.list_active_workers().is_empty()));
    assert!(!scheduler.is_running(handle.task_id()));
}

/// Test: A panicking async body is reported and the repeating task continues.
#[test]
fn test_async_panic_is_reported() {
    let failures: Arc<Mutex<Vec<TaskFailure>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&failures);
    let (scheduler, _driver) = builder()
        .on_task_failure(move |failure| sink.lock().push(failure.clone()))
        .build()
        .unwrap();
    let runs = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&runs);
    let handle = scheduler
        .run_timer_async(
            PLUGIN,
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                panic!("database offline");
            },
            0,
            1,
        )
        .unwrap();

    assert!(wait_until(WAIT, || failures.lock().len() >= 2));
    handle.cancel();

    let failure = failures.lock()[0].clone();
    assert_eq!(failure.task_id, handle.task_id());
    assert_eq!(failure.placement, Placement::Async);
    assert_eq!(failure.message, "database offline");
    assert!(runs.load(Ordering::SeqCst) >= 2);
}
