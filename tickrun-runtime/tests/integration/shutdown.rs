//! Shutdown and argument validation tests.

use std::sync::atomic::Ordering;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tickrun_runtime::{OwnerId, SchedulerError, TaskId};

use crate::common::{advance_n, builder, counting_task, scheduler, PLUGIN};

/// Test: After shutdown the id family reports -1 and the handle family an error.
#[test]
fn test_submissions_after_shutdown() {
    let (scheduler, mut driver) = scheduler();
    scheduler.shutdown();
    assert!(scheduler.is_shutting_down());

    let id = scheduler.schedule_sync_delayed(PLUGIN, || {}, 1).unwrap();
    assert_eq!(id, TaskId::INVALID);
    assert_eq!(id.get(), -1);
    let id = scheduler.schedule_async_repeating(PLUGIN, || {}, 0, 1).unwrap();
    assert_eq!(id, TaskId::INVALID);

    assert!(matches!(
        scheduler.run_sync(PLUGIN, || {}),
        Err(SchedulerError::ShuttingDown)
    ));
    assert!(matches!(
        scheduler.call_sync_method(PLUGIN, || 1),
        Err(SchedulerError::ShuttingDown)
    ));

    // The driver keeps working, with nothing to run
    let summary = driver.advance();
    assert_eq!(summary.executed, 0);
}

/// Test: Shutdown cancels pending work of every kind.
#[test]
fn test_shutdown_cancels_everything() {
    let (scheduler, mut driver) = scheduler();
    let (sync_count, sync_body) = counting_task();
    let (async_count, async_body) = counting_task();

    let sync = scheduler.run_timer(PLUGIN, sync_body, 2, 1).unwrap();
    let delayed = scheduler.run_later_async(PLUGIN, async_body, 20).unwrap();

    scheduler.shutdown();
    assert!(sync.is_cancelled());
    assert!(delayed.is_cancelled());
    assert!(scheduler.list_pending_tasks().is_empty());

    advance_n(&mut driver, 5);
    thread::sleep(Duration::from_millis(150));
    assert_eq!(sync_count.load(Ordering::SeqCst), 0);
    assert_eq!(async_count.load(Ordering::SeqCst), 0);

    // Idempotent
    scheduler.shutdown();
}

/// Test: Shutdown waits for an executing async body.
#[test]
fn test_shutdown_waits_for_running_body() {
    let (scheduler, _driver) = builder()
        .shutdown_timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let (started_tx, started_rx) = mpsc::channel();
    let (done_tx, done_rx) = mpsc::channel();

    scheduler
        .run_async(PLUGIN, move || {
            let _ = started_tx.send(());
            thread::sleep(Duration::from_millis(100));
            let _ = done_tx.send(());
        })
        .unwrap();

    started_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    scheduler.shutdown();
    assert!(done_rx.try_recv().is_ok());
}

/// Test: Non-positive periods are rejected by both families.
#[test]
fn test_zero_period_is_invalid() {
    let (scheduler, _driver) = scheduler();

    assert!(matches!(
        scheduler.schedule_sync_repeating(PLUGIN, || {}, 0, 0),
        Err(SchedulerError::InvalidArgument(_))
    ));
    assert!(matches!(
        scheduler.run_timer_async(PLUGIN, || {}, 5, 0),
        Err(SchedulerError::InvalidArgument(_))
    ));
    assert!(scheduler.list_pending_tasks().is_empty());
}

/// Test: The reserved owner id is rejected.
#[test]
fn test_reserved_owner_is_invalid() {
    let (scheduler, _driver) = scheduler();
    let nobody = OwnerId::new(0);

    assert!(matches!(
        scheduler.schedule_sync_delayed(nobody, || {}, 1),
        Err(SchedulerError::InvalidArgument(_))
    ));
    assert!(matches!(
        scheduler.call_sync_method(nobody, || ()),
        Err(SchedulerError::InvalidArgument(_))
    ));
}

/// Test: Invalid builder settings are rejected before any thread starts.
#[test]
fn test_invalid_settings_are_rejected() {
    assert!(matches!(
        builder().tick_length(Duration::ZERO).build(),
        Err(SchedulerError::InvalidArgument(_))
    ));
    assert!(matches!(
        builder().max_workers(0).build(),
        Err(SchedulerError::InvalidArgument(_))
    ));
}

/// Test: Submissions racing with shutdown either fail or are cancelled by it.
#[test]
fn test_submissions_racing_shutdown_never_run() {
    let (scheduler, mut driver) = scheduler();
    let (count, body) = counting_task();
    let body = std::sync::Arc::new(body);

    let submitters: Vec<_> = (0..4)
        .map(|_| {
            let scheduler = scheduler.clone();
            let body = std::sync::Arc::clone(&body);
            thread::spawn(move || loop {
                let body = std::sync::Arc::clone(&body);
                match scheduler.run_sync(PLUGIN, move || body()) {
                    Ok(_) => {}
                    Err(SchedulerError::ShuttingDown) => break,
                    Err(e) => panic!("unexpected error: {}", e),
                }
            })
        })
        .collect();

    thread::sleep(Duration::from_millis(20));
    scheduler.shutdown();
    for submitter in submitters {
        submitter.join().unwrap();
    }

    assert!(scheduler.list_pending_tasks().is_empty());
    let summary = driver.advance();
    assert_eq!(summary.executed, 0);
    assert_eq!(count.load(Ordering::SeqCst), 0);
}
