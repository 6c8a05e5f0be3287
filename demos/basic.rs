use chrono::Local;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tickrun::{OwnerId, SchedulerBuilder};
use tracing::{info, warn};

const WORLD: OwnerId = OwnerId::new(1);

fn now() -> String {
    Local::now().format("%H:%M:%S%.3f").to_string()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "debug".to_string())
        )
        .with_target(false)
        .init();

    println!("🚀 Starting basic example...\n");

    let (scheduler, mut driver) = SchedulerBuilder::new()
        .tick_length(Duration::from_millis(50))
        .build()?;

    // Runs on this thread, inside driver.advance()
    let autosaves = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&autosaves);
    scheduler.run_timer(
        WORLD,
        move || {
            let count = counter.fetch_add(1, Ordering::SeqCst) + 1;
            println!("[{}] [SYNC] Autosave #{} (every 20 ticks)", now(), count);
        },
        0,
        20,
    )?;

    scheduler.run_later(
        WORLD,
        || println!("[{}] [SYNC] Welcome message, 10 ticks in", now()),
        10,
    )?;

    // Runs on a worker thread
    scheduler.run_timer_async(
        WORLD,
        || {
            let thread = std::thread::current();
            println!(
                "[{}] [ASYNC] Stats flush on {} (every 30 ticks)",
                now(),
                thread.name().unwrap_or("unnamed")
            );
        },
        5,
        30,
    )?;

    info!(pending = scheduler.list_pending_tasks().len(), "Tasks scheduled");

    // The host loop: 100 ticks of 50ms each
    for _ in 0..100 {
        let summary = driver.advance();
        if summary.failed > 0 {
            warn!(tick = summary.tick, failed = summary.failed, "Tasks failed this tick");
        }
        std::thread::sleep(scheduler.tick_length());
    }

    println!("\n👋 Shutting down after {} autosaves...", autosaves.load(Ordering::SeqCst));
    scheduler.shutdown();
    Ok(())
}
