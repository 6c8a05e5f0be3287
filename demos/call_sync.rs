use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use tickrun::{OwnerId, SchedulerBuilder, SchedulerError};

const STATS: OwnerId = OwnerId::new(7);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info".to_string())
        )
        .with_target(false)
        .init();

    println!("🚀 Starting call-sync example...\n");

    let (scheduler, mut driver) = SchedulerBuilder::new()
        .tick_length(Duration::from_millis(20))
        .build()?;

    // Main-thread state, only touched by sync tasks
    let players: Arc<Mutex<HashMap<String, u32>>> = Arc::new(Mutex::new(HashMap::new()));
    players.lock().insert("alex".to_string(), 12);
    players.lock().insert("steve".to_string(), 40);

    let reader = {
        let scheduler = scheduler.clone();
        let players = Arc::clone(&players);
        thread::spawn(move || -> Result<(), SchedulerError> {
            // A background thread asking the main thread for a snapshot
            let total = scheduler.call_sync_and_wait(STATS, move || {
                players.lock().values().sum::<u32>()
            })?;
            println!("[WORKER] Total level across players: {}", total);

            let mut call = scheduler.call_sync_method(STATS, || -> u32 {
                panic!("world not loaded")
            })?;
            match call.wait_timeout(Duration::from_secs(2)) {
                Ok(Some(value)) => println!("[WORKER] Unexpected value {}", value),
                Ok(None) => println!("[WORKER] Timed out"),
                Err(e) => println!("[WORKER] Call failed: {}", e),
            }
            Ok(())
        })
    };

    while !reader.is_finished() {
        driver.advance();
        thread::sleep(scheduler.tick_length());
    }
    match reader.join() {
        Ok(result) => result?,
        Err(_) => println!("⚠️  Reader thread panicked"),
    }

    println!("\n👋 Shutting down...");
    scheduler.shutdown();
    Ok(())
}
