use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tickrun::{OwnerId, SchedulerBuilder};

const ECONOMY: OwnerId = OwnerId::new(1);
const MINIGAMES: OwnerId = OwnerId::new(2);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info".to_string())
        )
        .with_target(false)
        .init();

    println!("🚀 Starting plugin-teardown example...\n");

    let enabled: Arc<RwLock<HashSet<OwnerId>>> =
        Arc::new(RwLock::new([ECONOMY, MINIGAMES].into_iter().collect()));
    let liveness = {
        let enabled = Arc::clone(&enabled);
        move |owner: OwnerId| enabled.read().contains(&owner)
    };

    let (scheduler, mut driver) = SchedulerBuilder::new()
        .tick_length(Duration::from_millis(20))
        .liveness(liveness)
        .on_task_failure(|failure| println!("🔥 {}", failure))
        .build()?;

    scheduler.run_timer(ECONOMY, || println!("[ECONOMY] Paying interest"), 0, 10)?;
    scheduler.run_timer(MINIGAMES, || println!("[MINIGAMES] Rotating arena"), 0, 10)?;
    scheduler.run_timer_async(MINIGAMES, || println!("[MINIGAMES] Uploading scores"), 0, 15)?;
    scheduler.run_later(MINIGAMES, || { panic!("arena map missing"); }, 5)?;

    for tick in 1..=60 {
        if tick == 25 {
            // Orderly teardown: the plugin host cancels before disabling
            println!("\n🔌 Disabling economy\n");
            let cancelled = scheduler.cancel_tasks(ECONOMY);
            enabled.write().remove(&ECONOMY);
            println!("   cancelled {} task(s)", cancelled);
        }
        if tick == 40 {
            // Disabled without cancelling; the scheduler drops its tasks when they come due
            println!("\n🔌 Disabling minigames without cancelling\n");
            enabled.write().remove(&MINIGAMES);
        }
        driver.advance();
        std::thread::sleep(scheduler.tick_length());
    }

    println!("\n📋 Pending tasks left: {}", scheduler.list_pending_tasks().len());
    scheduler.shutdown();
    Ok(())
}
