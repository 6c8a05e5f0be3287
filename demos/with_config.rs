use std::time::Duration;

use tickrun::{OwnerId, SchedulerBuilder};
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "debug".to_string())
        )
        .with_target(false)
        .init();

    println!("🚀 Starting with-config example...\n");
    println!("📝 Configuration:");
    println!("   - scheduler.tick_length: wall-clock length of one tick");
    println!("   - scheduler.max_workers: async bodies running at once");
    println!("   - override with TICKRUN_SCHEDULER__TICK_LENGTH=20ms\n");

    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../demos/config/scheduler.toml");
    let (scheduler, mut driver) = SchedulerBuilder::with_toml(path)?.build()?;
    println!("⏱️  Tick length: {:?}\n", scheduler.tick_length());

    let owner = OwnerId::new(1);
    for i in 0..4u64 {
        scheduler.run_later_async(
            owner,
            move || {
                println!("[ASYNC] Job {} started", i);
                std::thread::sleep(Duration::from_millis(200));
                println!("[ASYNC] Job {} done", i);
            },
            i,
        )?;
    }

    for _ in 0..40 {
        driver.advance();
        for worker in scheduler.list_active_workers() {
            info!(
                task_id = %worker.task_id,
                thread = worker.thread_name.as_deref().unwrap_or("unnamed"),
                "Async job running"
            );
        }
        std::thread::sleep(scheduler.tick_length());
    }

    println!("\n👋 Shutting down...");
    scheduler.shutdown();
    Ok(())
}
