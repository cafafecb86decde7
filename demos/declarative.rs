use cadence::{periodic, CancelSource, CancellationToken, CtrlC, SchedulerBuilder, Timeout};
use chrono::Local;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

const CONFIG_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../demos/config/cadence.toml");

static SAMPLES: AtomicU32 = AtomicU32::new(0);

/// Interval and priority come from `[jobs.metrics]`
#[periodic(priority = "${jobs.metrics.priority:normal}", interval = "${jobs.metrics.interval}")]
async fn metrics() {
    let count = SAMPLES.fetch_add(1, Ordering::SeqCst) + 1;
    println!("[{}] metrics sample #{}", Local::now().format("%H:%M:%S%.3f"), count);
}

/// Runs every 4 seconds unless `jobs.digest.enabled` is false
#[periodic(priority = "low", interval = "${jobs.digest.interval:4s}", enabled = "${jobs.digest.enabled:true}")]
async fn digest() -> std::io::Result<()> {
    println!("[{}] sending digest", Local::now().format("%H:%M:%S%.3f"));
    tokio::time::sleep(Duration::from_millis(200)).await;
    Ok(())
}

/// Plain number interval read in seconds
#[periodic(name = "watchdog", priority = "critical", interval = 10, time_unit = "seconds")]
async fn check_watchdog() {
    println!("[{}] watchdog ok", Local::now().format("%H:%M:%S%.3f"));
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let scheduler = SchedulerBuilder::with_toml(CONFIG_PATH)?
        .register_all()
        .build()?;

    println!("Declared tasks:");
    for task in scheduler.list_tasks() {
        println!("  {} ({}, every {:?})", task.name(), task.priority(), task.interval());
    }

    let outcome = scheduler
        .start(CancellationToken::new())
        .run_until(CtrlC.or(Timeout(Duration::from_secs(12))))
        .await;

    match outcome.into_result() {
        Ok(_) => println!("Scheduler stopped after {} metrics samples.", SAMPLES.load(Ordering::SeqCst)),
        Err(e) => eprintln!("Scheduler failed: {e}"),
    }
    Ok(())
}
