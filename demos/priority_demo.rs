use cadence::{
    CancelSource, CancellationToken, InputWatcher, Priority, SchedulerBuilder, SchedulerConfig,
    SchedulerError, Task, TaskError, Timeout,
};
use chrono::Local;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Task that prints a timestamped line and then simulates `work`.
fn demo_task(name: &'static str, priority: Priority, interval: Duration, work: Duration) -> Task {
    Task::from_fn(name, priority, interval, move || async move {
        println!("[{}] Running {}", Local::now().format("%H:%M:%S%.3f"), name);
        tokio::time::sleep(work).await;
        Ok::<(), TaskError>(())
    })
}

async fn run_demo() -> Result<(), SchedulerError> {
    println!("Task Scheduler Demo");

    let scheduler = SchedulerBuilder::new()
        .settings(SchedulerConfig::default().with_idle_backoff(Duration::from_millis(10)))
        .task(demo_task(
            "high priority task",
            Priority::High,
            Duration::from_secs(2),
            Duration::from_millis(500),
        ))
        .task(demo_task(
            "low priority task",
            Priority::Low,
            Duration::from_secs(4),
            Duration::from_millis(200),
        ))
        .task(demo_task(
            "normal priority task",
            Priority::Normal,
            Duration::from_secs(3),
            Duration::from_millis(300),
        ))
        .build()?;

    println!("Press Enter to stop the scheduler (it stops by itself after 20 seconds)...");

    let outcome = scheduler
        .start(CancellationToken::new())
        .run_until(InputWatcher::stdin().or(Timeout(Duration::from_secs(20))))
        .await;

    match outcome.into_result() {
        Ok(Some(scheduler)) => {
            println!("Scheduler stopped by cancellation.");
            for task in scheduler.list_tasks() {
                println!("  {:<22} priority={:<8} ran={}", task.name(), task.priority(), task.last_run().is_some());
            }
        }
        Ok(None) => println!("Scheduler stopped by cancellation."),
        Err(e) => return Err(e),
    }

    println!("Scheduler demo finished!");
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(run_demo());

    // stdin is read on a blocking thread that may still be waiting for a line.
    runtime.shutdown_timeout(Duration::from_millis(100));

    result.map_err(Into::into)
}
