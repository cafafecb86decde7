use cadence::cadence_runtime::{load_toml_config, resolve_config_value};
use cadence::{
    CancelSource, CancellationToken, CtrlC, Priority, Runnable, SchedulerBuilder, TaskError,
    TaskFuture, TimeUnit, Timeout,
};
use chrono::Local;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const CONFIG_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../demos/config/cadence.toml");

/// Collects a metrics sample; every third sample fails to show the
/// `isolate` failure policy from the config file.
struct MetricsSampler {
    samples: AtomicU32,
}

impl Runnable for MetricsSampler {
    fn run(&self) -> TaskFuture<'_> {
        Box::pin(async move {
            let sample = self.samples.fetch_add(1, Ordering::SeqCst) + 1;
            let now = Local::now().format("%H:%M:%S%.3f");
            if sample % 3 == 0 {
                return Err(TaskError::msg(format!("sample #{sample} timed out")));
            }
            println!("[{now}] metrics sample #{sample}");
            Ok(())
        })
    }
}

struct DigestMailer;

impl Runnable for DigestMailer {
    fn run(&self) -> TaskFuture<'_> {
        Box::pin(async {
            println!("[{}] sending digest", Local::now().format("%H:%M:%S%.3f"));
            tokio::time::sleep(Duration::from_millis(250)).await;
            Ok(())
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_toml_config(CONFIG_PATH)?;
    let builder = SchedulerBuilder::with_config(config.clone());

    let metrics_interval = resolve_config_value("${jobs.metrics.interval:1s}", &config)?;
    let metrics_priority: Priority = resolve_config_value("${jobs.metrics.priority:normal}", &config)?.parse()?;
    let digest_interval = resolve_config_value("${jobs.digest.interval:5s}", &config)?;

    let mut builder = builder.runnable(
        "metrics",
        metrics_priority,
        TimeUnit::parse_interval(&metrics_interval, TimeUnit::Milliseconds)?,
        MetricsSampler {
            samples: AtomicU32::new(0),
        },
    );
    if resolve_config_value("${jobs.digest.enabled:true}", &config)? == "true" {
        builder = builder.runnable(
            "digest",
            Priority::Low,
            TimeUnit::parse_interval(&digest_interval, TimeUnit::Milliseconds)?,
            DigestMailer,
        );
    }

    let scheduler = builder.build()?;
    println!("Running {} tasks for 15 seconds (Ctrl+C to stop early)...", scheduler.len());

    let outcome = scheduler
        .start(CancellationToken::new())
        .run_until(CtrlC.or(Timeout(Duration::from_secs(15))))
        .await;

    if outcome.is_cancelled() {
        println!("Scheduler stopped by cancellation.");
        Ok(())
    } else {
        Err(outcome.reason.into())
    }
}
