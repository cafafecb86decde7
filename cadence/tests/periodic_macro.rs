//! `#[periodic]` registration tests.

use cadence::{periodic, Priority, SchedulerBuilder, SchedulerError, TaskError, TimeUnit, Timeout};
use std::io::Write;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

static BEAT_COUNT: AtomicU32 = AtomicU32::new(0);

#[periodic(priority = "high", interval = "2s")]
async fn heartbeat() {
    BEAT_COUNT.fetch_add(1, Ordering::SeqCst);
}

#[periodic(name = "report", priority = Priority::Low, interval = "${jobs.report.interval:5}", time_unit = TimeUnit::Seconds)]
async fn nightly_report() -> Result<(), TaskError> {
    Ok(())
}

#[periodic(interval = 750, enabled = "${jobs.purge.enabled:false}")]
async fn purge() -> std::io::Result<()> {
    Ok(())
}

#[allow(clippy::unused_unit)]
#[periodic(name = "sweep", priority = "low", interval = "${jobs.sweep.interval:30s}")]
async fn sweep_cache() -> () {}

fn config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("create temp config");
    file.write_all(contents.as_bytes()).expect("write temp config");
    file
}

#[test]
fn register_all_collects_enabled_declarations() {
    let scheduler = SchedulerBuilder::new().register_all().build().unwrap();

    assert_eq!(scheduler.len(), 3);
    let heartbeat = scheduler.task("heartbeat").unwrap();
    assert_eq!(heartbeat.priority(), Priority::High);
    assert_eq!(heartbeat.interval(), Duration::from_secs(2));

    let report = scheduler.task("report").unwrap();
    assert_eq!(report.priority(), Priority::Low);
    assert_eq!(report.interval(), Duration::from_secs(5));

    assert!(scheduler.task("purge").is_err());

    let sweep = scheduler.task("sweep").unwrap();
    assert_eq!(sweep.priority(), Priority::Low);
    assert_eq!(sweep.interval(), Duration::from_secs(30));
}

#[test]
fn placeholders_read_from_config() {
    let file = config_file(
        "[jobs.report]\ninterval = \"90s\"\n\n[jobs.purge]\nenabled = true\n",
    );
    let scheduler = SchedulerBuilder::with_toml(file.path())
        .unwrap()
        .register_all()
        .build()
        .unwrap();

    assert_eq!(scheduler.len(), 4);
    assert_eq!(scheduler.task("report").unwrap().interval(), Duration::from_secs(90));

    let purge = scheduler.task("purge").unwrap();
    assert_eq!(purge.priority(), Priority::Normal);
    assert_eq!(purge.interval(), Duration::from_millis(750));
}

#[test]
fn declared_names_clash_with_explicit_tasks() {
    let err = SchedulerBuilder::new()
        .task(cadence::Task::from_fn("heartbeat", Priority::Low, Duration::from_secs(1), || async {
            Ok(())
        }))
        .register_all()
        .build()
        .unwrap_err();
    assert!(matches!(err, SchedulerError::DuplicateTask { ref name } if name == "heartbeat"));
}

#[tokio::test(start_paused = true)]
async fn declared_tasks_run_under_the_scheduler() {
    let file = config_file("[scheduler]\nidle_backoff = \"10ms\"\n");
    let scheduler = SchedulerBuilder::with_toml(file.path())
        .unwrap()
        .register_all()
        .build()
        .unwrap();

    let before = BEAT_COUNT.load(Ordering::SeqCst);
    let outcome = scheduler
        .start(cadence::CancellationToken::new())
        .run_until(Timeout(Duration::from_secs(5)))
        .await;

    assert!(outcome.is_cancelled(), "unexpected outcome: {:?}", outcome.reason);
    assert!(BEAT_COUNT.load(Ordering::SeqCst) - before >= 2);
}
