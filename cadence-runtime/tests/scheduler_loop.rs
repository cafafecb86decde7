//! Run loop integration tests.
//!
//! All timing runs on tokio's paused clock, so the sleeps below complete
//! instantly and deterministically.

use cadence_runtime::{
    CancelSource, CancellationToken, FailurePolicy, InputWatcher, Manual, Priority, Scheduler,
    SchedulerConfig, SchedulerError, Task, TaskError, Timeout, TriggerFuture,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncWriteExt, BufReader};

type RunLog = Arc<Mutex<Vec<&'static str>>>;

fn settings() -> SchedulerConfig {
    SchedulerConfig::default().with_idle_backoff(Duration::from_millis(10))
}

/// Task that records its name and then simulates `work` of busy time.
fn logged(log: &RunLog, name: &'static str, priority: Priority, interval: Duration, work: Duration) -> Task {
    let log = log.clone();
    Task::from_fn(name, priority, interval, move || {
        log.lock().unwrap().push(name);
        async move {
            tokio::time::sleep(work).await;
            Ok(())
        }
    })
}

fn runs_of(log: &RunLog, name: &str) -> usize {
    log.lock().unwrap().iter().filter(|entry| **entry == name).count()
}

#[tokio::test(start_paused = true)]
async fn priorities_run_in_order_until_cancelled() {
    let log = RunLog::default();
    let mut scheduler = Scheduler::with_settings(settings());
    scheduler
        .add_task(logged(&log, "C", Priority::Low, Duration::from_secs(4), Duration::from_millis(200)))
        .unwrap();
    scheduler
        .add_task(logged(&log, "A", Priority::High, Duration::from_secs(2), Duration::from_millis(500)))
        .unwrap();
    scheduler
        .add_task(logged(&log, "B", Priority::Normal, Duration::from_secs(3), Duration::from_millis(300)))
        .unwrap();

    let outcome = scheduler
        .start(CancellationToken::new())
        .run_until(Timeout(Duration::from_secs(10)))
        .await;

    assert!(outcome.is_cancelled(), "unexpected outcome: {:?}", outcome.reason);

    let log = log.lock().unwrap().clone();
    assert_eq!(&log[..3], ["A", "B", "C"]);
    for name in ["A", "B", "C"] {
        let runs = log.iter().filter(|entry| **entry == name).count();
        assert!(runs >= 2, "{name} ran {runs} times");
    }

    let scheduler = outcome.scheduler.expect("scheduler returned");
    let order: Vec<_> = scheduler.list_tasks().iter().map(Task::name).collect();
    assert_eq!(order, ["A", "B", "C"]);
}

#[tokio::test(start_paused = true)]
async fn equal_priorities_keep_insertion_order() {
    let log = RunLog::default();
    let mut scheduler = Scheduler::with_settings(settings());
    for name in ["first", "second", "third"] {
        scheduler
            .add_task(logged(&log, name, Priority::Normal, Duration::from_secs(60), Duration::ZERO))
            .unwrap();
    }
    scheduler
        .add_task(logged(&log, "urgent", Priority::Critical, Duration::from_secs(60), Duration::ZERO))
        .unwrap();

    let outcome = scheduler
        .start(CancellationToken::new())
        .run_until(Timeout(Duration::from_secs(1)))
        .await;

    assert!(outcome.is_cancelled());
    assert_eq!(*log.lock().unwrap(), ["urgent", "first", "second", "third"]);
}

#[tokio::test(start_paused = true)]
async fn no_step_starts_after_cancellation_is_observed() {
    let cancel = CancellationToken::new();
    let later = Arc::new(AtomicU32::new(0));

    let mut scheduler = Scheduler::with_settings(settings());
    let token = cancel.clone();
    scheduler
        .add_task(Task::from_fn("stopper", Priority::High, Duration::from_secs(1), move || {
            token.cancel();
            async { Ok(()) }
        }))
        .unwrap();
    let counter = later.clone();
    scheduler
        .add_task(Task::from_fn("later", Priority::Low, Duration::from_secs(1), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        }))
        .unwrap();

    let err = scheduler.run(&cancel).await.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(later.load(Ordering::SeqCst), 0);
    assert!(scheduler.task("stopper").unwrap().last_run().is_some());
    assert!(scheduler.task("later").unwrap().last_run().is_none());
}

#[tokio::test(start_paused = true)]
async fn cancellation_does_not_interrupt_a_running_action() {
    let finished = Arc::new(AtomicU32::new(0));
    let mut scheduler = Scheduler::with_settings(settings());
    let counter = finished.clone();
    scheduler
        .add_task(Task::from_fn("slow", Priority::Normal, Duration::from_secs(60), move || {
            let counter = counter.clone();
            async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }))
        .unwrap();

    let outcome = scheduler
        .start(CancellationToken::new())
        .run_until(Timeout(Duration::from_secs(1)))
        .await;

    assert!(outcome.is_cancelled());
    assert_eq!(finished.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn failing_task_stops_the_scheduler_by_default() {
    let mut scheduler = Scheduler::with_settings(settings());
    scheduler
        .add_task(Task::from_fn("flaky", Priority::High, Duration::from_secs(1), || async {
            Err(TaskError::msg("connection refused"))
        }))
        .unwrap();

    let err = scheduler.run(&CancellationToken::new()).await.unwrap_err();
    match err {
        SchedulerError::TaskFailed { name, source } => {
            assert_eq!(name, "flaky");
            assert_eq!(source.to_string(), "connection refused");
        }
        other => panic!("expected TaskFailed, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn isolate_policy_keeps_running_after_failures() {
    let log = RunLog::default();
    let attempts = Arc::new(AtomicU32::new(0));

    let mut scheduler =
        Scheduler::with_settings(settings().with_failure_policy(FailurePolicy::Isolate));
    let counter = attempts.clone();
    scheduler
        .add_task(Task::from_fn("flaky", Priority::High, Duration::from_secs(1), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(TaskError::msg("still broken")) }
        }))
        .unwrap();
    scheduler
        .add_task(logged(&log, "steady", Priority::Low, Duration::from_secs(1), Duration::ZERO))
        .unwrap();

    let outcome = scheduler
        .start(CancellationToken::new())
        .run_until(Timeout(Duration::from_secs(5)))
        .await;

    assert!(outcome.is_cancelled());
    assert!(attempts.load(Ordering::SeqCst) >= 2);
    assert!(runs_of(&log, "steady") >= 2);
}

#[tokio::test(start_paused = true)]
async fn loop_failure_wins_the_race_and_is_surfaced() {
    let mut scheduler = Scheduler::with_settings(settings());
    scheduler
        .add_task(Task::from_fn("crash", Priority::Normal, Duration::from_secs(1), || async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Err(TaskError::msg("bad state"))
        }))
        .unwrap();

    let never = CancellationToken::new();
    let outcome = scheduler
        .start(CancellationToken::new())
        .run_until(Manual(never.clone()).or(Timeout(Duration::from_secs(30))))
        .await;

    assert!(!outcome.is_cancelled());
    assert!(matches!(outcome.reason, SchedulerError::TaskFailed { ref name, .. } if name == "crash"));
    assert!(!never.is_cancelled());
    assert!(outcome.into_result().is_err());
}

#[tokio::test(start_paused = true)]
async fn input_line_stops_the_scheduler() {
    let log = RunLog::default();
    let mut scheduler = Scheduler::with_settings(settings());
    scheduler
        .add_task(logged(&log, "tick", Priority::Normal, Duration::from_secs(1), Duration::from_millis(50)))
        .unwrap();

    let (mut keyboard, input) = tokio::io::duplex(16);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(3)).await;
        keyboard.write_all(b"\n").await.unwrap();
        keyboard
    });

    let outcome = scheduler
        .start(CancellationToken::new())
        .run_until(InputWatcher::new(BufReader::new(input)).or(Timeout(Duration::from_secs(20))))
        .await;

    assert!(outcome.is_cancelled());
    let runs = runs_of(&log, "tick");
    assert!((2..=3).contains(&runs), "tick ran {runs} times");
}

#[tokio::test(start_paused = true)]
async fn panicking_task_is_reported() {
    let mut scheduler = Scheduler::with_settings(settings());
    scheduler
        .add_task(Task::from_fn("explode", Priority::Normal, Duration::from_secs(1), || async {
            panic!("kaboom");
        }))
        .unwrap();

    let outcome = scheduler.start(CancellationToken::new()).wait().await;
    assert!(outcome.scheduler.is_none());
    assert!(matches!(outcome.reason, SchedulerError::Panicked { ref message } if message == "kaboom"));
}

#[tokio::test(start_paused = true)]
async fn stop_cancels_a_spawned_scheduler() {
    let log = RunLog::default();
    let mut scheduler = Scheduler::with_settings(settings());
    scheduler
        .add_task(logged(&log, "tick", Priority::Normal, Duration::from_millis(500), Duration::ZERO))
        .unwrap();

    let handle = scheduler.start(CancellationToken::new());
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(!handle.is_finished());

    let outcome = handle.stop().await;
    assert!(outcome.is_cancelled());
    assert!(runs_of(&log, "tick") >= 3);
}

#[tokio::test]
async fn zero_backoff_still_observes_cancellation() {
    let mut scheduler = Scheduler::new();
    scheduler
        .add_task(Task::from_fn("idle", Priority::Normal, Duration::from_secs(3600), || async { Ok(()) }))
        .unwrap();

    let outcome = scheduler
        .start(CancellationToken::new())
        .run_until(Timeout(Duration::from_millis(50)))
        .await;

    assert!(outcome.is_cancelled());
}

#[test]
fn actions_that_never_wait_still_let_cancellation_through() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    let runs = Arc::new(AtomicU32::new(0));
    let counter = runs.clone();
    let mut scheduler = Scheduler::new();
    scheduler
        .add_task(Task::from_fn("busy", Priority::Normal, Duration::ZERO, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        }))
        .unwrap();

    let outcome = runtime.block_on(async {
        scheduler
            .start(CancellationToken::new())
            .run_until(Timeout(Duration::from_millis(50)))
            .await
    });

    assert!(outcome.is_cancelled(), "unexpected outcome: {:?}", outcome.reason);
    assert!(runs.load(Ordering::SeqCst) > 0);
}

/// Source whose setup fails, like a signal handler that cannot be installed.
struct Unavailable;

impl CancelSource for Unavailable {
    fn triggered(self) -> TriggerFuture {
        Box::pin(async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Err(std::io::Error::new(std::io::ErrorKind::Unsupported, "no signal handler"))
        })
    }
}

#[tokio::test(start_paused = true)]
async fn failed_source_is_not_reported_as_clean_cancellation() {
    let log = RunLog::default();
    let mut scheduler = Scheduler::with_settings(settings());
    scheduler
        .add_task(logged(&log, "tick", Priority::Normal, Duration::from_millis(200), Duration::ZERO))
        .unwrap();

    let outcome = scheduler
        .start(CancellationToken::new())
        .run_until(Unavailable)
        .await;

    assert!(!outcome.is_cancelled());
    assert!(matches!(
        outcome.reason,
        SchedulerError::SourceFailed(ref e) if e.kind() == std::io::ErrorKind::Unsupported
    ));
    assert!(outcome.scheduler.is_some());
    assert!(runs_of(&log, "tick") >= 1);
}
