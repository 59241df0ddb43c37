// Runtime tests for the birthday scheduler: startup scan, tick overlap and
// stop semantics. These use a one-second cron schedule and real time.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use common::dispatcher::Dispatcher;
use common::errors::{NotificationError, SchedulerError};
use common::models::Contact;
use common::notification::{BirthdayNotification, NotificationBackend};
use common::scan::ScanEngine;
use common::scheduler::{BirthdayScheduler, Scheduler, SchedulerConfig, SchedulerState};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Backend that tracks total calls and the peak number of concurrent calls
#[derive(Default)]
struct SlowBackend {
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl NotificationBackend for SlowBackend {
    fn kind(&self) -> &str {
        "test"
    }

    fn vendor(&self) -> &str {
        "slow"
    }

    async fn send_notification(
        &self,
        _notification: &BirthdayNotification,
    ) -> Result<(), NotificationError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(current, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A contact whose birthday is today (UTC), born in a leap year so that a
/// February 29 test day still yields a valid date
fn birthday_contact() -> Contact {
    let today = Utc::now().date_naive();
    let birth = NaiveDate::from_ymd_opt(2000, today.month(), today.day())
        .expect("2000 is a leap year");
    Contact::new("Today", "Celebrant", birth)
}

fn scheduler_with(
    expression: &str,
    run_on_startup: bool,
    backend: Arc<SlowBackend>,
) -> BirthdayScheduler {
    let config = SchedulerConfig {
        cron_expression: expression.to_string(),
        run_on_startup,
        ..SchedulerConfig::default()
    };
    let scanner = ScanEngine::new(
        vec![birthday_contact()],
        Dispatcher::new(vec![backend as Arc<dyn NotificationBackend>]),
        false,
    );
    BirthdayScheduler::new(config, scanner)
}

/// A startup scan completes before `start` returns
#[tokio::test]
async fn test_run_on_startup_scans_synchronously() {
    let backend = Arc::new(SlowBackend::default());
    // Fires once a year, so only the startup scan can reach the backend
    let scheduler = scheduler_with("0 0 0 1 1 *", true, backend.clone());

    scheduler.start().await.unwrap();
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);

    assert!(scheduler.stop().await.unwrap());
}

/// Without the startup flag nothing is scanned until the first tick
#[tokio::test]
async fn test_no_startup_scan_by_default() {
    let backend = Arc::new(SlowBackend::default());
    let scheduler = scheduler_with("0 0 0 1 1 *", false, backend.clone());

    scheduler.start().await.unwrap();
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    scheduler.stop().await.unwrap();
}

/// Scans longer than the tick interval never overlap
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_ticks_do_not_overlap() {
    let backend = Arc::new(SlowBackend {
        delay: Duration::from_millis(1500),
        ..SlowBackend::default()
    });
    let scheduler = scheduler_with("* * * * * *", false, backend.clone());

    scheduler.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(4500)).await;
    scheduler.stop().await.unwrap();

    let calls = backend.calls.load(Ordering::SeqCst);
    assert!(calls >= 1, "expected at least one tick, got {calls}");
    // Four one-second ticks fit in the window; with 1.5s scans at most three
    // can start when ticks are dropped instead of run concurrently
    assert!(calls <= 3, "expected dropped ticks, got {calls} scans");
    assert_eq!(backend.peak.load(Ordering::SeqCst), 1);
}

/// No tick fires after `stop` returns
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_no_ticks_after_stop() {
    let backend = Arc::new(SlowBackend::default());
    let scheduler = scheduler_with("* * * * * *", false, backend.clone());

    scheduler.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert!(scheduler.stop().await.unwrap());
    assert_eq!(scheduler.state(), SchedulerState::Stopped);

    let after_stop = backend.calls.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(2100)).await;
    assert_eq!(backend.calls.load(Ordering::SeqCst), after_stop);
}

/// Stop waits for an in-flight scan instead of interrupting it
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_waits_for_in_flight_scan() {
    let backend = Arc::new(SlowBackend {
        delay: Duration::from_millis(1500),
        ..SlowBackend::default()
    });
    let scheduler = scheduler_with("* * * * * *", false, backend.clone());

    scheduler.start().await.unwrap();
    // Wait until a scan is running
    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    while backend.in_flight.load(Ordering::SeqCst) == 0 {
        assert!(tokio::time::Instant::now() < deadline, "no tick fired");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    scheduler.stop().await.unwrap();
    assert_eq!(backend.in_flight.load(Ordering::SeqCst), 0);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
}

/// `run_scan` evaluates the current date
#[tokio::test]
async fn test_run_scan_matches_today() {
    let backend = Arc::new(SlowBackend::default());
    let scheduler = scheduler_with("@daily", false, backend.clone());

    let report = scheduler.run_scan().await;
    assert_eq!(report.matched, vec!["Today Celebrant"]);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
}

/// *For any* malformed expression, the scheduler refuses to start and stays idle
#[test]
fn property_malformed_expression_is_fatal() {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    proptest!(|(minute in 60u32..1000u32, word in "[a-z]{3,12}")| {
        for expression in [format!("{minute} * * * *"), word.clone(), String::new()] {
            let scheduler = scheduler_with(&expression, true, Arc::new(SlowBackend::default()));
            let result = rt.block_on(scheduler.start());
            prop_assert!(matches!(result, Err(SchedulerError::InvalidSchedule(_))));
            prop_assert_eq!(scheduler.state(), SchedulerState::Idle);
        }
    });
}
