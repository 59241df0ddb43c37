// Scheduler engine implementation
//
// State machine: Idle -> Running -> Stopped (terminal). The recurring loop
// runs each scan inline, so ticks never overlap: fire instants that elapse
// while a scan is still running are dropped, and the next fire instant is
// computed from the wall clock once the scan finishes. The search never
// starts before the last fire instant, so a backwards clock step cannot
// replay a tick.

use crate::errors::SchedulerError;
use crate::scan::{ScanEngine, ScanReport};
use crate::schedule::{default_timezone, CronTrigger};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Upper bound when counting ticks dropped during a long scan
const MAX_COUNTED_SKIPPED_TICKS: usize = 10_000;

/// Wall clock source for fire time calculation
trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Configuration for the scheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Cron expression driving the recurring scan
    pub cron_expression: String,
    /// Timezone the expression and "today" are evaluated in
    pub timezone: Tz,
    /// Run one scan synchronously before entering the schedule
    pub run_on_startup: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            cron_expression: "0 0 9 * * *".to_string(),
            timezone: default_timezone(),
            run_on_startup: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SchedulerState {
    Idle = 0,
    Running = 1,
    Stopped = 2,
}

impl SchedulerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => SchedulerState::Idle,
            1 => SchedulerState::Running,
            _ => SchedulerState::Stopped,
        }
    }
}

/// Scheduler trait for the recurring birthday scan
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Validate the schedule, optionally scan once, then start the recurring loop
    async fn start(&self) -> Result<(), SchedulerError>;

    /// Stop the recurring loop. Returns `Ok(true)` for the call that actually
    /// stopped the scheduler and `Ok(false)` when it was already stopped.
    async fn stop(&self) -> Result<bool, SchedulerError>;

    /// Run a single scan for the current date
    async fn run_scan(&self) -> ScanReport;
}

/// Cron-driven scheduler around a [`ScanEngine`]
pub struct BirthdayScheduler {
    config: SchedulerConfig,
    scanner: Arc<ScanEngine>,
    clock: Arc<dyn Clock>,
    state: AtomicU8,
    shutdown_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for BirthdayScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BirthdayScheduler")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl BirthdayScheduler {
    pub fn new(config: SchedulerConfig, scanner: ScanEngine) -> Self {
        let (shutdown_tx, _shutdown_rx) = watch::channel(false);

        Self {
            config,
            scanner: Arc::new(scanner),
            clock: Arc::new(SystemClock),
            state: AtomicU8::new(SchedulerState::Idle as u8),
            shutdown_tx,
            task: Mutex::new(None),
        }
    }

    pub fn state(&self) -> SchedulerState {
        SchedulerState::from_u8(self.state.load(Ordering::SeqCst))
    }

    #[cfg(test)]
    fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn transition(&self, from: SchedulerState, to: SchedulerState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

#[async_trait]
impl Scheduler for BirthdayScheduler {
    #[instrument(skip(self), fields(cron_expression = %self.config.cron_expression))]
    async fn start(&self) -> Result<(), SchedulerError> {
        if self.state() != SchedulerState::Idle {
            return Err(SchedulerError::AlreadyStarted);
        }

        let trigger = CronTrigger::new(&self.config.cron_expression, self.config.timezone)?;

        if !self.transition(SchedulerState::Idle, SchedulerState::Running) {
            return Err(SchedulerError::AlreadyStarted);
        }

        if self.config.run_on_startup {
            info!("Running startup scan");
            self.run_scan().await;
        }

        let mut task = self.task.lock().await;
        if self.state() != SchedulerState::Running {
            debug!("Scheduler stopped during startup scan, not entering schedule");
            return Ok(());
        }

        info!(
            cron_expression = %self.config.cron_expression,
            timezone = %self.config.timezone,
            next_fire_time = ?trigger.next_after(self.clock.now()),
            "Starting the scheduler"
        );

        let shutdown_rx = self.shutdown_tx.subscribe();
        *task = Some(tokio::spawn(run_loop(
            trigger,
            self.scanner.clone(),
            self.clock.clone(),
            shutdown_rx,
        )));

        Ok(())
    }

    #[instrument(skip(self))]
    async fn stop(&self) -> Result<bool, SchedulerError> {
        if self.transition(SchedulerState::Idle, SchedulerState::Stopped) {
            return Err(SchedulerError::NotRunning);
        }
        if !self.transition(SchedulerState::Running, SchedulerState::Stopped) {
            debug!("Scheduler already stopped");
            return Ok(false);
        }

        info!("Stopping the scheduler");
        self.shutdown_tx.send_replace(true);

        // Waits for an in-flight scan; no tick fires once this returns
        let handle = self.task.lock().await.take();
        if let Some(handle) = handle {
            handle
                .await
                .map_err(|e| SchedulerError::TaskFailed(e.to_string()))?;
        }

        info!("Scheduler stopped");
        Ok(true)
    }

    async fn run_scan(&self) -> ScanReport {
        let today = self.clock.now().with_timezone(&self.config.timezone).date_naive();
        self.scanner.scan(today).await
    }
}

/// Recurring loop: sleep until the next fire instant, scan, repeat
async fn run_loop(
    trigger: CronTrigger,
    scanner: Arc<ScanEngine>,
    clock: Arc<dyn Clock>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut last_fire: Option<DateTime<Utc>> = None;

    loop {
        if *shutdown_rx.borrow_and_update() {
            break;
        }

        let now = clock.now();
        let from = last_fire.map_or(now, |last| last.max(now));
        let next = match trigger.require_next_after(from) {
            Ok(next) => next,
            Err(e) => {
                warn!(error = %e, "Scheduler loop exiting");
                break;
            }
        };
        let delay = (next - now).to_std().unwrap_or(Duration::ZERO);

        tokio::select! {
            _ = tokio::time::sleep(delay) => {
                let today = trigger.local_date(next);
                debug!(fire_time = %next, %today, "Scheduler tick");

                scanner.scan(today).await;
                last_fire = Some(next);

                let skipped =
                    trigger.fire_times_between(next, clock.now(), MAX_COUNTED_SKIPPED_TICKS);
                if skipped > 0 {
                    debug!(skipped_ticks = skipped, "Dropped ticks that fired during the scan");
                }
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    debug!("Scheduler loop exited");
}
