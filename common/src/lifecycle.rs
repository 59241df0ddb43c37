// Process lifecycle: start the scheduler, block until a termination signal,
// then stop the scheduler exactly once.

use crate::errors::LifecycleError;
use crate::os_signals::{spawn_signal_listener, ShutdownSignal};
use crate::scheduler::Scheduler;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// One-shot gate guarding the shutdown path
#[derive(Debug, Default)]
pub struct ShutdownGate {
    triggered: AtomicBool,
}

impl ShutdownGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` for the first caller only
    pub fn try_begin(&self) -> bool {
        self.triggered
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

/// Lifecycle owns the process-wide start/wait/stop sequence
pub struct Lifecycle {
    scheduler: Arc<dyn Scheduler>,
    gate: ShutdownGate,
}

impl Lifecycle {
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            scheduler,
            gate: ShutdownGate::new(),
        }
    }

    /// Run until SIGINT/SIGTERM is received
    pub async fn run(&self) -> Result<(), LifecycleError> {
        let signals = spawn_signal_listener()?;
        self.run_until(signals).await
    }

    /// Run until the first signal arrives on `signals`. A closed channel is
    /// treated as a shutdown request. Signals received while shutting down
    /// are logged and ignored.
    pub async fn run_until(
        &self,
        mut signals: mpsc::Receiver<ShutdownSignal>,
    ) -> Result<(), LifecycleError> {
        self.scheduler.start().await?;

        info!("Waiting for birthdays to wish");

        match signals.recv().await {
            Some(signal) => info!(%signal, "Received an interrupt, stopping services"),
            None => warn!("Signal channel closed, stopping services"),
        }

        let drain = tokio::spawn(async move {
            while let Some(signal) = signals.recv().await {
                info!(%signal, "Shutdown already in progress, ignoring signal");
            }
        });

        let result = if self.gate.try_begin() {
            self.scheduler.stop().await.map(|_| ())
        } else {
            Ok(())
        };
        drain.abort();
        result?;

        info!("Services stopped");
        Ok(())
    }
}
