// OS signal forwarding for graceful shutdown
//
// The handlers are installed up front and every termination signal received
// is forwarded into a channel, so the consumer decides what a second signal
// means. Unix listens for SIGINT and SIGTERM; elsewhere only Ctrl-C.

use std::fmt;
use tokio::sync::mpsc;

/// Channel depth; extra signals beyond this are dropped
const SIGNAL_BUFFER: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownSignal::Interrupt => f.write_str("SIGINT"),
            ShutdownSignal::Terminate => f.write_str("SIGTERM"),
        }
    }
}

#[cfg(unix)]
pub fn spawn_signal_listener() -> std::io::Result<mpsc::Receiver<ShutdownSignal>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let (tx, rx) = mpsc::channel(SIGNAL_BUFFER);

    tokio::spawn(async move {
        loop {
            let received = tokio::select! {
                Some(()) = sigint.recv() => ShutdownSignal::Interrupt,
                Some(()) = sigterm.recv() => ShutdownSignal::Terminate,
                else => break,
            };
            if tx.try_send(received).is_err() && tx.is_closed() {
                break;
            }
        }
    });

    Ok(rx)
}

#[cfg(not(unix))]
pub fn spawn_signal_listener() -> std::io::Result<mpsc::Receiver<ShutdownSignal>> {
    let (tx, rx) = mpsc::channel(SIGNAL_BUFFER);

    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if tx.try_send(ShutdownSignal::Interrupt).is_err() && tx.is_closed() {
                break;
            }
        }
    });

    Ok(rx)
}
