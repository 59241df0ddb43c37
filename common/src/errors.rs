// Error handling framework
//
// Configuration and schedule errors are fatal at startup. Delivery errors are
// local to a single backend call and never escape the dispatcher.

use thiserror::Error;

/// Schedule-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid cron expression '{expression}': {reason}")]
    InvalidCronExpression { expression: String, reason: String },

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("No next execution time available for '{expression}'")]
    NoNextExecution { expression: String },
}

/// Errors reported by a notification backend for a single delivery attempt
#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    #[error("Backend configuration error: {0}")]
    Configuration(String),
}

/// Contact loading errors
#[derive(Error, Debug)]
pub enum ContactError {
    #[error("Failed to read contacts from {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Invalid contact record at line {line}: {reason}")]
    InvalidRecord { line: u64, reason: String },
}

/// Scheduler lifecycle errors
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error(transparent)]
    InvalidSchedule(#[from] ScheduleError),

    #[error("Scheduler already started")]
    AlreadyStarted,

    #[error("Scheduler is not running")]
    NotRunning,

    #[error("Scheduler task failed: {0}")]
    TaskFailed(String),
}

/// Process lifecycle errors
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("Failed to listen for shutdown signals: {0}")]
    Signal(#[from] std::io::Error),
}

impl From<reqwest::Error> for NotificationError {
    fn from(err: reqwest::Error) -> Self {
        NotificationError::Transport(err.to_string())
    }
}

impl From<csv::Error> for ContactError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        match err.kind() {
            csv::ErrorKind::Io(_) => ContactError::Io {
                path: String::new(),
                reason: err.to_string(),
            },
            _ => ContactError::InvalidRecord {
                line,
                reason: err.to_string(),
            },
        }
    }
}
