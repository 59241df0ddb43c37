// Log notification backend
// Writes the birthday wish as a structured log event

use super::{BirthdayNotification, NotificationBackend};
use crate::errors::NotificationError;
use async_trait::async_trait;

/// Backend that only emits a log event. It never fails.
#[derive(Debug, Default, Clone)]
pub struct LogBackend;

impl LogBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationBackend for LogBackend {
    fn kind(&self) -> &str {
        "log"
    }

    fn vendor(&self) -> &str {
        "tracing"
    }

    async fn send_notification(
        &self,
        notification: &BirthdayNotification,
    ) -> Result<(), NotificationError> {
        tracing::info!(
            first_name = %notification.contact.first_name,
            last_name = %notification.contact.last_name,
            age = notification.age,
            "{}",
            notification.message()
        );
        Ok(())
    }
}
