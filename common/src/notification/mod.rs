// Notification backends
// Provides the delivery capability trait and its concrete implementations

pub mod log;
pub mod webhook;

use crate::config::NotificationsConfig;
use crate::errors::NotificationError;
use crate::models::Contact;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;

pub use self::log::LogBackend;
pub use self::webhook::WebhookBackend;

/// A birthday notification for one contact on one day
#[derive(Debug, Clone, Serialize)]
pub struct BirthdayNotification {
    pub contact: Contact,
    pub age: i32,
    pub date: NaiveDate,
}

impl BirthdayNotification {
    pub fn new(contact: &Contact, today: NaiveDate) -> Self {
        Self {
            contact: contact.clone(),
            age: contact.age(today),
            date: today,
        }
    }

    /// Human-readable message body
    pub fn message(&self) -> String {
        format!(
            "Today is {}'s birthday ({} years old)!",
            self.contact.full_name(),
            self.age
        )
    }
}

/// NotificationBackend is anything that can attempt to deliver a birthday
/// notification. `kind` and `vendor` only identify the backend in logs and
/// metrics.
#[async_trait]
pub trait NotificationBackend: Send + Sync {
    fn kind(&self) -> &str;

    fn vendor(&self) -> &str;

    async fn send_notification(
        &self,
        notification: &BirthdayNotification,
    ) -> Result<(), NotificationError>;
}

/// Build the configured backends in registration order: the log backend
/// first (when enabled), then each webhook in declaration order.
pub fn build_backends(
    config: &NotificationsConfig,
) -> Result<Vec<Arc<dyn NotificationBackend>>, NotificationError> {
    let mut backends: Vec<Arc<dyn NotificationBackend>> = Vec::new();

    if config.log.enabled {
        backends.push(Arc::new(LogBackend::new()));
    }

    for webhook in &config.webhooks {
        backends.push(Arc::new(WebhookBackend::new(
            webhook.vendor.clone(),
            webhook.url.clone(),
        )?));
    }

    Ok(backends)
}
