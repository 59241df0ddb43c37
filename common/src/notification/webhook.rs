// Webhook notification backend
// Posts a JSON chat message ({"text": ...}) to Slack-style incoming webhooks

use super::{BirthdayNotification, NotificationBackend};
use crate::errors::NotificationError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

/// WebhookBackend delivers notifications through an HTTP POST
pub struct WebhookBackend {
    client: Client,
    vendor: String,
    url: String,
}

impl WebhookBackend {
    /// Create a new webhook backend for the given vendor and URL
    pub fn new(vendor: impl Into<String>, url: impl Into<String>) -> Result<Self, NotificationError> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(NotificationError::Configuration(
                "webhook URL cannot be empty".to_string(),
            ));
        }

        let client = Client::builder().build().map_err(|e| {
            NotificationError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            vendor: vendor.into(),
            url,
        })
    }
}

#[async_trait]
impl NotificationBackend for WebhookBackend {
    fn kind(&self) -> &str {
        "webhook"
    }

    fn vendor(&self) -> &str {
        &self.vendor
    }

    #[tracing::instrument(skip_all, fields(vendor = %self.vendor))]
    async fn send_notification(
        &self,
        notification: &BirthdayNotification,
    ) -> Result<(), NotificationError> {
        let payload = json!({ "text": notification.message() });

        let response = self.client.post(&self.url).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(status = status.as_u16(), "Webhook accepted notification");
        Ok(())
    }
}
