// Notification dispatcher
//
// Fans one matched contact out to every registered backend, in registration
// order. A failing backend never prevents delivery through the others, and
// each backend gets exactly one attempt per dispatch.

use crate::errors::NotificationError;
use crate::models::Contact;
use crate::notification::{BirthdayNotification, NotificationBackend};
use crate::telemetry::{record_notification_failure, record_notification_success};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Outcome of a single delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub kind: String,
    pub vendor: String,
    /// `None` on success, the human-readable cause on failure
    pub failure: Option<String>,
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Per-backend outcomes of one dispatch, in registration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub outcomes: Vec<DeliveryOutcome>,
}

impl DispatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Dispatcher owns the ordered set of backends
#[derive(Clone)]
pub struct Dispatcher {
    backends: Vec<Arc<dyn NotificationBackend>>,
    timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(backends: Vec<Arc<dyn NotificationBackend>>) -> Self {
        Self {
            backends,
            timeout: None,
        }
    }

    /// Bound each backend call by `timeout`; an elapsed call counts as a failure
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn backend_count(&self) -> usize {
        self.backends.len()
    }

    /// Send the birthday notification for `contact` through every backend.
    ///
    /// Never fails: delivery errors are logged and reported in the returned
    /// report, and the next backend is always attempted.
    pub async fn dispatch(&self, contact: &Contact, today: NaiveDate) -> DispatchReport {
        let notification = BirthdayNotification::new(contact, today);
        let mut report = DispatchReport::default();

        for backend in &self.backends {
            let kind = backend.kind();
            let vendor = backend.vendor();

            info!(
                backend_kind = kind,
                backend_vendor = vendor,
                "Sending the notification"
            );

            let failure = match self.send(backend.as_ref(), &notification).await {
                Ok(()) => {
                    info!(
                        backend_kind = kind,
                        backend_vendor = vendor,
                        "Successfully sent the notification"
                    );
                    record_notification_success(kind, vendor);
                    None
                }
                Err(e) => {
                    error!(
                        backend_kind = kind,
                        backend_vendor = vendor,
                        error = %e,
                        "Error while sending the notification"
                    );
                    record_notification_failure(kind, vendor);
                    Some(e.to_string())
                }
            };

            report.outcomes.push(DeliveryOutcome {
                kind: kind.to_string(),
                vendor: vendor.to_string(),
                failure,
            });
        }

        report
    }

    async fn send(
        &self,
        backend: &dyn NotificationBackend,
        notification: &BirthdayNotification,
    ) -> Result<(), NotificationError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, backend.send_notification(notification))
                .await
                .map_err(|_| NotificationError::Timeout(limit.as_secs()))?,
            None => backend.send_notification(notification).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Backend that records every call into a shared journal
    struct RecordingBackend {
        vendor: String,
        fail: bool,
        delay: Option<Duration>,
        journal: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl NotificationBackend for RecordingBackend {
        fn kind(&self) -> &str {
            "test"
        }

        fn vendor(&self) -> &str {
            &self.vendor
        }

        async fn send_notification(
            &self,
            notification: &BirthdayNotification,
        ) -> Result<(), NotificationError> {
            self.journal
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.vendor, notification.contact.first_name));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(NotificationError::Transport("connection refused".to_string()));
            }
            Ok(())
        }
    }

    fn backend(
        vendor: &str,
        fail: bool,
        journal: &Arc<Mutex<Vec<String>>>,
    ) -> Arc<dyn NotificationBackend> {
        Arc::new(RecordingBackend {
            vendor: vendor.to_string(),
            fail,
            delay: None,
            journal: journal.clone(),
        })
    }

    fn contact() -> Contact {
        Contact::new("Leap", "Ling", NaiveDate::from_ymd_opt(1996, 2, 29).unwrap())
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
    }

    #[tokio::test]
    async fn test_middle_failure_does_not_stop_dispatch() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = Dispatcher::new(vec![
            backend("first", false, &journal),
            backend("second", true, &journal),
            backend("third", false, &journal),
        ]);

        let report = dispatcher.dispatch(&contact(), today()).await;

        assert_eq!(
            *journal.lock().unwrap(),
            vec!["first:Leap", "second:Leap", "third:Leap"]
        );
        let successes: Vec<bool> = report.outcomes.iter().map(|o| o.is_success()).collect();
        assert_eq!(successes, vec![true, false, true]);
        assert_eq!(
            report.outcomes[1].failure.as_deref(),
            Some("Transport error: connection refused")
        );
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
    }

    #[tokio::test]
    async fn test_every_backend_failing_still_attempts_all() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = Dispatcher::new(vec![
            backend("a", true, &journal),
            backend("b", true, &journal),
        ]);

        let report = dispatcher.dispatch(&contact(), today()).await;
        assert_eq!(journal.lock().unwrap().len(), 2);
        assert_eq!(report.failed(), 2);
    }

    #[tokio::test]
    async fn test_no_backends_is_empty_report() {
        let dispatcher = Dispatcher::new(Vec::new());
        let report = dispatcher.dispatch(&contact(), today()).await;
        assert!(report.outcomes.is_empty());
        assert_eq!(dispatcher.backend_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_failure_and_continues() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let slow: Arc<dyn NotificationBackend> = Arc::new(RecordingBackend {
            vendor: "slow".to_string(),
            fail: false,
            delay: Some(Duration::from_secs(60)),
            journal: journal.clone(),
        });
        let dispatcher = Dispatcher::new(vec![slow, backend("fast", false, &journal)])
            .with_timeout(Duration::from_secs(5));

        let report = dispatcher.dispatch(&contact(), today()).await;

        assert_eq!(
            report.outcomes[0].failure.as_deref(),
            Some("Timed out after 5 seconds")
        );
        assert!(report.outcomes[1].is_success());
    }
}
