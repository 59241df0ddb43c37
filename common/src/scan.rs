// Scan engine: one pass over every contact for a single scheduler tick

use crate::dispatcher::{DispatchReport, Dispatcher};
use crate::models::{is_leap_year_notice_day, Contact};
use crate::telemetry::{record_birthday_match, record_leap_year_notice, record_scan};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// What a single scan observed, in contact order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub date: Option<NaiveDate>,
    /// Full names of contacts whose birthday is today
    pub matched: Vec<String>,
    /// Full names of contacts that got the March 1st leap-year notice
    pub leap_year_notices: Vec<String>,
    /// One dispatch report per matched contact
    pub deliveries: Vec<DispatchReport>,
}

/// ScanEngine walks the contact list sequentially and dispatches matches
pub struct ScanEngine {
    contacts: Arc<Vec<Contact>>,
    dispatcher: Dispatcher,
    handle_leap_years: bool,
}

impl ScanEngine {
    pub fn new(contacts: Vec<Contact>, dispatcher: Dispatcher, handle_leap_years: bool) -> Self {
        Self {
            contacts: Arc::new(contacts),
            dispatcher,
            handle_leap_years,
        }
    }

    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    pub fn backend_count(&self) -> usize {
        self.dispatcher.backend_count()
    }

    /// Run one scan for `today`.
    ///
    /// The literal-birthday branch dispatches to every backend. The leap-year
    /// branch is independent: on March 1st, with the feature enabled, every
    /// contact born in a leap year is logged, whatever their birthday, and no
    /// backend is called.
    #[instrument(skip(self), fields(contact_count = self.contacts.len()))]
    pub async fn scan(&self, today: NaiveDate) -> ScanReport {
        let mut report = ScanReport {
            date: Some(today),
            ..ScanReport::default()
        };
        let leap_notice_day = self.handle_leap_years && is_leap_year_notice_day(today);

        for contact in self.contacts.iter() {
            if contact.is_birthday_today(today) {
                info!(
                    age = contact.age(today),
                    first_name = %contact.first_name,
                    last_name = %contact.last_name,
                    "Birthday to wish"
                );
                record_birthday_match();

                let delivery = self.dispatcher.dispatch(contact, today).await;
                report.matched.push(contact.full_name());
                report.deliveries.push(delivery);
            }

            if leap_notice_day && contact.is_born_on_leap_year() {
                info!(
                    age = contact.age(today),
                    first_name = %contact.first_name,
                    last_name = %contact.last_name,
                    "Birthday to wish on a leap year"
                );
                record_leap_year_notice();
                report.leap_year_notices.push(contact.full_name());
            }
        }

        record_scan();
        debug!(
            matched = report.matched.len(),
            leap_year_notices = report.leap_year_notices.len(),
            "Scan finished"
        );

        report
    }
}
