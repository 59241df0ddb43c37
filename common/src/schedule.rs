// Schedule parsing and next fire time calculation
//
// Accepts standard five-field cron (minute precision), six fields with a
// leading seconds field, seven fields with a trailing year, and the
// @yearly/@monthly/@weekly/@daily/@hourly shorthands.

use crate::errors::ScheduleError;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use cron::Schedule as CronSchedule;
use std::str::FromStr;

/// Parse and validate a cron expression
pub fn parse_cron_expression(expression: &str) -> Result<CronSchedule, ScheduleError> {
    let trimmed = expression.trim();
    if trimmed.is_empty() {
        return Err(ScheduleError::InvalidCronExpression {
            expression: expression.to_string(),
            reason: "expression is empty".to_string(),
        });
    }

    let normalized = normalize_expression(trimmed);
    CronSchedule::from_str(&normalized).map_err(|e| ScheduleError::InvalidCronExpression {
        expression: expression.to_string(),
        reason: e.to_string(),
    })
}

/// Five-field expressions get an implicit `0` seconds field
fn normalize_expression(expression: &str) -> String {
    if expression.starts_with('@') {
        return expression.to_string();
    }

    let fields: Vec<&str> = expression.split_whitespace().collect();
    if fields.len() == 5 {
        format!("0 {}", fields.join(" "))
    } else {
        fields.join(" ")
    }
}

/// Parse an IANA timezone name
pub fn parse_timezone(name: &str) -> Result<Tz, ScheduleError> {
    Tz::from_str(name.trim()).map_err(|_| ScheduleError::InvalidTimezone(name.to_string()))
}

/// A validated cron schedule evaluated in a fixed timezone
#[derive(Debug, Clone)]
pub struct CronTrigger {
    expression: String,
    schedule: CronSchedule,
    timezone: Tz,
}

impl CronTrigger {
    pub fn new(expression: &str, timezone: Tz) -> Result<Self, ScheduleError> {
        Ok(Self {
            expression: expression.to_string(),
            schedule: parse_cron_expression(expression)?,
            timezone,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// First fire instant strictly after `instant`
    pub fn next_after(&self, instant: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let local = instant.with_timezone(&self.timezone);
        self.schedule
            .after(&local)
            .next()
            .map(|next| next.with_timezone(&Utc))
    }

    /// Like `next_after`, but a missing fire time is an error
    pub fn require_next_after(&self, instant: DateTime<Utc>) -> Result<DateTime<Utc>, ScheduleError> {
        self.next_after(instant)
            .ok_or_else(|| ScheduleError::NoNextExecution {
                expression: self.expression.clone(),
            })
    }

    /// Number of fire instants in `(after, until]`, capped at `limit`
    pub fn fire_times_between(
        &self,
        after: DateTime<Utc>,
        until: DateTime<Utc>,
        limit: usize,
    ) -> usize {
        let local = after.with_timezone(&self.timezone);
        self.schedule
            .after(&local)
            .take(limit)
            .take_while(|t| t.with_timezone(&Utc) <= until)
            .count()
    }

    /// The calendar date of `instant` in this trigger's timezone
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.timezone).date_naive()
    }
}

/// Default timezone for schedule evaluation
pub fn default_timezone() -> Tz {
    chrono_tz::UTC
}
