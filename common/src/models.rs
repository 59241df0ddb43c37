use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

// ============================================================================
// Contact Models
// ============================================================================

/// A person whose birthday should be wished.
///
/// Contacts are loaded once at startup and never mutated afterwards; every
/// predicate below is a pure function of the birthdate and the given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub first_name: String,
    pub last_name: String,
    pub birthdate: NaiveDate,
}

impl Contact {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        birthdate: NaiveDate,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            birthdate,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// True when `today` shares the birthdate's month and day.
    ///
    /// There is no March 1st fallback here: a February 29 birthday only
    /// matches on February 29.
    pub fn is_birthday_today(&self, today: NaiveDate) -> bool {
        self.birthdate.month() == today.month() && self.birthdate.day() == today.day()
    }

    /// True when the birth year is a Gregorian leap year.
    pub fn is_born_on_leap_year(&self) -> bool {
        is_leap_year(self.birthdate.year())
    }

    /// Whole years elapsed between the birthdate and `today`.
    pub fn age(&self, today: NaiveDate) -> i32 {
        let mut age = today.year() - self.birthdate.year();
        if (today.month(), today.day()) < (self.birthdate.month(), self.birthdate.day()) {
            age -= 1;
        }
        age
    }
}

/// Gregorian leap-year rule
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// True on March 1st, the day leap-year notices are emitted
pub fn is_leap_year_notice_day(today: NaiveDate) -> bool {
    today.month() == 3 && today.day() == 1
}
