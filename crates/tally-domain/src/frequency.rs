//! Repetition cadence of a recurrence rule and the calendar stepping behind it.

use std::{fmt, str::FromStr};

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Enumerates the supported repetition cadences.
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub const ALL: [Frequency; 4] = [
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Monthly,
        Frequency::Yearly,
    ];

    /// Steps `from` forward by exactly one period.
    ///
    /// Monthly and yearly steps keep the day-of-month when the target month has it and
    /// otherwise clamp to that month's last day. Clamping is relative to `from`, so a
    /// chain of steps starting on the 31st drifts (Jan 31 -> Feb 29 -> Mar 29).
    /// Returns `None` only when the result would leave chrono's supported date range.
    pub fn checked_advance(self, from: NaiveDate) -> Option<NaiveDate> {
        match self {
            Frequency::Daily => from.checked_add_signed(Duration::days(1)),
            Frequency::Weekly => from.checked_add_signed(Duration::weeks(1)),
            Frequency::Monthly => shift_month(from, 1),
            Frequency::Yearly => shift_year(from, 1),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Frequency::Daily => "Daily",
            Frequency::Weekly => "Weekly",
            Frequency::Monthly => "Monthly",
            Frequency::Yearly => "Yearly",
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a frequency label is not one of the supported cadences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFrequency(pub String);

impl fmt::Display for UnknownFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown frequency `{}`", self.0)
    }
}

impl std::error::Error for UnknownFrequency {}

impl FromStr for Frequency {
    type Err = UnknownFrequency;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "yearly" => Ok(Frequency::Yearly),
            other => Err(UnknownFrequency(other.to_string())),
        }
    }
}

fn shift_month(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let mut year = date.year();
    let mut month = date.month() as i32 + months;
    while month > 12 {
        month -= 12;
        year += 1;
    }
    while month < 1 {
        month += 12;
        year -= 1;
    }
    let day = date.day().min(days_in_month(year, month as u32)?);
    NaiveDate::from_ymd_opt(year, month as u32, day)
}

fn shift_year(date: NaiveDate, years: i32) -> Option<NaiveDate> {
    let year = date.year() + years;
    let month = date.month();
    let day = date.day().min(days_in_month(year, month)?);
    NaiveDate::from_ymd_opt(year, month, day)
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let first_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;
    first_next.pred_opt().map(|last| last.day())
}
