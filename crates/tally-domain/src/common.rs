//! Shared traits, identifiers, and ISO date helpers.

use std::fmt;

use chrono::{DateTime, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Canonical wire format for calendar dates (`YYYY-MM-DD`).
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Exposes a stable identifier for persisted entities.
pub trait Identifiable {
    fn id(&self) -> Uuid;
}

impl<T: Identifiable + ?Sized> Identifiable for &T {
    fn id(&self) -> Uuid {
        (**self).id()
    }
}

/// First entity in `items` carrying `id`.
pub fn find_by_id<T: Identifiable>(items: impl IntoIterator<Item = T>, id: Uuid) -> Option<T> {
    items.into_iter().find(|item| item.id() == id)
}

/// Converts an entity into a user-facing display label.
pub trait Displayable {
    fn display_label(&self) -> String;
}

/// Opaque identifier of the user that owns a partition of rules and transactions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Formats a date as `YYYY-MM-DD`.
pub fn format_iso(date: NaiveDate) -> String {
    date.format(ISO_DATE_FORMAT).to_string()
}

/// Parses a strict `YYYY-MM-DD` date.
pub fn parse_iso(value: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(value.trim(), ISO_DATE_FORMAT)
}

/// Drops the time-of-day component, keeping the calendar date in the value's own zone.
pub fn normalize<Tz: TimeZone>(moment: &DateTime<Tz>) -> NaiveDate {
    moment.date_naive()
}

/// Returns true when `date` falls on or before `today`.
pub fn is_due(date: NaiveDate, today: NaiveDate) -> bool {
    date <= today
}
