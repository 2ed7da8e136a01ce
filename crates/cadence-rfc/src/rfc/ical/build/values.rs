//! Value formatters for iCalendar (RFC 5545 §3.3).

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Formats a UTC DATE-TIME (`19970714T173000Z`).
#[must_use]
pub fn format_utc(instant: DateTime<Utc>) -> String {
    instant.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Formats a local DATE-TIME without a UTC marker (`19970714T133000`).
#[must_use]
pub fn format_local(local: NaiveDateTime) -> String {
    local.format("%Y%m%dT%H%M%S").to_string()
}

/// Formats a DATE (`19970714`).
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Formats a comma-joined list of UTC DATE-TIMEs.
#[must_use]
pub fn format_utc_list(instants: &[DateTime<Utc>]) -> String {
    instants
        .iter()
        .map(|i| format_utc(*i))
        .collect::<Vec<_>>()
        .join(",")
}
