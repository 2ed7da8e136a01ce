use cadence_rfc::rfc::ical::core::{AnchorPoint, Frequency, RuleSetEntry, RuleSpec};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

pub fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn local(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A one-hour event at `start`, repeating daily (`count` times when given).
pub fn daily_event(start: NaiveDateTime, timezone: Tz, count: Option<u32>) -> RuleSetEntry {
    let mut builder = RuleSpec::builder(Frequency::Daily);
    if let Some(count) = count {
        builder = builder.with_count(count);
    }
    let anchor = AnchorPoint::new(start, timezone)
        .with_end(start + chrono::TimeDelta::hours(1))
        .unwrap();
    RuleSetEntry::event(anchor, Some(builder.build().unwrap()))
}
