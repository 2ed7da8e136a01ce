//! Value type parsers for iCalendar (RFC 5545 §3.3).
//!
//! Error sources are discarded during parsing (`map_err_ignore`): the line and
//! column carried by `ParseError` locate the problem.
#![expect(
    clippy::map_err_ignore,
    reason = "Value parsers report location-based errors instead of std parse errors"
)]

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::error::{ParseError, ParseErrorKind, ParseResult};
use crate::rfc::ical::core::{ByConstraint, Frequency, RuleSpecBuilder, Weekday, WeekdayNum};

/// Parses a DATE value (RFC 5545 §3.3.4).
///
/// Format: YYYYMMDD (e.g., "19970714")
///
/// ## Errors
/// Returns an error if the string is not a valid calendar date.
pub fn parse_date(s: &str, line: usize, col: usize) -> ParseResult<NaiveDate> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::new(ParseErrorKind::InvalidDate, line, col));
    }

    let year = s[0..4]
        .parse::<i32>()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidDate, line, col))?;
    let month = s[4..6]
        .parse::<u32>()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidDate, line, col))?;
    let day = s[6..8]
        .parse::<u32>()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidDate, line, col))?;

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidDate, line, col))
}

/// Parses a TIME value (RFC 5545 §3.3.12).
///
/// Format: HHMMSS[Z]. Returns the time and whether it was marked UTC.
/// A leap second (`60`) is clamped to `59`.
///
/// ## Errors
/// Returns an error if the string is not a valid 6-digit time.
pub fn parse_time(s: &str, line: usize, col: usize) -> ParseResult<(NaiveTime, bool)> {
    let (time_str, is_utc) = match s.strip_suffix('Z') {
        Some(stripped) => (stripped, true),
        None => (s, false),
    };

    if time_str.len() != 6 || !time_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::new(ParseErrorKind::InvalidTime, line, col));
    }

    let hour = time_str[0..2]
        .parse::<u32>()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidTime, line, col))?;
    let minute = time_str[2..4]
        .parse::<u32>()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidTime, line, col))?;
    let second = time_str[4..6]
        .parse::<u32>()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidTime, line, col))?;

    if second > 60 {
        return Err(ParseError::new(ParseErrorKind::InvalidTime, line, col));
    }

    NaiveTime::from_hms_opt(hour, minute, second.min(59))
        .map(|time| (time, is_utc))
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidTime, line, col))
}

/// Parses a DATE-TIME value (RFC 5545 §3.3.5).
///
/// Format: YYYYMMDD"T"HHMMSS[Z]. Returns the wall-clock value and whether it
/// was marked UTC; TZID is handled at the property level.
///
/// ## Errors
/// Returns an error if the string is not a valid date-time.
pub fn parse_datetime(s: &str, line: usize, col: usize) -> ParseResult<(NaiveDateTime, bool)> {
    let t_pos = s
        .find('T')
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidDateTime, line, col))?;

    let date = parse_date(&s[..t_pos], line, col)?;
    let (time, is_utc) = parse_time(&s[t_pos + 1..], line, col + t_pos + 1)?;

    Ok((date.and_time(time), is_utc))
}

/// An `UNTIL` value before it is resolved against the anchor's timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UntilValue {
    /// DATE form: inclusive through the end of that local day.
    Date(NaiveDate),
    /// DATE-TIME form, with whether it was marked UTC.
    DateTime(NaiveDateTime, bool),
}

/// A parsed RECUR value.
///
/// `UNTIL` is kept aside because it can only become an instant once the
/// anchor's timezone is known; the builder holds every other part.
#[derive(Debug, Clone)]
pub struct RecurParts {
    pub builder: RuleSpecBuilder,
    pub until: Option<UntilValue>,
}

/// Parses a RECUR (RRULE/EXRULE) value (RFC 5545 §3.3.10).
///
/// Unknown rule parts are ignored. Semantic checks (count with until, value
/// ranges, zero interval) run when the builder is built.
///
/// ## Errors
/// Returns an error if a part is malformed or `FREQ` is missing.
pub fn parse_rrule(s: &str, line: usize, col: usize) -> ParseResult<RecurParts> {
    let mut parts = Vec::new();
    let mut frequency = None;

    for part in s.split(';').filter(|p| !p.is_empty()) {
        let (key, value) = part.split_once('=').ok_or_else(|| {
            ParseError::new(ParseErrorKind::InvalidRRule, line, col)
                .with_context(format!("expected KEY=VALUE, found '{part}'"))
        })?;
        let key = key.to_ascii_uppercase();
        if key == "FREQ" {
            frequency = Some(
                Frequency::parse(value)
                    .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidFrequency, line, col))?,
            );
        } else {
            parts.push((key, value));
        }
    }

    let frequency = frequency.ok_or_else(|| {
        ParseError::new(ParseErrorKind::InvalidRRule, line, col).with_context("missing FREQ")
    })?;

    let mut recur = RecurParts {
        builder: RuleSpecBuilder::new(frequency),
        until: None,
    };
    for (key, value) in parts {
        parse_rrule_part(&mut recur, &key, value, line, col)?;
    }
    Ok(recur)
}

/// Parses a single RRULE key-value pair.
fn parse_rrule_part(
    recur: &mut RecurParts,
    key: &str,
    value: &str,
    line: usize,
    col: usize,
) -> ParseResult<()> {
    let builder = recur.builder.clone();
    recur.builder = match key {
        "INTERVAL" => builder.with_interval(parse_number(value, line, col)?),
        "COUNT" => builder.with_count(parse_number(value, line, col)?),
        "UNTIL" => {
            recur.until = Some(parse_until(value, line, col)?);
            builder
        }
        "WKST" => builder.with_week_start(
            Weekday::parse(value)
                .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidWeekday, line, col))?,
        ),
        "BYSECOND" => builder.with_constraint(ByConstraint::Second(parse_list(value, line, col)?)),
        "BYMINUTE" => builder.with_constraint(ByConstraint::Minute(parse_list(value, line, col)?)),
        "BYHOUR" => builder.with_constraint(ByConstraint::Hour(parse_list(value, line, col)?)),
        "BYDAY" => builder.with_constraint(ByConstraint::Weekday(parse_byday(value, line, col)?)),
        "BYMONTHDAY" => {
            builder.with_constraint(ByConstraint::MonthDay(parse_list(value, line, col)?))
        }
        "BYYEARDAY" => {
            builder.with_constraint(ByConstraint::YearDay(parse_list(value, line, col)?))
        }
        "BYWEEKNO" => builder.with_constraint(ByConstraint::WeekNo(parse_list(value, line, col)?)),
        "BYMONTH" => builder.with_constraint(ByConstraint::Month(parse_list(value, line, col)?)),
        "BYSETPOS" => builder.with_constraint(ByConstraint::SetPos(parse_list(value, line, col)?)),
        _ => {
            tracing::warn!(part = key, "Ignoring unknown recurrence rule part");
            builder
        }
    };
    Ok(())
}

/// Parses the UNTIL component, which may be a DATE or a DATE-TIME.
fn parse_until(value: &str, line: usize, col: usize) -> ParseResult<UntilValue> {
    if value.contains('T') {
        let (local, is_utc) = parse_datetime(value, line, col)?;
        Ok(UntilValue::DateTime(local, is_utc))
    } else {
        Ok(UntilValue::Date(parse_date(value, line, col)?))
    }
}

fn parse_number(value: &str, line: usize, col: usize) -> ParseResult<u32> {
    value
        .trim()
        .parse()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidInteger, line, col))
}

/// Parses a comma-separated list of integers (signed or unsigned).
fn parse_list<T: std::str::FromStr>(value: &str, line: usize, col: usize) -> ParseResult<Vec<T>> {
    value
        .split(',')
        .map(|item| {
            item.trim()
                .trim_start_matches('+')
                .parse::<T>()
                .map_err(|_| {
                    ParseError::new(ParseErrorKind::InvalidInteger, line, col)
                        .with_context(format!("'{item}'"))
                })
        })
        .collect()
}

/// Parses BYDAY values like `MO`, `1MO`, `-1FR`.
fn parse_byday(value: &str, line: usize, col: usize) -> ParseResult<Vec<WeekdayNum>> {
    value
        .split(',')
        .map(|item| {
            WeekdayNum::parse(item).map_err(|_| {
                ParseError::new(ParseErrorKind::InvalidWeekday, line, col)
                    .with_context(format!("'{item}'"))
            })
        })
        .collect()
}

/// Parses a comma-separated list of DATE or DATE-TIME values
/// (RDATE / EXDATE).
///
/// `date_valued` selects DATE parsing; DATE entries come back at midnight
/// with the UTC flag cleared.
///
/// ## Errors
/// Returns an error if any entry is malformed or is a PERIOD.
pub fn parse_datetime_list(
    value: &str,
    date_valued: bool,
    line: usize,
    col: usize,
) -> ParseResult<Vec<(NaiveDateTime, bool)>> {
    value
        .split(',')
        .filter(|item| !item.trim().is_empty())
        .map(|item| {
            let item = item.trim();
            if item.contains('/') {
                return Err(ParseError::new(ParseErrorKind::UnsupportedValue, line, col)
                    .with_context("PERIOD values are not supported"));
            }
            if date_valued {
                Ok((parse_date(item, line, col)?.and_time(NaiveTime::MIN), false))
            } else {
                parse_datetime(item, line, col)
            }
        })
        .collect()
}
