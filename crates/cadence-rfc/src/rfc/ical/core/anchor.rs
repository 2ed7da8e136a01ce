//! Anchor points: the local start (and optional end) a rule is evaluated from.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use chrono_tz::Tz;

use crate::error::ValidationError;
use crate::rfc::ical::expand::localize;

/// A timezone-aware start with an optional end.
///
/// The start is kept as local wall-clock time in `timezone`, never as a
/// cached offset, so every evaluation re-derives the UTC offset that is in
/// effect on the day of each occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorPoint {
    start: NaiveDateTime,
    end: Option<NaiveDateTime>,
    timezone: Tz,
    full_day: bool,
}

impl AnchorPoint {
    /// Creates an anchor from a local wall-clock start.
    #[must_use]
    pub const fn new(start: NaiveDateTime, timezone: Tz) -> Self {
        Self {
            start,
            end: None,
            timezone,
            full_day: false,
        }
    }

    /// Creates an anchor from an absolute instant, keeping the wall-clock
    /// time it has in `timezone`.
    #[must_use]
    pub fn from_instant(start: DateTime<Utc>, timezone: Tz) -> Self {
        Self::new(start.with_timezone(&timezone).naive_local(), timezone)
    }

    /// Creates a full-day anchor starting at local midnight.
    #[must_use]
    pub fn full_day(date: NaiveDate, timezone: Tz) -> Self {
        Self {
            start: date.and_time(NaiveTime::MIN),
            end: None,
            timezone,
            full_day: true,
        }
    }

    /// ## Summary
    /// Sets the local end of the anchor.
    ///
    /// ## Errors
    /// Returns an error for full-day anchors, or if `end` is not after the start.
    pub fn with_end(mut self, end: NaiveDateTime) -> Result<Self, ValidationError> {
        if self.full_day {
            return Err(ValidationError::UnexpectedEndTime);
        }
        if end <= self.start {
            return Err(ValidationError::EndNotAfterStart {
                start: self.start.to_string(),
                end: end.to_string(),
            });
        }
        self.end = Some(end);
        Ok(self)
    }

    /// ## Summary
    /// Sets the end from an absolute instant.
    ///
    /// ## Errors
    /// Same as [`AnchorPoint::with_end`].
    pub fn with_end_instant(self, end: DateTime<Utc>) -> Result<Self, ValidationError> {
        let local = end.with_timezone(&self.timezone).naive_local();
        self.with_end(local)
    }

    /// ## Summary
    /// Moves the start, keeping the event duration.
    ///
    /// ## Errors
    /// Returns an error if the shifted end cannot be represented.
    pub fn with_start(mut self, start: NaiveDateTime) -> Result<Self, ValidationError> {
        if let Some(duration) = self.duration() {
            let end = start
                .checked_add_signed(duration)
                .ok_or_else(|| ValidationError::InvalidInstant(start.to_string()))?;
            self.end = Some(end);
        }
        self.start = if self.full_day {
            start.date().and_time(NaiveTime::MIN)
        } else {
            start
        };
        Ok(self)
    }

    #[must_use]
    pub const fn start_local(&self) -> NaiveDateTime {
        self.start
    }

    #[must_use]
    pub const fn end_local(&self) -> Option<NaiveDateTime> {
        self.end
    }

    #[must_use]
    pub const fn timezone(&self) -> Tz {
        self.timezone
    }

    #[must_use]
    pub const fn is_full_day(&self) -> bool {
        self.full_day
    }

    /// Absolute start instant.
    #[must_use]
    pub fn start(&self) -> DateTime<Utc> {
        localize(self.start, self.timezone)
    }

    /// Absolute end instant, if the anchor has one.
    #[must_use]
    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.end.map(|end| localize(end, self.timezone))
    }

    /// Wall-clock length of the event.
    #[must_use]
    pub fn duration(&self) -> Option<TimeDelta> {
        self.end.map(|end| end - self.start)
    }
}
