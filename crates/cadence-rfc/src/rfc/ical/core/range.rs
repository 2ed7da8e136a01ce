//! Date ranges: exclusion spans and inclusion windows.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

use super::AnchorPoint;
use crate::error::ValidationError;
use crate::rfc::ical::expand::localize;

/// What a range contributes to a combined set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeKind {
    /// A validity window a rule is evaluated within.
    Window,
    /// Every day of the range is removed from the combined stream.
    Exclusion,
}

/// A span of local date-times in one timezone.
///
/// Exclusion ranges adopt the time-of-day of the anchor that owns them and
/// expand at daily granularity, whatever the frequency of the rule they
/// exclude from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
    timezone: Tz,
    kind: RangeKind,
}

impl DateRange {
    /// ## Summary
    /// Creates a range from explicit local bounds.
    ///
    /// ## Errors
    /// Returns `EmptyRange` unless `start < end`.
    pub fn new(
        start: NaiveDateTime,
        end: NaiveDateTime,
        timezone: Tz,
        kind: RangeKind,
    ) -> Result<Self, ValidationError> {
        if start >= end {
            return Err(ValidationError::EmptyRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self {
            start,
            end,
            timezone,
            kind,
        })
    }

    /// ## Summary
    /// Creates an exclusion range owned by `anchor`, taking its time-of-day
    /// and timezone.
    ///
    /// ## Errors
    /// Returns `EmptyRange` unless `start < end`.
    pub fn exclusion(
        start: NaiveDate,
        end: NaiveDate,
        anchor: &AnchorPoint,
    ) -> Result<Self, ValidationError> {
        let time = anchor.start_local().time();
        Self::new(
            start.and_time(time),
            end.and_time(time),
            anchor.timezone(),
            RangeKind::Exclusion,
        )
    }

    /// ## Summary
    /// Creates an inclusion window.
    ///
    /// ## Errors
    /// Returns `EmptyRange` unless `start < end`.
    pub fn window(
        start: NaiveDateTime,
        end: NaiveDateTime,
        timezone: Tz,
    ) -> Result<Self, ValidationError> {
        Self::new(start, end, timezone, RangeKind::Window)
    }

    /// ## Summary
    /// Re-derives the time-of-day and timezone of both bounds from `anchor`.
    /// Call whenever the owning anchor's start changes.
    ///
    /// ## Errors
    /// Returns `EmptyRange` if both bounds fall on the same day, in which case
    /// the range is left unchanged.
    pub fn sync_time_component(&mut self, anchor: &AnchorPoint) -> Result<(), ValidationError> {
        let synced = Self::new(
            self.start.date().and_time(anchor.start_local().time()),
            self.end.date().and_time(anchor.start_local().time()),
            anchor.timezone(),
            self.kind,
        )?;
        *self = synced;
        Ok(())
    }

    /// One instant per calendar day from start to end inclusive, each at the
    /// range's time-of-day.
    #[must_use]
    pub fn all_dates(&self) -> Vec<DateTime<Utc>> {
        let time = self.start.time();
        self.start
            .date()
            .iter_days()
            .take_while(|day| *day <= self.end.date())
            .map(|day| localize(day.and_time(time), self.timezone))
            .collect()
    }

    #[must_use]
    pub const fn start_local(&self) -> NaiveDateTime {
        self.start
    }

    #[must_use]
    pub const fn end_local(&self) -> NaiveDateTime {
        self.end
    }

    #[must_use]
    pub const fn timezone(&self) -> Tz {
        self.timezone
    }

    #[must_use]
    pub const fn kind(&self) -> RangeKind {
        self.kind
    }

    #[must_use]
    pub fn is_exclusion(&self) -> bool {
        self.kind == RangeKind::Exclusion
    }

    #[must_use]
    pub fn start(&self) -> DateTime<Utc> {
        localize(self.start, self.timezone)
    }

    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        localize(self.end, self.timezone)
    }
}
