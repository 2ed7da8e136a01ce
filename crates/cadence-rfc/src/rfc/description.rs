//! Structured rule-set descriptions.
//!
//! Collaborators hand rule sets over as camelCase JSON and read them back in
//! the same shape. A description is validated when it is built into a
//! [`CombinedSet`]; nothing is coerced on the way.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{RfcResult, ValidationError};
use crate::rfc::ical::core::{
    AnchorPoint, ByConstraint, DateRange, EntrySource, Frequency, RuleSetEntry, RuleSpec,
    Weekday, WeekdayNum,
};
use crate::rfc::ical::expand::{self, CombinedSet, Exclusion, TimeZoneResolver, localize};

/// A point in time as written by a collaborator.
///
/// RFC 3339 strings with an offset are absolute. Date-times and dates without
/// one are wall-clock values of whatever timezone the surrounding description
/// is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Zoned(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
    Date(NaiveDate),
}

impl Timestamp {
    #[must_use]
    pub fn from_instant(instant: DateTime<Utc>) -> Self {
        Self::Zoned(instant.fixed_offset())
    }

    /// Wall-clock value in `timezone`. Dates read as local midnight.
    #[must_use]
    pub fn local_in(self, timezone: Tz) -> NaiveDateTime {
        match self {
            Self::Zoned(instant) => instant.with_timezone(&timezone).naive_local(),
            Self::Naive(local) => local,
            Self::Date(date) => date.and_time(NaiveTime::MIN),
        }
    }

    #[must_use]
    pub fn instant_in(self, timezone: Tz) -> DateTime<Utc> {
        match self {
            Self::Zoned(instant) => instant.to_utc(),
            Self::Naive(_) | Self::Date(_) => localize(self.local_in(timezone), timezone),
        }
    }

    #[must_use]
    pub fn date_in(self, timezone: Tz) -> NaiveDate {
        self.local_in(timezone).date()
    }
}

const fn default_interval() -> u32 {
    1
}

#[expect(
    clippy::trivially_copy_pass_by_ref,
    reason = "serde skip_serializing_if passes a reference"
)]
const fn is_false(value: &bool) -> bool {
    !*value
}

/// A recurrence rule with its own timezone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDescription {
    pub frequency: Frequency,
    #[serde(default = "default_interval")]
    pub interval: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_start: Option<Weekday>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub by_set_pos: Vec<i16>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub by_month: Vec<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub by_month_day: Vec<i8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub by_year_day: Vec<i16>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub by_week_no: Vec<i8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub by_weekday: Vec<WeekdayNum>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub by_hour: Vec<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub by_minute: Vec<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub by_second: Vec<u8>,
    /// IANA (or Windows) zone name; the enclosing zone applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl RuleDescription {
    /// ## Summary
    /// Validates the description into a rule and the zone it is written in.
    /// A floating `until` is read as wall-clock time in that zone.
    ///
    /// ## Errors
    /// Returns a timezone error for an unknown zone name, or the validation
    /// error of the first invalid field.
    pub fn to_rule(
        &self,
        resolver: &mut TimeZoneResolver,
        fallback: Tz,
    ) -> RfcResult<(RuleSpec, Tz)> {
        let timezone = resolve_timezone(self.timezone.as_deref(), resolver, fallback)?;

        let mut builder = RuleSpec::builder(self.frequency).with_interval(self.interval);
        if let Some(week_start) = self.week_start {
            builder = builder.with_week_start(week_start);
        }
        if let Some(count) = self.count {
            builder = builder.with_count(count);
        }
        if let Some(until) = self.until {
            builder = builder.with_until(until.instant_in(timezone));
        }
        for constraint in self.constraints() {
            builder = builder.with_constraint(constraint);
        }

        Ok((builder.build()?, timezone))
    }

    /// Describes `rule` as written in `timezone`.
    #[must_use]
    pub fn from_rule(rule: &RuleSpec, timezone: Tz) -> Self {
        let by = rule.by();
        Self {
            frequency: rule.frequency(),
            interval: rule.interval(),
            week_start: rule.week_start(),
            count: rule.count(),
            until: rule.until().map(Timestamp::from_instant),
            by_set_pos: by.set_pos.clone(),
            by_month: by.month.clone(),
            by_month_day: by.month_day.clone(),
            by_year_day: by.year_day.clone(),
            by_week_no: by.week_no.clone(),
            by_weekday: by.weekday.clone(),
            by_hour: by.hour.clone(),
            by_minute: by.minute.clone(),
            by_second: by.second.clone(),
            timezone: Some(timezone.name().to_string()),
        }
    }

    fn constraints(&self) -> Vec<ByConstraint> {
        let mut constraints = Vec::new();
        if !self.by_set_pos.is_empty() {
            constraints.push(ByConstraint::SetPos(self.by_set_pos.clone()));
        }
        if !self.by_month.is_empty() {
            constraints.push(ByConstraint::Month(self.by_month.clone()));
        }
        if !self.by_month_day.is_empty() {
            constraints.push(ByConstraint::MonthDay(self.by_month_day.clone()));
        }
        if !self.by_year_day.is_empty() {
            constraints.push(ByConstraint::YearDay(self.by_year_day.clone()));
        }
        if !self.by_week_no.is_empty() {
            constraints.push(ByConstraint::WeekNo(self.by_week_no.clone()));
        }
        if !self.by_weekday.is_empty() {
            constraints.push(ByConstraint::Weekday(self.by_weekday.clone()));
        }
        if !self.by_hour.is_empty() {
            constraints.push(ByConstraint::Hour(self.by_hour.clone()));
        }
        if !self.by_minute.is_empty() {
            constraints.push(ByConstraint::Minute(self.by_minute.clone()));
        }
        if !self.by_second.is_empty() {
            constraints.push(ByConstraint::Second(self.by_second.clone()));
        }
        constraints
    }
}

/// A window a rule is evaluated in, or a span of days it excludes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeDescription {
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    #[serde(default)]
    pub is_exclusion: bool,
}

/// Days removed from an event's recurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExclusionDescription {
    pub start_date: Timestamp,
    pub end_date: Timestamp,
}

/// A single-anchor event, optionally recurring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDescription {
    pub start_time: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Timestamp>,
    #[serde(default)]
    pub is_full_day: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<RuleDescription>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclusions: Vec<ExclusionDescription>,
    /// The rule subtracts from the set instead of adding to it.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_exclusion: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl EventDescription {
    /// ## Summary
    /// Validates the event into an anchored entry. The anchor zone is the
    /// event's own, else its rule's, else `fallback`.
    ///
    /// ## Errors
    /// - `MissingEndTime` for a timed event without an end
    /// - `EndNotAfterStart` unless the end is strictly after the start
    /// - `UnexpectedEndTime` for a full-day event with one
    /// - `MissingRule` for an exclusion event without a rule
    /// - any rule, range or timezone error
    pub fn to_entry(
        &self,
        resolver: &mut TimeZoneResolver,
        fallback: Tz,
    ) -> RfcResult<RuleSetEntry> {
        let zone_name = self
            .timezone
            .as_deref()
            .or_else(|| self.rule.as_ref().and_then(|r| r.timezone.as_deref()));
        let timezone = resolve_timezone(zone_name, resolver, fallback)?;

        let anchor = if self.is_full_day {
            if self.end_time.is_some() {
                return Err(ValidationError::UnexpectedEndTime.into());
            }
            AnchorPoint::full_day(self.start_time.date_in(timezone), timezone)
        } else {
            let start = self.start_time.local_in(timezone);
            let anchor = AnchorPoint::new(start, timezone);
            let end = self.end_time.ok_or(ValidationError::MissingEndTime)?;
            anchor.with_end(end.local_in(timezone))?
        };

        let rule = self
            .rule
            .as_ref()
            .map(|rule| rule.to_rule(resolver, timezone).map(|(spec, _)| spec))
            .transpose()?;

        let mut entry = if self.is_exclusion {
            let rule = rule.ok_or(ValidationError::MissingRule("an exclusion event"))?;
            RuleSetEntry::exclusion_rule(anchor, rule)
        } else {
            RuleSetEntry::event(anchor, rule)
        };
        for exclusion in &self.exclusions {
            entry = entry.with_exclusion(
                exclusion.start_date.date_in(timezone),
                exclusion.end_date.date_in(timezone),
            )?;
        }
        Ok(entry)
    }

    fn from_anchored(
        anchor: &AnchorPoint,
        exclusions: &[DateRange],
        rule: Option<&RuleSpec>,
        is_exclusion: bool,
    ) -> Self {
        let timezone = anchor.timezone();
        let start_time = if anchor.is_full_day() {
            Timestamp::Date(anchor.start_local().date())
        } else {
            Timestamp::Naive(anchor.start_local())
        };
        // A decoded VEVENT without DTEND stays without one
        let end_time = anchor.end_local().map(Timestamp::Naive);
        Self {
            start_time,
            end_time,
            is_full_day: anchor.is_full_day(),
            rule: rule.map(|r| RuleDescription::from_rule(r, timezone)),
            exclusions: exclusions
                .iter()
                .map(|range| ExclusionDescription {
                    start_date: Timestamp::Date(range.start_local().date()),
                    end_date: Timestamp::Date(range.end_local().date()),
                })
                .collect(),
            is_exclusion,
            timezone: Some(timezone.name().to_string()),
        }
    }
}

/// A rule evaluated inside its own date ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleEntryDescription {
    pub rule: RuleDescription,
    #[serde(default)]
    pub is_exclusion: bool,
    #[serde(default)]
    pub date_ranges: Vec<DateRangeDescription>,
}

impl RuleEntryDescription {
    /// ## Summary
    /// Validates the rule and its ranges into a multi-range entry. Range
    /// bounds are read in the rule's zone.
    ///
    /// ## Errors
    /// Returns `MissingInclusionRange` without at least one window range, or
    /// any rule, range or timezone error.
    pub fn to_entry(
        &self,
        resolver: &mut TimeZoneResolver,
        fallback: Tz,
    ) -> RfcResult<RuleSetEntry> {
        let (rule, timezone) = self.rule.to_rule(resolver, fallback)?;

        let windows = self
            .date_ranges
            .iter()
            .filter(|range| !range.is_exclusion)
            .map(|range| {
                DateRange::window(
                    range.start_date.local_in(timezone),
                    range.end_date.local_in(timezone),
                    timezone,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut entry = RuleSetEntry::ranged(rule, windows, self.is_exclusion)?;
        for range in self.date_ranges.iter().filter(|range| range.is_exclusion) {
            entry = entry.with_exclusion(
                range.start_date.date_in(timezone),
                range.end_date.date_in(timezone),
            )?;
        }
        Ok(entry)
    }

    fn from_ranged(rule: &RuleSpec, ranges: &[DateRange], is_exclusion: bool) -> Self {
        let timezone = ranges.first().map_or(Tz::UTC, DateRange::timezone);
        Self {
            rule: RuleDescription::from_rule(rule, timezone),
            is_exclusion,
            date_ranges: ranges
                .iter()
                .map(|range| DateRangeDescription {
                    start_date: Timestamp::Naive(range.start_local()),
                    end_date: Timestamp::Naive(range.end_local()),
                    is_exclusion: range.is_exclusion(),
                })
                .collect(),
        }
    }
}

/// Everything that defines one combined occurrence stream.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSetDescription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default)]
    pub events: Vec<EventDescription>,
    #[serde(default)]
    pub rules: Vec<RuleEntryDescription>,
    #[serde(default)]
    pub include_dates: Vec<Timestamp>,
    #[serde(default)]
    pub exclude_dates: Vec<Timestamp>,
}

impl RuleSetDescription {
    /// ## Summary
    /// Reads a description from JSON text.
    ///
    /// ## Errors
    /// Returns `RfcError::Json` if the text is not a well-formed description.
    pub fn from_json(text: &str) -> RfcResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// ## Summary
    /// Writes the description as pretty-printed JSON.
    ///
    /// ## Errors
    /// Returns `RfcError::Json` if serialization fails.
    pub fn to_json(&self) -> RfcResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// ## Summary
    /// Validates every part and builds the combined set. Floating values
    /// are read in the set's zone, or `default_timezone` when it names none.
    ///
    /// ## Errors
    /// Returns the first validation or timezone error; nothing is built in
    /// that case.
    #[tracing::instrument(
        skip(self, resolver),
        fields(events = self.events.len(), rules = self.rules.len())
    )]
    pub fn build(
        &self,
        resolver: &mut TimeZoneResolver,
        default_timezone: Tz,
    ) -> RfcResult<CombinedSet> {
        let timezone = resolve_timezone(self.timezone.as_deref(), resolver, default_timezone)?;

        let mut entries = Vec::with_capacity(self.events.len() + self.rules.len());
        for event in &self.events {
            entries.push(event.to_entry(resolver, timezone)?);
        }
        for rule in &self.rules {
            entries.push(rule.to_entry(resolver, timezone)?);
        }

        let include_dates = self
            .include_dates
            .iter()
            .map(|t| t.instant_in(timezone))
            .collect();
        let exclusions = self
            .exclude_dates
            .iter()
            .map(|t| Exclusion::Instant(t.instant_in(timezone)))
            .collect();

        Ok(expand::build(timezone, entries, include_dates, exclusions))
    }

    /// Describes `set`. Set-level exclusion ranges are flattened to the
    /// instants they remove.
    #[must_use]
    pub fn from_set(set: &CombinedSet) -> Self {
        let mut description = Self {
            timezone: Some(set.timezone().name().to_string()),
            include_dates: set
                .include_dates()
                .iter()
                .copied()
                .map(Timestamp::from_instant)
                .collect(),
            exclude_dates: set
                .exclusions()
                .iter()
                .flat_map(Exclusion::instants)
                .map(Timestamp::from_instant)
                .collect(),
            ..Self::default()
        };

        for entry in set.entries() {
            match (entry.source(), entry.rule()) {
                (EntrySource::Anchored { anchor, exclusions }, rule) => {
                    description.events.push(EventDescription::from_anchored(
                        anchor,
                        exclusions,
                        rule,
                        entry.is_exclusion(),
                    ));
                }
                (EntrySource::Ranged { ranges }, Some(rule)) => {
                    description.rules.push(RuleEntryDescription::from_ranged(
                        rule,
                        ranges,
                        entry.is_exclusion(),
                    ));
                }
                (EntrySource::Ranged { .. }, None) => {
                    tracing::warn!("Skipping ranged entry without a rule");
                }
            }
        }

        description
    }
}

fn resolve_timezone(
    name: Option<&str>,
    resolver: &mut TimeZoneResolver,
    fallback: Tz,
) -> RfcResult<Tz> {
    match name {
        Some(name) => Ok(resolver.resolve(name)?),
        None => Ok(fallback),
    }
}
