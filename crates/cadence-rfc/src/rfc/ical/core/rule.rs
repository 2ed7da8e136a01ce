//! Recurrence rule value type (RFC 5545 §3.3.10, §3.8.5.3).

use std::fmt;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// Recurrence frequency (RFC 5545 §3.3.10).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Frequency {
    Secondly,
    Minutely,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Secondly => "SECONDLY",
            Self::Minutely => "MINUTELY",
            Self::Hourly => "HOURLY",
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }

    /// Parses a frequency from a string (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "SECONDLY" => Self::Secondly,
            "MINUTELY" => Self::Minutely,
            "HOURLY" => Self::Hourly,
            "DAILY" => Self::Daily,
            "WEEKLY" => Self::Weekly,
            "MONTHLY" => Self::Monthly,
            "YEARLY" => Self::Yearly,
            _ => return None,
        })
    }

    /// Returns whether periods of this frequency span at least one whole day.
    #[must_use]
    pub const fn is_date_based(self) -> bool {
        matches!(
            self,
            Self::Daily | Self::Weekly | Self::Monthly | Self::Yearly
        )
    }
}

impl<'de> Deserialize<'de> for Frequency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Self::parse(&name)
            .ok_or_else(|| serde::de::Error::custom(ValidationError::UnknownFrequency(name)))
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Day of the week.
///
/// Symbols (`MO`..`SU`) are the external representation; the dense index
/// (Monday = 0) is only used for week arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// All weekdays, Monday first.
    pub const ALL: [Self; 7] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
        Self::Sunday,
    ];

    /// Returns the two-letter abbreviation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "MO",
            Self::Tuesday => "TU",
            Self::Wednesday => "WE",
            Self::Thursday => "TH",
            Self::Friday => "FR",
            Self::Saturday => "SA",
            Self::Sunday => "SU",
        }
    }

    /// Parses a weekday from a two-letter abbreviation (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "MO" => Self::Monday,
            "TU" => Self::Tuesday,
            "WE" => Self::Wednesday,
            "TH" => Self::Thursday,
            "FR" => Self::Friday,
            "SA" => Self::Saturday,
            "SU" => Self::Sunday,
            _ => return None,
        })
    }

    /// Dense index with Monday = 0 and Sunday = 6.
    #[must_use]
    pub const fn index(self) -> u32 {
        self as u32
    }

    #[must_use]
    pub const fn from_chrono(weekday: chrono::Weekday) -> Self {
        match weekday {
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
            chrono::Weekday::Sun => Self::Sunday,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Weekday {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Weekday {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let symbol = String::deserialize(deserializer)?;
        Self::parse(&symbol)
            .ok_or_else(|| serde::de::Error::custom(ValidationError::UnknownWeekday(symbol)))
    }
}

/// Weekday with optional occurrence number.
///
/// Used in BYDAY rule part. Examples:
/// - `MO` - every Monday
/// - `1MO` - first Monday of the month/year
/// - `-1FR` - last Friday of the month/year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WeekdayNum {
    /// Optional occurrence number (-53 to 53, excluding 0).
    pub ordinal: Option<i8>,
    /// The day of the week.
    pub weekday: Weekday,
}

impl WeekdayNum {
    /// Creates a weekday occurrence without an ordinal.
    #[must_use]
    pub const fn every(weekday: Weekday) -> Self {
        Self {
            ordinal: None,
            weekday,
        }
    }

    /// Creates a weekday occurrence with an ordinal.
    ///
    /// ## Errors
    /// Returns an error if ordinal is 0 or outside the range -53..=53.
    pub fn nth(ordinal: i8, weekday: Weekday) -> Result<Self, ValidationError> {
        if ordinal == 0 || !(-53..=53).contains(&ordinal) {
            return Err(ValidationError::ConstraintOutOfRange {
                constraint: "BYDAY",
                value: i32::from(ordinal),
            });
        }
        Ok(Self {
            ordinal: Some(ordinal),
            weekday,
        })
    }

    /// Parses `MO`, `1MO` or `-1FR`.
    ///
    /// ## Errors
    /// Returns an error if the weekday symbol or the ordinal is invalid.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();
        let split = s.len().saturating_sub(2);
        let (ordinal_str, weekday_str) = (
            s.get(..split).unwrap_or_default(),
            s.get(split..).unwrap_or_default(),
        );

        let weekday = Weekday::parse(weekday_str)
            .ok_or_else(|| ValidationError::UnknownWeekday(s.to_string()))?;

        if ordinal_str.is_empty() {
            return Ok(Self::every(weekday));
        }

        let ordinal = ordinal_str
            .trim_start_matches('+')
            .parse::<i8>()
            .map_err(|_err| ValidationError::UnknownWeekday(s.to_string()))?;
        Self::nth(ordinal, weekday)
    }
}

impl fmt::Display for WeekdayNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(n) = self.ordinal {
            write!(f, "{n}")?;
        }
        write!(f, "{}", self.weekday)
    }
}

impl Serialize for WeekdayNum {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WeekdayNum {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let symbol = String::deserialize(deserializer)?;
        Self::parse(&symbol).map_err(serde::de::Error::custom)
    }
}

/// One typed by-constraint.
///
/// Every variant carries values of its own bounded range; `validate` rejects
/// anything outside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ByConstraint {
    SetPos(Vec<i16>),
    Month(Vec<u8>),
    MonthDay(Vec<i8>),
    YearDay(Vec<i16>),
    WeekNo(Vec<i8>),
    Weekday(Vec<WeekdayNum>),
    Hour(Vec<u8>),
    Minute(Vec<u8>),
    Second(Vec<u8>),
}

impl ByConstraint {
    /// Returns the RRULE part name of this constraint.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SetPos(_) => "BYSETPOS",
            Self::Month(_) => "BYMONTH",
            Self::MonthDay(_) => "BYMONTHDAY",
            Self::YearDay(_) => "BYYEARDAY",
            Self::WeekNo(_) => "BYWEEKNO",
            Self::Weekday(_) => "BYDAY",
            Self::Hour(_) => "BYHOUR",
            Self::Minute(_) => "BYMINUTE",
            Self::Second(_) => "BYSECOND",
        }
    }

    /// ## Summary
    /// Checks that this constraint may be combined with `frequency`.
    ///
    /// ## Errors
    /// Returns `ConstraintNotAllowed` for BYYEARDAY with DAILY, WEEKLY or
    /// MONTHLY rules, BYMONTHDAY with WEEKLY rules, and BYWEEKNO with
    /// anything but YEARLY rules.
    pub fn check_frequency(&self, frequency: Frequency) -> Result<(), ValidationError> {
        let allowed = match self {
            Self::YearDay(_) => !matches!(
                frequency,
                Frequency::Daily | Frequency::Weekly | Frequency::Monthly
            ),
            Self::MonthDay(_) => frequency != Frequency::Weekly,
            Self::WeekNo(_) => frequency == Frequency::Yearly,
            _ => true,
        };
        if allowed {
            Ok(())
        } else {
            Err(ValidationError::ConstraintNotAllowed {
                constraint: self.name(),
                frequency: frequency.as_str(),
            })
        }
    }

    /// ## Summary
    /// Checks every value against the range allowed for this constraint.
    ///
    /// ## Errors
    /// Returns `ConstraintOutOfRange` naming the first offending value.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let name = self.name();
        match self {
            Self::SetPos(values) | Self::YearDay(values) => check_signed(name, values, 366),
            Self::MonthDay(values) => check_signed(name, values, 31),
            Self::WeekNo(values) => check_signed(name, values, 53),
            Self::Month(values) => check_unsigned(name, values, 1, 12),
            Self::Hour(values) => check_unsigned(name, values, 0, 23),
            Self::Minute(values) | Self::Second(values) => check_unsigned(name, values, 0, 59),
            Self::Weekday(values) => {
                for value in values {
                    if let Some(n) = value.ordinal {
                        check_signed(name, &[n], 53)?;
                    }
                }
                Ok(())
            }
        }
    }
}

fn check_signed<T>(name: &'static str, values: &[T], max: i32) -> Result<(), ValidationError>
where
    T: Copy + Into<i32>,
{
    for value in values {
        let value: i32 = (*value).into();
        if value == 0 || value.abs() > max {
            return Err(ValidationError::ConstraintOutOfRange {
                constraint: name,
                value,
            });
        }
    }
    Ok(())
}

fn check_unsigned(
    name: &'static str,
    values: &[u8],
    min: u8,
    max: u8,
) -> Result<(), ValidationError> {
    for value in values {
        if !(min..=max).contains(value) {
            return Err(ValidationError::ConstraintOutOfRange {
                constraint: name,
                value: i32::from(*value),
            });
        }
    }
    Ok(())
}

/// Normalized by-constraints of a rule. Empty lists mean "not constrained".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ByRules {
    pub set_pos: Vec<i16>,
    pub month: Vec<u8>,
    pub month_day: Vec<i8>,
    pub year_day: Vec<i16>,
    pub week_no: Vec<i8>,
    pub weekday: Vec<WeekdayNum>,
    pub hour: Vec<u8>,
    pub minute: Vec<u8>,
    pub second: Vec<u8>,
}

impl ByRules {
    fn apply(&mut self, constraint: ByConstraint) {
        match constraint {
            ByConstraint::SetPos(v) => self.set_pos = sorted(v),
            ByConstraint::Month(v) => self.month = sorted(v),
            ByConstraint::MonthDay(v) => self.month_day = sorted(v),
            ByConstraint::YearDay(v) => self.year_day = sorted(v),
            ByConstraint::WeekNo(v) => self.week_no = sorted(v),
            ByConstraint::Weekday(v) => self.weekday = sorted(v),
            ByConstraint::Hour(v) => self.hour = sorted(v),
            ByConstraint::Minute(v) => self.minute = sorted(v),
            ByConstraint::Second(v) => self.second = sorted(v),
        }
    }

    /// Returns the constraints that are set, in RRULE output order.
    #[must_use]
    pub fn constraints(&self) -> Vec<ByConstraint> {
        let all = [
            ByConstraint::Second(self.second.clone()),
            ByConstraint::Minute(self.minute.clone()),
            ByConstraint::Hour(self.hour.clone()),
            ByConstraint::Weekday(self.weekday.clone()),
            ByConstraint::MonthDay(self.month_day.clone()),
            ByConstraint::YearDay(self.year_day.clone()),
            ByConstraint::WeekNo(self.week_no.clone()),
            ByConstraint::Month(self.month.clone()),
            ByConstraint::SetPos(self.set_pos.clone()),
        ];
        all.into_iter().filter(|c| !is_empty(c)).collect()
    }

    /// Returns whether any time-of-day constraint is set.
    #[must_use]
    pub fn has_time_constraints(&self) -> bool {
        !(self.hour.is_empty() && self.minute.is_empty() && self.second.is_empty())
    }
}

fn sorted<T: Ord>(mut values: Vec<T>) -> Vec<T> {
    values.sort_unstable();
    values.dedup();
    values
}

fn is_empty(constraint: &ByConstraint) -> bool {
    match constraint {
        ByConstraint::SetPos(v) | ByConstraint::YearDay(v) => v.is_empty(),
        ByConstraint::MonthDay(v) | ByConstraint::WeekNo(v) => v.is_empty(),
        ByConstraint::Month(v)
        | ByConstraint::Hour(v)
        | ByConstraint::Minute(v)
        | ByConstraint::Second(v) => v.is_empty(),
        ByConstraint::Weekday(v) => v.is_empty(),
    }
}

fn join<T: fmt::Display>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// How a rule ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Unbounded.
    Never,
    /// Stop after this many emitted occurrences.
    Count(u32),
    /// Stop after this instant (inclusive).
    Until(DateTime<Utc>),
}

/// How `UNTIL` is written when a rule is rendered as RRULE text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UntilFormat {
    /// `YYYYMMDDTHHMMSSZ`.
    Utc,
    /// `YYYYMMDD`, the local date of the bound in the given timezone.
    Date(Tz),
}

/// Recurrence rule (RFC 5545 §3.3.10).
///
/// Immutable once built; construct through [`RuleSpec::builder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSpec {
    frequency: Frequency,
    interval: u32,
    week_start: Option<Weekday>,
    termination: Termination,
    by: ByRules,
}

impl RuleSpec {
    /// Starts building a rule of the given frequency.
    #[must_use]
    pub fn builder(frequency: Frequency) -> RuleSpecBuilder {
        RuleSpecBuilder::new(frequency)
    }

    #[must_use]
    pub const fn frequency(&self) -> Frequency {
        self.frequency
    }

    #[must_use]
    pub const fn interval(&self) -> u32 {
        self.interval
    }

    #[must_use]
    pub const fn week_start(&self) -> Option<Weekday> {
        self.week_start
    }

    /// Week start in effect for week-number arithmetic (Monday by default).
    #[must_use]
    pub fn effective_week_start(&self) -> Weekday {
        self.week_start.unwrap_or(Weekday::Monday)
    }

    #[must_use]
    pub const fn termination(&self) -> Termination {
        self.termination
    }

    #[must_use]
    pub const fn by(&self) -> &ByRules {
        &self.by
    }

    #[must_use]
    pub const fn count(&self) -> Option<u32> {
        match self.termination {
            Termination::Count(n) => Some(n),
            _ => None,
        }
    }

    #[must_use]
    pub const fn until(&self) -> Option<DateTime<Utc>> {
        match self.termination {
            Termination::Until(until) => Some(until),
            _ => None,
        }
    }

    /// Returns whether the rule has neither a count nor an until bound.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        matches!(self.termination, Termination::Never)
    }

    /// Returns a copy of this rule that also stops after `until`. Counted
    /// rules keep their count.
    #[must_use]
    pub fn bounded_by(&self, until: DateTime<Utc>) -> Self {
        let mut rule = self.clone();
        rule.termination = match self.termination {
            Termination::Never => Termination::Until(until),
            Termination::Until(own) => Termination::Until(own.min(until)),
            Termination::Count(count) => Termination::Count(count),
        };
        rule
    }

    /// Returns a copy of this rule ending at `until`, replacing any count.
    #[must_use]
    pub fn ending_at(&self, until: DateTime<Utc>) -> Self {
        let mut rule = self.clone();
        rule.termination = Termination::Until(until);
        rule
    }

    /// Renders the rule as an RRULE value.
    #[must_use]
    pub fn to_ical_value(&self, until_format: UntilFormat) -> String {
        let mut parts = vec![format!("FREQ={}", self.frequency)];

        if self.interval != 1 {
            parts.push(format!("INTERVAL={}", self.interval));
        }

        match self.termination {
            Termination::Never => {}
            Termination::Count(count) => parts.push(format!("COUNT={count}")),
            Termination::Until(until) => {
                let value = match until_format {
                    UntilFormat::Utc => until.format("%Y%m%dT%H%M%SZ").to_string(),
                    UntilFormat::Date(tz) => {
                        until.with_timezone(&tz).date_naive().format("%Y%m%d").to_string()
                    }
                };
                parts.push(format!("UNTIL={value}"));
            }
        }

        if let Some(wkst) = self.week_start {
            parts.push(format!("WKST={wkst}"));
        }

        for constraint in self.by.constraints() {
            let values = match &constraint {
                ByConstraint::SetPos(v) | ByConstraint::YearDay(v) => join(v),
                ByConstraint::MonthDay(v) | ByConstraint::WeekNo(v) => join(v),
                ByConstraint::Month(v)
                | ByConstraint::Hour(v)
                | ByConstraint::Minute(v)
                | ByConstraint::Second(v) => join(v),
                ByConstraint::Weekday(v) => join(v),
            };
            parts.push(format!("{}={values}", constraint.name()));
        }

        parts.join(";")
    }
}

impl fmt::Display for RuleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_ical_value(UntilFormat::Utc))
    }
}

/// Builder for [`RuleSpec`]; all checks run in [`RuleSpecBuilder::build`].
#[derive(Debug, Clone)]
pub struct RuleSpecBuilder {
    frequency: Frequency,
    interval: u32,
    week_start: Option<Weekday>,
    count: Option<u32>,
    until: Option<DateTime<Utc>>,
    constraints: Vec<ByConstraint>,
}

impl RuleSpecBuilder {
    #[must_use]
    pub const fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            interval: 1,
            week_start: None,
            count: None,
            until: None,
            constraints: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_interval(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub const fn with_week_start(mut self, week_start: Weekday) -> Self {
        self.week_start = Some(week_start);
        self
    }

    #[must_use]
    pub const fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    #[must_use]
    pub const fn with_until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    /// Adds a by-constraint. A later constraint of the same kind replaces an
    /// earlier one.
    #[must_use]
    pub fn with_constraint(mut self, constraint: ByConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// ## Summary
    /// Validates the collected parts and produces the rule.
    ///
    /// ## Errors
    /// Returns a `ValidationError` if count and until are both set, the
    /// interval or count is zero, a by-constraint value is out of range, or
    /// a by-constraint is not allowed with the frequency.
    pub fn build(self) -> Result<RuleSpec, ValidationError> {
        if self.interval == 0 {
            return Err(ValidationError::ZeroInterval);
        }

        let termination = match (self.count, self.until) {
            (Some(_), Some(_)) => return Err(ValidationError::CountAndUntil),
            (Some(0), None) => return Err(ValidationError::ZeroCount),
            (Some(count), None) => Termination::Count(count),
            (None, Some(until)) => Termination::Until(until),
            (None, None) => Termination::Never,
        };

        let mut by = ByRules::default();
        for constraint in self.constraints {
            constraint.validate()?;
            constraint.check_frequency(self.frequency)?;
            by.apply(constraint);
        }

        Ok(RuleSpec {
            frequency: self.frequency,
            interval: self.interval,
            week_start: self.week_start,
            termination,
            by,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn builder_defaults() {
        let rule = RuleSpec::builder(Frequency::Daily).build().unwrap();
        assert_eq!(rule.interval(), 1);
        assert_eq!(rule.termination(), Termination::Never);
        assert!(rule.is_unbounded());
        assert_eq!(rule.effective_week_start(), Weekday::Monday);
    }

    #[test]
    fn count_and_until_conflict() {
        let err = RuleSpec::builder(Frequency::Daily)
            .with_count(3)
            .with_until(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap())
            .build()
            .unwrap_err();
        assert_eq!(err, ValidationError::CountAndUntil);
    }

    #[test]
    fn zero_interval_rejected() {
        let err = RuleSpec::builder(Frequency::Weekly)
            .with_interval(0)
            .build()
            .unwrap_err();
        assert_eq!(err, ValidationError::ZeroInterval);
    }

    #[test]
    fn out_of_range_constraints_rejected() {
        let cases = [
            ByConstraint::Month(vec![13]),
            ByConstraint::MonthDay(vec![0]),
            ByConstraint::MonthDay(vec![-32]),
            ByConstraint::YearDay(vec![367]),
            ByConstraint::WeekNo(vec![54]),
            ByConstraint::Hour(vec![24]),
            ByConstraint::Minute(vec![60]),
            ByConstraint::SetPos(vec![0]),
        ];
        for constraint in cases {
            let result = RuleSpec::builder(Frequency::Yearly)
                .with_constraint(constraint.clone())
                .build();
            assert!(
                matches!(result, Err(ValidationError::ConstraintOutOfRange { .. })),
                "{constraint:?} should be rejected"
            );
        }
    }

    #[test]
    fn constraints_forbidden_for_frequency_rejected() {
        let rejected = [
            (Frequency::Daily, ByConstraint::YearDay(vec![100])),
            (Frequency::Weekly, ByConstraint::YearDay(vec![100])),
            (Frequency::Monthly, ByConstraint::YearDay(vec![-1])),
            (Frequency::Weekly, ByConstraint::MonthDay(vec![15])),
            (Frequency::Monthly, ByConstraint::WeekNo(vec![20])),
            (Frequency::Daily, ByConstraint::WeekNo(vec![1])),
            (Frequency::Hourly, ByConstraint::WeekNo(vec![1])),
        ];
        for (frequency, constraint) in rejected {
            let err = RuleSpec::builder(frequency)
                .with_constraint(constraint.clone())
                .build()
                .unwrap_err();
            assert_eq!(
                err,
                ValidationError::ConstraintNotAllowed {
                    constraint: constraint.name(),
                    frequency: frequency.as_str(),
                },
                "{constraint:?} with {frequency}"
            );
        }

        let accepted = [
            (Frequency::Yearly, ByConstraint::YearDay(vec![100])),
            (Frequency::Hourly, ByConstraint::YearDay(vec![100])),
            (Frequency::Monthly, ByConstraint::MonthDay(vec![15])),
            (Frequency::Daily, ByConstraint::MonthDay(vec![15])),
            (Frequency::Yearly, ByConstraint::WeekNo(vec![20])),
        ];
        for (frequency, constraint) in accepted {
            assert!(
                RuleSpec::builder(frequency)
                    .with_constraint(constraint.clone())
                    .build()
                    .is_ok(),
                "{constraint:?} with {frequency}"
            );
        }
    }

    #[test]
    fn weekday_symbols_and_indices() {
        assert_eq!(Weekday::parse("mo"), Some(Weekday::Monday));
        assert_eq!(Weekday::Monday.index(), 0);
        assert_eq!(Weekday::Sunday.index(), 6);
        assert_eq!(Weekday::parse("XX"), None);
    }

    #[test]
    fn weekday_num_parse() {
        let last_friday = WeekdayNum::parse("-1FR").unwrap();
        assert_eq!(last_friday.ordinal, Some(-1));
        assert_eq!(last_friday.weekday, Weekday::Friday);
        assert_eq!(last_friday.to_string(), "-1FR");

        assert_eq!(WeekdayNum::parse("TU").unwrap(), WeekdayNum::every(Weekday::Tuesday));
        assert!(WeekdayNum::parse("0MO").is_err());
        assert!(WeekdayNum::parse("1XX").is_err());
    }

    #[test]
    fn ical_value_canonical_order() {
        let rule = RuleSpec::builder(Frequency::Monthly)
            .with_interval(2)
            .with_count(10)
            .with_week_start(Weekday::Sunday)
            .with_constraint(ByConstraint::SetPos(vec![-1]))
            .with_constraint(ByConstraint::Weekday(vec![
                WeekdayNum::every(Weekday::Friday),
                WeekdayNum::every(Weekday::Monday),
            ]))
            .build()
            .unwrap();

        assert_eq!(
            rule.to_string(),
            "FREQ=MONTHLY;INTERVAL=2;COUNT=10;WKST=SU;BYDAY=MO,FR;BYSETPOS=-1"
        );
    }

    #[test]
    fn ical_value_until_forms() {
        let until = Utc.with_ymd_and_hms(2026, 3, 2, 3, 0, 0).unwrap();
        let rule = RuleSpec::builder(Frequency::Daily)
            .with_until(until)
            .build()
            .unwrap();

        assert_eq!(rule.to_string(), "FREQ=DAILY;UNTIL=20260302T030000Z");
        assert_eq!(
            rule.to_ical_value(UntilFormat::Date(Tz::America__New_York)),
            "FREQ=DAILY;UNTIL=20260301"
        );
    }

    #[test]
    fn bounded_by_takes_the_earlier_end() {
        let end = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        let open = RuleSpec::builder(Frequency::Daily).build().unwrap();
        assert_eq!(open.bounded_by(end).until(), Some(end));

        let earlier = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap();
        let until = RuleSpec::builder(Frequency::Daily)
            .with_until(earlier)
            .build()
            .unwrap();
        assert_eq!(until.bounded_by(end).until(), Some(earlier));

        let counted = RuleSpec::builder(Frequency::Daily)
            .with_count(2)
            .build()
            .unwrap();
        assert_eq!(counted.bounded_by(end).count(), Some(2));
        assert_eq!(counted.ending_at(end).until(), Some(end));
        assert_eq!(counted.ending_at(end).count(), None);
    }

    #[test]
    fn frequency_serde_uses_symbols() {
        let json = serde_json::to_string(&Frequency::Weekly).unwrap();
        assert_eq!(json, "\"WEEKLY\"");
        let parsed: Weekday = serde_json::from_str("\"TH\"").unwrap();
        assert_eq!(parsed, Weekday::Thursday);
    }
}
