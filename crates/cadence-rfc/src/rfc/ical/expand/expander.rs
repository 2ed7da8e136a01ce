//! Lazy recurrence rule evaluation (RFC 5545 §3.3.10).
//!
//! A rule is evaluated period by period (a year, month, week, day, hour,
//! minute or second, stepped by the interval). Each period is expanded into
//! its candidate local date-times, narrowed by BYSETPOS, then localized in
//! the anchor's timezone. Offsets are derived per candidate, so wall-clock
//! times survive DST transitions.

use std::collections::{BTreeSet, VecDeque};

use chrono::{
    DateTime, Datelike, Days, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike,
    Utc,
};
use chrono_tz::Tz;

use super::localize;
use crate::rfc::ical::core::{AnchorPoint, Frequency, RuleSpec, Weekday};

/// Periods past this year are never generated.
const MAX_YEAR: i32 = 9999;

/// Why an evaluator stopped producing instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The rule itself ended (count, until or the year limit).
    Exhausted,
    /// The caller's window ended; the rule may continue past it.
    Window,
}

/// Filters and expansion lists derived from a rule and its start.
///
/// Empty lists mean "unconstrained".
#[derive(Debug, Clone)]
struct Plan {
    months: Vec<u32>,
    month_days: Vec<i32>,
    year_days: Vec<i32>,
    week_nos: Vec<i32>,
    weekdays: Vec<Weekday>,
    nth_weekdays: Vec<(i32, Weekday)>,
    hours: Vec<u32>,
    minutes: Vec<u32>,
    seconds: Vec<u32>,
    set_pos: Vec<i32>,
    week_start: Weekday,
}

impl Plan {
    fn new(rule: &RuleSpec, dtstart: NaiveDateTime) -> Self {
        let by = rule.by();
        let frequency = rule.frequency();

        let mut plan = Self {
            months: by.month.iter().copied().map(u32::from).collect(),
            month_days: by.month_day.iter().copied().map(i32::from).collect(),
            year_days: by.year_day.iter().copied().map(i32::from).collect(),
            week_nos: by.week_no.iter().copied().map(i32::from).collect(),
            weekdays: Vec::new(),
            nth_weekdays: Vec::new(),
            hours: by.hour.iter().copied().map(u32::from).collect(),
            minutes: by.minute.iter().copied().map(u32::from).collect(),
            seconds: by.second.iter().copied().map(u32::from).collect(),
            set_pos: by.set_pos.iter().copied().map(i32::from).collect(),
            week_start: rule.effective_week_start(),
        };

        let ordinals_apply = matches!(frequency, Frequency::Yearly | Frequency::Monthly);
        for entry in &by.weekday {
            match entry.ordinal {
                Some(n) if ordinals_apply => plan.nth_weekdays.push((i32::from(n), entry.weekday)),
                _ => plan.weekdays.push(entry.weekday),
            }
        }
        plan.weekdays.sort_unstable();
        plan.weekdays.dedup();

        let has_day_constraint = !(by.week_no.is_empty()
            && by.year_day.is_empty()
            && by.month_day.is_empty()
            && by.weekday.is_empty());
        if !has_day_constraint {
            match frequency {
                Frequency::Yearly => {
                    if plan.months.is_empty() {
                        plan.months.push(dtstart.month());
                    }
                    plan.month_days.push(signed(dtstart.day()));
                }
                Frequency::Monthly => plan.month_days.push(signed(dtstart.day())),
                Frequency::Weekly => {
                    plan.weekdays.push(Weekday::from_chrono(dtstart.weekday()));
                }
                _ => {}
            }
        }

        if plan.hours.is_empty() && frequency.is_date_based() {
            plan.hours.push(dtstart.hour());
        }
        if plan.minutes.is_empty()
            && (frequency.is_date_based() || frequency == Frequency::Hourly)
        {
            plan.minutes.push(dtstart.minute());
        }
        if plan.seconds.is_empty() && frequency != Frequency::Secondly {
            plan.seconds.push(dtstart.second());
        }

        plan
    }

    /// Returns whether `date` passes every day-level constraint. `nth` holds
    /// the dates selected by ordinal weekdays for the current period.
    fn day_matches(&self, date: NaiveDate, nth: &BTreeSet<NaiveDate>) -> bool {
        if !self.months.is_empty() && !self.months.contains(&date.month()) {
            return false;
        }
        if !self.week_nos.is_empty() && !self.week_no_matches(date) {
            return false;
        }
        if !self.year_days.is_empty() {
            let ordinal = signed(date.ordinal());
            let len = signed(days_in_year(date.year()));
            if !self
                .year_days
                .iter()
                .any(|&n| n == ordinal || n == ordinal - len - 1)
            {
                return false;
            }
        }
        if !self.month_days.is_empty() {
            let day = signed(date.day());
            let len = signed(days_in_month(date.year(), date.month()));
            if !self
                .month_days
                .iter()
                .any(|&n| n == day || n == day - len - 1)
            {
                return false;
            }
        }
        if !(self.weekdays.is_empty() && self.nth_weekdays.is_empty()) {
            let weekday = Weekday::from_chrono(date.weekday());
            if !self.weekdays.contains(&weekday) && !nth.contains(&date) {
                return false;
            }
        }
        true
    }

    fn week_no_matches(&self, date: NaiveDate) -> bool {
        let (week, weeks_in_year) = week_number(date, self.week_start);
        self.week_nos
            .iter()
            .any(|&n| n == week || n == week - weeks_in_year - 1)
    }

    /// Dates selected by ordinal weekdays within each span.
    fn nth_dates(&self, spans: &[(NaiveDate, NaiveDate)]) -> BTreeSet<NaiveDate> {
        let mut dates = BTreeSet::new();
        for &(first, last) in spans {
            for &(n, weekday) in &self.nth_weekdays {
                if let Some(date) = nth_weekday_in(first, last, n, weekday) {
                    dates.insert(date);
                }
            }
        }
        dates
    }

    fn times(&self) -> Vec<NaiveTime> {
        let mut times = Vec::with_capacity(self.hours.len() * self.minutes.len() * self.seconds.len());
        for &h in &self.hours {
            for &m in &self.minutes {
                for &s in &self.seconds {
                    if let Some(time) = NaiveTime::from_hms_opt(h, m, s) {
                        times.push(time);
                    }
                }
            }
        }
        times
    }
}

/// Lazily evaluates one rule from one anchor.
///
/// Yields strictly increasing UTC instants. Restartable: constructing a new
/// evaluator over the same inputs yields the same sequence.
#[derive(Debug, Clone)]
pub struct RuleEvaluator<'a> {
    rule: &'a RuleSpec,
    timezone: Tz,
    dtstart: NaiveDateTime,
    plan: Plan,
    until: Option<DateTime<Utc>>,
    window_end: Option<DateTime<Utc>>,
    period: u64,
    emitted: u32,
    last: Option<DateTime<Utc>>,
    pending: VecDeque<DateTime<Utc>>,
    stop: Option<StopReason>,
}

/// ## Summary
/// Evaluates `rule` from the anchor's local start, optionally stopping after
/// `window_end` (inclusive).
#[must_use]
pub fn evaluate<'a>(
    rule: &'a RuleSpec,
    anchor: &AnchorPoint,
    window_end: Option<DateTime<Utc>>,
) -> RuleEvaluator<'a> {
    RuleEvaluator::new(rule, anchor.start_local(), anchor.timezone()).with_window_end(window_end)
}

impl<'a> RuleEvaluator<'a> {
    /// Creates an evaluator starting at local `dtstart` in `timezone`.
    #[must_use]
    pub fn new(rule: &'a RuleSpec, dtstart: NaiveDateTime, timezone: Tz) -> Self {
        Self {
            rule,
            timezone,
            dtstart,
            plan: Plan::new(rule, dtstart),
            until: rule.until(),
            window_end: None,
            period: 0,
            emitted: 0,
            last: None,
            pending: VecDeque::new(),
            stop: None,
        }
    }

    /// Stops the evaluator after `window_end` (inclusive). Stopping there is
    /// reported as [`StopReason::Window`].
    #[must_use]
    pub const fn with_window_end(mut self, window_end: Option<DateTime<Utc>>) -> Self {
        self.window_end = window_end;
        self
    }

    /// Ends the rule at the earlier of its own until and `until`, as if the
    /// rule had been written with that bound.
    #[must_use]
    pub fn with_implicit_until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(self.until.map_or(until, |own| own.min(until)));
        self
    }

    /// Skips the periods that end well before `from`, so a lookup near
    /// `from` does not replay the whole history of the rule. Instants before
    /// `from` may still be yielded from the first evaluated period. Counted
    /// rules are left alone: their count runs from the first period.
    #[must_use]
    pub fn starting_near(mut self, from: DateTime<Utc>) -> Self {
        if self.rule.count().is_some() {
            return self;
        }
        // A day of slack covers any UTC offset
        let Some(target) = from
            .with_timezone(&self.timezone)
            .naive_local()
            .checked_sub_signed(TimeDelta::days(1))
        else {
            return self;
        };
        if target <= self.dtstart {
            return self;
        }

        let periods = self.units_until(target) / u64::from(self.rule.interval());
        let skipped = periods.saturating_sub(1);
        if skipped > self.period {
            tracing::trace!(skipped, %from, "Fast-forwarding rule evaluation");
            self.period = skipped;
        }
        self
    }

    /// Whole frequency units between the first period and `target`,
    /// rounded down.
    fn units_until(&self, target: NaiveDateTime) -> u64 {
        let start = self.dtstart.date();
        let date = target.date();
        let frequency = self.rule.frequency();
        let units = match frequency {
            Frequency::Yearly => i64::from(date.year()) - i64::from(start.year()),
            Frequency::Monthly => {
                (i64::from(date.year()) - i64::from(start.year())) * 12
                    + i64::from(date.month())
                    - i64::from(start.month())
            }
            Frequency::Weekly => (date - start).num_days() / 7,
            Frequency::Daily => (date - start).num_days(),
            Frequency::Hourly | Frequency::Minutely | Frequency::Secondly => {
                (target - self.sub_daily_base()).num_seconds() / unit_seconds(frequency)
            }
        };
        u64::try_from(units).unwrap_or(0)
    }

    /// Why the evaluator stopped, once it has.
    #[must_use]
    pub const fn stop_reason(&self) -> Option<StopReason> {
        self.stop
    }

    #[must_use]
    pub const fn rule(&self) -> &RuleSpec {
        self.rule
    }

    fn finish(&mut self, reason: StopReason) {
        tracing::trace!(?reason, emitted = self.emitted, "Rule evaluation stopped");
        self.stop = Some(reason);
        self.pending.clear();
    }

    /// The stop reason that applies once evaluation passes `limit`.
    fn limit(&self) -> Option<(DateTime<Utc>, StopReason)> {
        match (self.until, self.window_end) {
            (Some(until), Some(window)) if window < until => Some((window, StopReason::Window)),
            (Some(until), _) => Some((until, StopReason::Exhausted)),
            (None, Some(window)) => Some((window, StopReason::Window)),
            (None, None) => None,
        }
    }

    /// Expands the next period into `pending`, or stops.
    fn advance(&mut self) {
        let frequency = self.rule.frequency();
        let step = u64::from(self.rule.interval());

        let Some(period_start) = self.period_start(self.period.saturating_mul(step)) else {
            self.finish(StopReason::Exhausted);
            return;
        };

        if period_start.year() > MAX_YEAR {
            self.finish(StopReason::Exhausted);
            return;
        }

        if let Some((limit, reason)) = self.limit() {
            let local_limit = limit.with_timezone(&self.timezone).naive_local();
            if local_limit
                .checked_add_signed(TimeDelta::days(1))
                .is_some_and(|cutoff| period_start > cutoff)
            {
                self.finish(reason);
                return;
            }
        }

        let candidates = if frequency.is_date_based() {
            self.period += 1;
            self.date_period_candidates(period_start)
        } else {
            self.time_period_candidates(period_start)
        };

        let mut instants: Vec<DateTime<Utc>> = select_positions(candidates, &self.plan.set_pos)
            .into_iter()
            .filter(|candidate| *candidate >= self.dtstart)
            .map(|candidate| localize(candidate, self.timezone))
            .collect();
        instants.sort_unstable();
        instants.dedup();

        if !instants.is_empty() {
            tracing::trace!(%period_start, count = instants.len(), "Expanded period");
        }
        self.pending.extend(instants);
    }

    /// Local start of the period `offset` units after the first one.
    fn period_start(&self, offset: u64) -> Option<NaiveDateTime> {
        let date = self.dtstart.date();
        match self.rule.frequency() {
            Frequency::Yearly => {
                let year = i64::from(date.year()).checked_add(i64::try_from(offset).ok()?)?;
                let year = i32::try_from(year).ok()?;
                NaiveDate::from_ymd_opt(year, 1, 1).map(|d| d.and_time(NaiveTime::MIN))
            }
            Frequency::Monthly => {
                let first = date.with_day(1)?;
                first
                    .checked_add_months(Months::new(u32::try_from(offset).ok()?))
                    .map(|d| d.and_time(NaiveTime::MIN))
            }
            Frequency::Weekly => {
                let back = (7 + date.weekday().num_days_from_monday()
                    - self.plan.week_start.index())
                    % 7;
                let week = date.checked_sub_days(Days::new(u64::from(back)))?;
                week.checked_add_days(Days::new(offset.checked_mul(7)?))
                    .map(|d| d.and_time(NaiveTime::MIN))
            }
            Frequency::Daily => date
                .checked_add_days(Days::new(offset))
                .map(|d| d.and_time(NaiveTime::MIN)),
            Frequency::Hourly | Frequency::Minutely | Frequency::Secondly => {
                let seconds = i64::try_from(offset)
                    .ok()?
                    .checked_mul(unit_seconds(self.rule.frequency()))?;
                self.sub_daily_base()
                    .checked_add_signed(TimeDelta::try_seconds(seconds)?)
            }
        }
    }

    /// First sub-daily period, truncated to the frequency's unit.
    fn sub_daily_base(&self) -> NaiveDateTime {
        let time = self.dtstart.time();
        let truncated = match self.rule.frequency() {
            Frequency::Hourly => NaiveTime::from_hms_opt(time.hour(), 0, 0),
            Frequency::Minutely => NaiveTime::from_hms_opt(time.hour(), time.minute(), 0),
            _ => Some(time),
        };
        self.dtstart
            .date()
            .and_time(truncated.unwrap_or(time))
    }

    fn date_period_candidates(&self, start: NaiveDateTime) -> Vec<NaiveDateTime> {
        let first = start.date();
        let (days, spans): (Vec<NaiveDate>, Vec<(NaiveDate, NaiveDate)>) =
            match self.rule.frequency() {
                Frequency::Yearly => {
                    let last = last_day_of_year(first.year());
                    let spans = if self.plan.months.is_empty() {
                        vec![(first, last)]
                    } else {
                        self.plan
                            .months
                            .iter()
                            .filter_map(|&m| month_span(first.year(), m))
                            .collect()
                    };
                    (days_between(first, last), spans)
                }
                Frequency::Monthly => {
                    let last = first
                        .with_day(days_in_month(first.year(), first.month()))
                        .unwrap_or(first);
                    (days_between(first, last), vec![(first, last)])
                }
                Frequency::Weekly => {
                    let last = first + TimeDelta::days(6);
                    (days_between(first, last), Vec::new())
                }
                _ => (vec![first], Vec::new()),
            };

        let nth = if self.plan.nth_weekdays.is_empty() {
            BTreeSet::new()
        } else {
            self.plan.nth_dates(&spans)
        };

        let times = self.plan.times();
        days.into_iter()
            .filter(|day| self.plan.day_matches(*day, &nth))
            .flat_map(|day| times.iter().map(move |time| day.and_time(*time)))
            .collect()
    }

    /// Candidates of a sub-daily period. Periods on days, hours or minutes
    /// that fail a coarser constraint are skipped in one jump.
    fn time_period_candidates(&mut self, start: NaiveDateTime) -> Vec<NaiveDateTime> {
        let frequency = self.rule.frequency();
        let plan = &self.plan;

        let skip_to = if !plan.day_matches(start.date(), &BTreeSet::new()) {
            Some(start.date().and_time(NaiveTime::MIN) + TimeDelta::days(1))
        } else if !plan.hours.is_empty() && !plan.hours.contains(&start.hour()) {
            Some(truncate_to_hour(start) + TimeDelta::hours(1))
        } else if frequency != Frequency::Hourly
            && !plan.minutes.is_empty()
            && !plan.minutes.contains(&start.minute())
        {
            Some(truncate_to_minute(start) + TimeDelta::minutes(1))
        } else if frequency == Frequency::Secondly
            && !plan.seconds.is_empty()
            && !plan.seconds.contains(&start.second())
        {
            Some(start + TimeDelta::seconds(1))
        } else {
            None
        };

        if let Some(target) = skip_to {
            let step = i64::from(self.rule.interval()) * unit_seconds(frequency);
            let gap = (target - start).num_seconds().max(1);
            let periods = u64::try_from((gap + step - 1) / step).unwrap_or(1).max(1);
            self.period = self.period.saturating_add(periods);
            return Vec::new();
        }
        self.period += 1;

        let date = start.date();
        match frequency {
            Frequency::Hourly => plan
                .minutes
                .iter()
                .flat_map(|&m| {
                    plan.seconds
                        .iter()
                        .filter_map(move |&s| NaiveTime::from_hms_opt(start.hour(), m, s))
                })
                .map(|time| date.and_time(time))
                .collect(),
            Frequency::Minutely => plan
                .seconds
                .iter()
                .filter_map(|&s| NaiveTime::from_hms_opt(start.hour(), start.minute(), s))
                .map(|time| date.and_time(time))
                .collect(),
            _ => vec![start],
        }
    }
}

impl Iterator for RuleEvaluator<'_> {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.stop.is_some() {
                return None;
            }

            let Some(instant) = self.pending.pop_front() else {
                self.advance();
                continue;
            };

            if self.until.is_some_and(|until| instant > until) {
                self.finish(StopReason::Exhausted);
                return None;
            }
            if self.window_end.is_some_and(|end| instant > end) {
                self.finish(StopReason::Window);
                return None;
            }
            if self.last.is_some_and(|last| instant <= last) {
                continue;
            }

            self.last = Some(instant);
            self.emitted += 1;
            if self.rule.count().is_some_and(|count| self.emitted >= count) {
                self.finish(StopReason::Exhausted);
            }
            return Some(instant);
        }
    }
}

/// Applies BYSETPOS (1-based, negative from the end) to a period's sorted
/// candidates.
fn select_positions(mut candidates: Vec<NaiveDateTime>, positions: &[i32]) -> Vec<NaiveDateTime> {
    candidates.sort_unstable();
    candidates.dedup();
    if positions.is_empty() {
        return candidates;
    }

    let len = candidates.len();
    let mut selected: Vec<NaiveDateTime> = positions
        .iter()
        .filter_map(|&pos| {
            let index = if pos > 0 {
                usize::try_from(pos - 1).ok()?
            } else {
                len.checked_sub(usize::try_from(pos.unsigned_abs()).ok()?)?
            };
            candidates.get(index).copied()
        })
        .collect();
    selected.sort_unstable();
    selected.dedup();
    selected
}

const fn unit_seconds(frequency: Frequency) -> i64 {
    match frequency {
        Frequency::Hourly => 3600,
        Frequency::Minutely => 60,
        _ => 1,
    }
}

fn truncate_to_hour(t: NaiveDateTime) -> NaiveDateTime {
    t.date()
        .and_time(NaiveTime::from_hms_opt(t.hour(), 0, 0).unwrap_or(NaiveTime::MIN))
}

fn truncate_to_minute(t: NaiveDateTime) -> NaiveDateTime {
    t.date().and_time(
        NaiveTime::from_hms_opt(t.hour(), t.minute(), 0).unwrap_or(NaiveTime::MIN),
    )
}

#[expect(
    clippy::cast_possible_wrap,
    reason = "calendar day counts are at most 366"
)]
const fn signed(value: u32) -> i32 {
    value as i32
}

fn days_in_year(year: i32) -> u32 {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366
    } else {
        365
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.and_then(|d| d.pred_opt()).map_or(31, |d| d.day())
}

fn last_day_of_year(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(NaiveDate::MAX)
}

fn month_span(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = NaiveDate::from_ymd_opt(year, month, days_in_month(year, month))?;
    Some((first, last))
}

fn days_between(first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
    first.iter_days().take_while(|d| *d <= last).collect()
}

/// The `n`th `weekday` within `[first, last]`, counting from the end when
/// `n` is negative.
fn nth_weekday_in(first: NaiveDate, last: NaiveDate, n: i32, weekday: Weekday) -> Option<NaiveDate> {
    let weeks = u64::from((n.unsigned_abs()).checked_sub(1)?) * 7;
    let date = if n > 0 {
        let ahead = (7 + weekday.index() - first.weekday().num_days_from_monday()) % 7;
        first.checked_add_days(Days::new(u64::from(ahead) + weeks))?
    } else {
        let back = (7 + last.weekday().num_days_from_monday() - weekday.index()) % 7;
        last.checked_sub_days(Days::new(u64::from(back) + weeks))?
    };
    (first..=last).contains(&date).then_some(date)
}

/// First day of week 1 of `year`: the first week with at least four days in
/// the year, weeks starting on `week_start`.
fn week_one_start(year: i32, week_start: Weekday) -> Option<NaiveDate> {
    let jan1 = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let offset = (7 + jan1.weekday().num_days_from_monday() - week_start.index()) % 7;
    if 7 - offset >= 4 {
        jan1.checked_sub_days(Days::new(u64::from(offset)))
    } else {
        jan1.checked_add_days(Days::new(u64::from(7 - offset)))
    }
}

/// Week number of `date` and the number of weeks in its week-numbering year.
fn week_number(date: NaiveDate, week_start: Weekday) -> (i32, i32) {
    let year = date.year();
    let starts = (
        week_one_start(year - 1, week_start),
        week_one_start(year, week_start),
        week_one_start(year + 1, week_start),
        week_one_start(year + 2, week_start),
    );
    let (Some(prev), Some(this), Some(next), Some(after)) = starts else {
        return (0, 0);
    };

    let (start, end) = if date < this {
        (prev, this)
    } else if date >= next {
        (next, after)
    } else {
        (this, next)
    };

    let week = (date - start).num_days() / 7 + 1;
    let weeks = (end - start).num_days() / 7;
    (
        i32::try_from(week).unwrap_or_default(),
        i32::try_from(weeks).unwrap_or_default(),
    )
}
