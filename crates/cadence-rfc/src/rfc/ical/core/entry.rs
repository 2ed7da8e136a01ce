//! Rule-set entries: a rule bound to an anchor or to a set of windows.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::{AnchorPoint, DateRange, RangeKind, RuleSpec};
use crate::error::ValidationError;
use crate::rfc::ical::expand::{MergedStream, RuleEvaluator, Source};

/// Where an entry's occurrences are evaluated from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntrySource {
    /// Single-event model: one anchor plus the exclusion ranges it owns.
    Anchored {
        anchor: AnchorPoint,
        exclusions: Vec<DateRange>,
    },
    /// Multi-range model: the rule is evaluated inside each window range;
    /// exclusion ranges subtract whole days.
    Ranged { ranges: Vec<DateRange> },
}

/// One inclusion or exclusion source of a combined set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSetEntry {
    rule: Option<RuleSpec>,
    is_exclusion: bool,
    source: EntrySource,
}

impl RuleSetEntry {
    /// An inclusion event. Without a rule it contributes only its start.
    #[must_use]
    pub const fn event(anchor: AnchorPoint, rule: Option<RuleSpec>) -> Self {
        Self {
            rule,
            is_exclusion: false,
            source: EntrySource::Anchored {
                anchor,
                exclusions: Vec::new(),
            },
        }
    }

    /// An anchored exclusion rule.
    #[must_use]
    pub const fn exclusion_rule(anchor: AnchorPoint, rule: RuleSpec) -> Self {
        Self {
            rule: Some(rule),
            is_exclusion: true,
            source: EntrySource::Anchored {
                anchor,
                exclusions: Vec::new(),
            },
        }
    }

    /// ## Summary
    /// A rule evaluated within its own date ranges.
    ///
    /// ## Errors
    /// Returns `MissingInclusionRange` unless at least one range is a window.
    pub fn ranged(
        rule: RuleSpec,
        ranges: Vec<DateRange>,
        is_exclusion: bool,
    ) -> Result<Self, ValidationError> {
        if !ranges.iter().any(|r| r.kind() == RangeKind::Window) {
            return Err(ValidationError::MissingInclusionRange);
        }
        Ok(Self {
            rule: Some(rule),
            is_exclusion,
            source: EntrySource::Ranged { ranges },
        })
    }

    /// ## Summary
    /// Adds an exclusion span owned by this entry's anchor.
    ///
    /// ## Errors
    /// Returns `EmptyRange` unless `start < end`.
    pub fn with_exclusion(mut self, start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        match &mut self.source {
            EntrySource::Anchored { anchor, exclusions } => {
                exclusions.push(DateRange::exclusion(start, end, anchor)?);
            }
            EntrySource::Ranged { ranges } => {
                let Some(first) = ranges.iter().find(|r| r.kind() == RangeKind::Window) else {
                    return Err(ValidationError::MissingInclusionRange);
                };
                let time = first.start_local().time();
                ranges.push(DateRange::new(
                    start.and_time(time),
                    end.and_time(time),
                    first.timezone(),
                    RangeKind::Exclusion,
                )?);
            }
        }
        Ok(self)
    }

    /// ## Summary
    /// Moves the anchor start and re-synchronizes every owned exclusion range.
    /// Ranged entries have no anchor and are left untouched.
    ///
    /// ## Errors
    /// Returns an error if the anchor or a synchronized range becomes invalid;
    /// the entry is unchanged in that case.
    pub fn set_anchor_start(&mut self, start: NaiveDateTime) -> Result<(), ValidationError> {
        if let EntrySource::Anchored { anchor, exclusions } = &mut self.source {
            let moved = anchor.clone().with_start(start)?;
            let mut synced = exclusions.clone();
            for range in &mut synced {
                range.sync_time_component(&moved)?;
            }
            *anchor = moved;
            *exclusions = synced;
        }
        Ok(())
    }

    #[must_use]
    pub const fn rule(&self) -> Option<&RuleSpec> {
        self.rule.as_ref()
    }

    #[must_use]
    pub const fn is_exclusion(&self) -> bool {
        self.is_exclusion
    }

    #[must_use]
    pub const fn source(&self) -> &EntrySource {
        &self.source
    }

    /// The anchor of a single-event entry.
    #[must_use]
    pub const fn anchor(&self) -> Option<&AnchorPoint> {
        match &self.source {
            EntrySource::Anchored { anchor, .. } => Some(anchor),
            EntrySource::Ranged { .. } => None,
        }
    }

    /// Window ranges of a multi-range entry, in input order.
    pub fn windows(&self) -> impl Iterator<Item = &DateRange> {
        let ranges: &[DateRange] = match &self.source {
            EntrySource::Anchored { .. } => &[],
            EntrySource::Ranged { ranges } => ranges,
        };
        ranges.iter().filter(|r| r.kind() == RangeKind::Window)
    }

    /// Exclusion ranges owned by this entry.
    pub fn exclusion_ranges(&self) -> impl Iterator<Item = &DateRange> {
        let ranges: &[DateRange] = match &self.source {
            EntrySource::Anchored { exclusions, .. } => exclusions,
            EntrySource::Ranged { ranges } => ranges,
        };
        ranges.iter().filter(|r| r.is_exclusion())
    }

    /// Every day removed by the owned exclusion ranges.
    #[must_use]
    pub fn excluded_dates(&self) -> Vec<DateTime<Utc>> {
        self.exclusion_ranges()
            .flat_map(DateRange::all_dates)
            .collect()
    }

    /// ## Summary
    /// Bounding window of the entry: the earliest start, and the latest end
    /// when it is known up front (`None` for anchored unbounded or counted
    /// rules).
    #[must_use]
    pub fn bounds(&self) -> (DateTime<Utc>, Option<DateTime<Utc>>) {
        match &self.source {
            EntrySource::Anchored { anchor, .. } => {
                let start = anchor.start();
                let end = self.rule.as_ref().map_or(Some(start), RuleSpec::until);
                (start, end)
            }
            EntrySource::Ranged { .. } => {
                let until = self.rule.as_ref().and_then(RuleSpec::until);
                let start = self.windows().map(DateRange::start).min();
                let end = self
                    .windows()
                    .map(|w| until.map_or(w.end(), |u| u.min(w.end())))
                    .max();
                // `ranged` guarantees at least one window
                (start.unwrap_or(DateTime::<Utc>::MIN_UTC), end)
            }
        }
    }

    /// Returns whether the entry keeps producing occurrences forever.
    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        matches!(self.source, EntrySource::Anchored { .. })
            && self.rule.as_ref().is_some_and(RuleSpec::is_unbounded)
    }

    /// Occurrences of this entry alone, ignoring its exclusion ranges.
    #[must_use]
    pub fn occurrences(&self, window_end: Option<DateTime<Utc>>) -> MergedStream<'_> {
        let mut sources = Vec::new();
        self.push_sources(None, window_end, &mut sources);
        MergedStream::new(sources)
    }

    /// Adds this entry's sources to `out`. With a `window_start`, rule
    /// evaluation skips periods well before it; earlier instants may still
    /// be produced.
    pub(crate) fn push_sources<'a>(
        &'a self,
        window_start: Option<DateTime<Utc>>,
        window_end: Option<DateTime<Utc>>,
        out: &mut Vec<Source<'a>>,
    ) {
        let fast_forward = |evaluator: RuleEvaluator<'a>| match window_start {
            Some(start) => evaluator.starting_near(start),
            None => evaluator,
        };
        match (&self.source, self.rule.as_ref()) {
            (EntrySource::Anchored { anchor, .. }, None) => {
                out.push(Source::dates(vec![anchor.start()], window_end));
            }
            (EntrySource::Anchored { anchor, .. }, Some(rule)) => {
                out.push(Source::Rule(fast_forward(
                    RuleEvaluator::new(rule, anchor.start_local(), anchor.timezone())
                        .with_window_end(window_end),
                )));
            }
            (EntrySource::Ranged { .. }, Some(rule)) => {
                for window in self.windows() {
                    if window_start.is_some_and(|start| window.end() < start) {
                        continue;
                    }
                    out.push(Source::Rule(fast_forward(
                        RuleEvaluator::new(rule, window.start_local(), window.timezone())
                            .with_implicit_until(window.end())
                            .with_window_end(window_end),
                    )));
                }
            }
            (EntrySource::Ranged { .. }, None) => {}
        }
    }
}
