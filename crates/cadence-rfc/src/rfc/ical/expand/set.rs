//! Combined rule sets: inclusion sources minus exclusion sources.

use std::iter::Peekable;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use super::{MergedStream, Source};
use crate::rfc::ical::core::{DateRange, RuleSetEntry};

/// An explicit exclusion: one instant, or every day of a range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exclusion {
    Instant(DateTime<Utc>),
    Range(DateRange),
}

impl Exclusion {
    /// The instants this exclusion removes.
    #[must_use]
    pub fn instants(&self) -> Vec<DateTime<Utc>> {
        match self {
            Self::Instant(instant) => vec![*instant],
            Self::Range(range) => range.all_dates(),
        }
    }
}

impl From<DateTime<Utc>> for Exclusion {
    fn from(instant: DateTime<Utc>) -> Self {
        Self::Instant(instant)
    }
}

/// Immutable snapshot of everything that defines one occurrence stream.
///
/// Occurrences are `I \ E`, where `I` merges every inclusion entry with the
/// include dates, and `E` merges every exclusion entry, every exclusion range
/// owned by an entry and the explicit exclusions. Exclusion wins on equal
/// instants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedSet {
    timezone: Tz,
    entries: Vec<RuleSetEntry>,
    include_dates: Vec<DateTime<Utc>>,
    exclusions: Vec<Exclusion>,
}

/// ## Summary
/// Builds a combined set. Inputs are cloned by the caller into the snapshot;
/// later changes to them do not affect it.
#[must_use]
pub fn build(
    timezone: Tz,
    entries: Vec<RuleSetEntry>,
    mut include_dates: Vec<DateTime<Utc>>,
    exclusions: Vec<Exclusion>,
) -> CombinedSet {
    include_dates.sort_unstable();
    include_dates.dedup();
    tracing::debug!(
        %timezone,
        entries = entries.len(),
        include_dates = include_dates.len(),
        exclusions = exclusions.len(),
        "Built combined set"
    );
    CombinedSet {
        timezone,
        entries,
        include_dates,
        exclusions,
    }
}

impl CombinedSet {
    /// A set with no sources at all.
    #[must_use]
    pub const fn empty(timezone: Tz) -> Self {
        Self {
            timezone,
            entries: Vec::new(),
            include_dates: Vec::new(),
            exclusions: Vec::new(),
        }
    }

    #[must_use]
    pub const fn timezone(&self) -> Tz {
        self.timezone
    }

    #[must_use]
    pub fn entries(&self) -> &[RuleSetEntry] {
        &self.entries
    }

    #[must_use]
    pub fn include_dates(&self) -> &[DateTime<Utc>] {
        &self.include_dates
    }

    #[must_use]
    pub fn exclusions(&self) -> &[Exclusion] {
        &self.exclusions
    }

    /// Returns whether anything can contribute an occurrence.
    #[must_use]
    pub fn has_inclusion_source(&self) -> bool {
        !self.include_dates.is_empty() || self.entries.iter().any(|e| !e.is_exclusion())
    }

    /// Returns whether some inclusion entry never ends.
    #[must_use]
    pub fn has_unbounded_inclusion(&self) -> bool {
        self.entries
            .iter()
            .any(|e| !e.is_exclusion() && e.is_unbounded())
    }

    /// Earliest instant any inclusion source can produce.
    #[must_use]
    pub fn earliest_start(&self) -> Option<DateTime<Utc>> {
        self.entries
            .iter()
            .filter(|e| !e.is_exclusion())
            .map(|e| e.bounds().0)
            .chain(self.include_dates.first().copied())
            .min()
    }

    /// Every instant removed by explicit exclusions and entry-owned
    /// exclusion ranges, sorted.
    #[must_use]
    pub fn excluded_instants(&self) -> Vec<DateTime<Utc>> {
        let mut instants: Vec<_> = self
            .exclusions
            .iter()
            .flat_map(Exclusion::instants)
            .chain(self.entries.iter().flat_map(RuleSetEntry::excluded_dates))
            .collect();
        instants.sort_unstable();
        instants.dedup();
        instants
    }

    /// ## Summary
    /// The combined occurrence stream, stopping after `window_end` when given.
    #[must_use]
    pub fn occurrences(&self, window_end: Option<DateTime<Utc>>) -> Occurrences<'_> {
        self.occurrences_near(None, window_end)
    }

    /// ## Summary
    /// Like [`occurrences`](Self::occurrences), but rule evaluation begins
    /// close to `window_start` instead of at each anchor. Every occurrence at
    /// or after `window_start` is produced; some earlier ones may be too.
    #[must_use]
    pub fn occurrences_near(
        &self,
        window_start: Option<DateTime<Utc>>,
        window_end: Option<DateTime<Utc>>,
    ) -> Occurrences<'_> {
        if !self.has_inclusion_source() {
            return Occurrences {
                included: MergedStream::empty(),
                excluded: MergedStream::empty().peekable(),
            };
        }

        let mut included = Vec::new();
        let mut excluded = vec![Source::dates(self.excluded_instants(), window_end)];
        for entry in &self.entries {
            let target = if entry.is_exclusion() {
                &mut excluded
            } else {
                &mut included
            };
            entry.push_sources(window_start, window_end, target);
        }
        let include_dates = match window_start {
            Some(start) => {
                let from = self.include_dates.partition_point(|t| *t < start);
                self.include_dates[from..].to_vec()
            }
            None => self.include_dates.clone(),
        };
        included.push(Source::dates(include_dates, window_end));

        Occurrences {
            included: MergedStream::new(included),
            excluded: MergedStream::new(excluded).peekable(),
        }
    }

    /// Occurrences within `[start, end]`.
    #[must_use]
    pub fn between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        self.occurrences(Some(end))
            .skip_while(|t| *t < start)
            .collect()
    }
}

/// Lazy `I \ E` stream of a [`CombinedSet`].
#[derive(Debug)]
pub struct Occurrences<'a> {
    included: MergedStream<'a>,
    excluded: Peekable<MergedStream<'a>>,
}

impl Occurrences<'_> {
    /// ## Summary
    /// Returns whether every inclusion source ran to its natural end. Only
    /// meaningful once the stream has returned `None`.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.included.is_complete()
    }
}

impl Iterator for Occurrences<'_> {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let candidate = self.included.next()?;
            while self.excluded.next_if(|e| *e < candidate).is_some() {}
            if self.excluded.next_if_eq(&candidate).is_some() {
                continue;
            }
            return Some(candidate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc::ical::core::{AnchorPoint, Frequency, RuleSpec};
    use chrono::{NaiveDate, TimeZone};

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, d, 9, 0, 0).unwrap()
    }

    fn daily_from(d: u32, count: Option<u32>) -> RuleSetEntry {
        let mut rule = RuleSpec::builder(Frequency::Daily);
        if let Some(count) = count {
            rule = rule.with_count(count);
        }
        RuleSetEntry::event(
            AnchorPoint::from_instant(day(d), Tz::UTC),
            Some(rule.build().unwrap()),
        )
    }

    #[test_log::test]
    fn exclusion_wins_over_inclusion() {
        let set = build(
            Tz::UTC,
            vec![daily_from(1, Some(5))],
            vec![day(3)],
            vec![Exclusion::Instant(day(3)), Exclusion::Instant(day(4))],
        );

        let all: Vec<_> = set.occurrences(None).collect();
        assert_eq!(all, vec![day(1), day(2), day(5)]);
    }

    #[test_log::test]
    fn no_inclusion_source_is_empty() {
        let exclusion_only = RuleSetEntry::exclusion_rule(
            AnchorPoint::from_instant(day(1), Tz::UTC),
            RuleSpec::builder(Frequency::Daily).build().unwrap(),
        );
        let set = build(Tz::UTC, vec![exclusion_only], vec![], vec![]);
        assert!(!set.has_inclusion_source());
        assert_eq!(set.occurrences(None).next(), None);

        assert_eq!(CombinedSet::empty(Tz::UTC).occurrences(None).next(), None);
    }

    #[test_log::test]
    fn unbounded_exclusion_rule_composes_lazily() {
        let weekly_exclusion = RuleSetEntry::exclusion_rule(
            AnchorPoint::from_instant(day(2), Tz::UTC),
            RuleSpec::builder(Frequency::Weekly).build().unwrap(),
        );
        let set = build(
            Tz::UTC,
            vec![daily_from(1, None), weekly_exclusion],
            vec![],
            vec![],
        );

        let first: Vec<_> = set.occurrences(None).take(7).collect();
        assert_eq!(
            first,
            vec![day(1), day(3), day(4), day(5), day(6), day(7), day(8)]
        );
    }

    #[test_log::test]
    fn owned_exclusion_range_removes_days() {
        let entry = daily_from(1, Some(14))
            .with_exclusion(
                NaiveDate::from_ymd_opt(2026, 1, 7).unwrap(),
                NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
            )
            .unwrap();
        let set = build(Tz::UTC, vec![entry], vec![], vec![]);

        let all: Vec<_> = set.occurrences(None).collect();
        assert_eq!(all.len(), 10);
        assert!(!all.contains(&day(7)));
        assert!(!all.contains(&day(10)));
        assert!(all.contains(&day(11)));
    }

    #[test_log::test]
    fn between_is_inclusive() {
        let set = build(Tz::UTC, vec![daily_from(1, None)], vec![], vec![]);
        assert_eq!(set.between(day(3), day(5)), vec![day(3), day(4), day(5)]);
    }

    #[test_log::test]
    fn completion_tracks_inclusion_sources() {
        let set = build(Tz::UTC, vec![daily_from(1, Some(3))], vec![], vec![]);
        let mut occurrences = set.occurrences(Some(day(20)));
        assert_eq!(occurrences.by_ref().count(), 3);
        assert!(occurrences.is_complete());

        let open = build(Tz::UTC, vec![daily_from(1, None)], vec![], vec![]);
        let mut occurrences = open.occurrences(Some(day(20)));
        assert_eq!(occurrences.by_ref().count(), 20);
        assert!(!occurrences.is_complete());
    }
}
