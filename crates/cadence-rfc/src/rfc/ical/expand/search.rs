//! Next/previous/first/last occurrence lookup over a combined set.

use cadence_core::config::SearchConfig;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::CombinedSet;
use crate::error::RfcResult;

/// Cached occurrence fields of a rule set, recomputed on demand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccurrenceSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<DateTime<Utc>>,
}

/// Occurrence lookups bounded by adaptive window expansion.
///
/// Forward searches start with a window of `window_days` and double it up to
/// `window_multiple` times, so unbounded rules (or an unbounded inclusion
/// cancelled by an unbounded exclusion) always terminate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccurrenceSearch {
    window_days: u32,
    window_multiple: u32,
}

impl Default for OccurrenceSearch {
    fn default() -> Self {
        let config = SearchConfig::default();
        Self {
            window_days: config.window_days,
            window_multiple: config.window_multiple,
        }
    }
}

impl OccurrenceSearch {
    /// ## Summary
    /// Creates a search with explicit bounds.
    ///
    /// ## Errors
    /// Returns an error if either bound is zero.
    pub fn new(window_days: u32, window_multiple: u32) -> RfcResult<Self> {
        Self::from_config(&SearchConfig {
            window_days,
            window_multiple,
        })
    }

    /// ## Summary
    /// Creates a search from the `search` settings section.
    ///
    /// ## Errors
    /// Returns an error if either bound is zero.
    pub fn from_config(config: &SearchConfig) -> RfcResult<Self> {
        config.validate()?;
        Ok(Self {
            window_days: config.window_days,
            window_multiple: config.window_multiple,
        })
    }

    #[must_use]
    pub const fn window_days(&self) -> u32 {
        self.window_days
    }

    #[must_use]
    pub const fn window_multiple(&self) -> u32 {
        self.window_multiple
    }

    /// Width of the window searched in `attempt` (0-based), `None` once it
    /// no longer fits a `TimeDelta`.
    fn width(&self, attempt: u32) -> Option<TimeDelta> {
        2_i64
            .checked_pow(attempt)
            .and_then(|factor| factor.checked_mul(i64::from(self.window_days)))
            .and_then(TimeDelta::try_days)
    }

    /// End of the window searched in `attempt`, starting at `base`.
    fn horizon(&self, base: DateTime<Utc>, attempt: u32) -> DateTime<Utc> {
        self.width(attempt)
            .and_then(|delta| base.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Smallest occurrence strictly after `after`, searched from `base`.
    /// Rule evaluation starts near `after` rather than at the anchors.
    fn search_forward(
        &self,
        set: &CombinedSet,
        base: DateTime<Utc>,
        after: Option<DateTime<Utc>>,
    ) -> Option<DateTime<Utc>> {
        for attempt in 0..=self.window_multiple {
            let horizon = self.horizon(base, attempt);
            tracing::trace!(attempt, %horizon, "Searching window");

            let mut occurrences = set.occurrences_near(after, Some(horizon));
            let found = occurrences
                .by_ref()
                .find(|t| after.is_none_or(|after| *t > after));
            if found.is_some() {
                return found;
            }
            if occurrences.is_complete() || horizon == DateTime::<Utc>::MAX_UTC {
                return None;
            }
        }
        tracing::debug!(
            window_days = self.window_days,
            window_multiple = self.window_multiple,
            "Search window exhausted"
        );
        None
    }

    /// ## Summary
    /// The smallest occurrence strictly greater than `reference`.
    #[must_use]
    #[tracing::instrument(skip(self, set), fields(entries = set.entries().len()))]
    pub fn next(&self, set: &CombinedSet, reference: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let earliest = set.earliest_start()?;
        self.search_forward(set, earliest.max(reference), Some(reference))
    }

    /// ## Summary
    /// The largest occurrence strictly less than `reference`. Windows ending
    /// at `reference` start one day wide and double up to the widest forward
    /// window; older history is not searched.
    #[must_use]
    #[tracing::instrument(skip(self, set), fields(entries = set.entries().len()))]
    pub fn previous(&self, set: &CombinedSet, reference: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let earliest = set.earliest_start()?;
        if earliest >= reference {
            return None;
        }

        let widest = self.width(self.window_multiple);
        let mut width = TimeDelta::days(1);
        loop {
            let width_now = widest.map_or(width, |widest| width.min(widest));
            let floor = reference
                .checked_sub_signed(width_now)
                .unwrap_or(DateTime::<Utc>::MIN_UTC)
                .max(earliest);
            tracing::trace!(%floor, "Searching window backwards");

            let found = set
                .occurrences_near(Some(floor), Some(reference))
                .skip_while(|t| *t < floor)
                .take_while(|t| *t < reference)
                .last();
            if found.is_some() || floor == earliest {
                return found;
            }
            if widest.is_some_and(|widest| width_now >= widest) {
                break;
            }
            width = width.checked_mul(2).unwrap_or(TimeDelta::MAX);
        }
        tracing::debug!(
            window_days = self.window_days,
            window_multiple = self.window_multiple,
            "Backward search window exhausted"
        );
        None
    }

    /// ## Summary
    /// The earliest occurrence, searched from the earliest possible start.
    #[must_use]
    #[tracing::instrument(skip(self, set), fields(entries = set.entries().len()))]
    pub fn first(&self, set: &CombinedSet) -> Option<DateTime<Utc>> {
        let earliest = set.earliest_start()?;
        self.search_forward(set, earliest, None)
    }

    /// ## Summary
    /// The latest occurrence. Sets that keep producing occurrences past the
    /// last searched window have none.
    #[must_use]
    #[tracing::instrument(skip(self, set), fields(entries = set.entries().len()))]
    pub fn last(&self, set: &CombinedSet) -> Option<DateTime<Utc>> {
        let earliest = set.earliest_start()?;
        if set.has_unbounded_inclusion() {
            tracing::debug!("Unbounded inclusion rule, no last occurrence");
            return None;
        }

        if let Some(end) = known_end(set) {
            let mut occurrences = set.occurrences(Some(end));
            let last = occurrences.by_ref().last();
            if occurrences.is_complete() {
                return last;
            }
        }

        for attempt in 0..=self.window_multiple {
            let horizon = self.horizon(earliest, attempt);
            let mut occurrences = set.occurrences(Some(horizon));
            let last = occurrences.by_ref().last();
            if occurrences.is_complete() {
                return last;
            }
            if horizon == DateTime::<Utc>::MAX_UTC {
                break;
            }
        }
        tracing::debug!("Set still producing at the end of the search window");
        None
    }

    /// ## Summary
    /// Recomputes every cached occurrence field relative to `reference`.
    #[must_use]
    #[tracing::instrument(skip(self, set), fields(entries = set.entries().len()))]
    pub fn recompute(&self, set: &CombinedSet, reference: DateTime<Utc>) -> OccurrenceSummary {
        let summary = OccurrenceSummary {
            next: self.next(set, reference),
            previous: self.previous(set, reference),
            first: self.first(set),
            last: self.last(set),
        };
        tracing::debug!(?summary, "Recomputed occurrences");
        summary
    }
}

/// Latest instant any inclusion source can reach, when every one of them
/// declares its end up front.
fn known_end(set: &CombinedSet) -> Option<DateTime<Utc>> {
    let mut end = set.include_dates().last().copied();
    for entry in set.entries().iter().filter(|e| !e.is_exclusion()) {
        let entry_end = entry.bounds().1?;
        end = Some(end.map_or(entry_end, |e| e.max(entry_end)));
    }
    end
}
