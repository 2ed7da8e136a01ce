//! Sorted instant sources and their k-way merge.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use chrono::{DateTime, Utc};

use super::{RuleEvaluator, StopReason};

/// A fixed list of instants, replayed in order.
#[derive(Debug, Clone)]
pub struct DateSource {
    dates: std::vec::IntoIter<DateTime<Utc>>,
    window_end: Option<DateTime<Utc>>,
    stop: Option<StopReason>,
}

impl Iterator for DateSource {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.stop.is_some() {
            return None;
        }
        match self.dates.next() {
            None => {
                self.stop = Some(StopReason::Exhausted);
                None
            }
            Some(date) if self.window_end.is_some_and(|end| date > end) => {
                self.stop = Some(StopReason::Window);
                None
            }
            Some(date) => Some(date),
        }
    }
}

/// One ascending input of a merged stream.
#[derive(Debug, Clone)]
pub enum Source<'a> {
    Rule(RuleEvaluator<'a>),
    Dates(DateSource),
}

impl Source<'_> {
    /// A source over explicit instants. Input order does not matter.
    #[must_use]
    pub fn dates(mut dates: Vec<DateTime<Utc>>, window_end: Option<DateTime<Utc>>) -> Self {
        dates.sort_unstable();
        dates.dedup();
        Self::Dates(DateSource {
            dates: dates.into_iter(),
            window_end,
            stop: None,
        })
    }

    #[must_use]
    pub const fn stop_reason(&self) -> Option<StopReason> {
        match self {
            Self::Rule(rule) => rule.stop_reason(),
            Self::Dates(dates) => dates.stop,
        }
    }
}

impl Iterator for Source<'_> {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Rule(rule) => rule.next(),
            Self::Dates(dates) => dates.next(),
        }
    }
}

/// Lazy ascending union of several sources, with duplicates removed.
#[derive(Debug, Clone)]
pub struct MergedStream<'a> {
    sources: Vec<Source<'a>>,
    heap: BinaryHeap<Reverse<(DateTime<Utc>, usize)>>,
    primed: bool,
    last: Option<DateTime<Utc>>,
}

impl<'a> MergedStream<'a> {
    #[must_use]
    pub fn new(sources: Vec<Source<'a>>) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(sources.len()),
            sources,
            primed: false,
            last: None,
        }
    }

    /// An empty stream.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    fn pull(&mut self, index: usize) {
        if let Some(instant) = self.sources.get_mut(index).and_then(Iterator::next) {
            self.heap.push(Reverse((instant, index)));
        }
    }

    /// ## Summary
    /// Returns whether every source ran to its natural end.
    ///
    /// Only meaningful once the stream has returned `None`; a source cut off
    /// by the window is not complete.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.sources
            .iter()
            .all(|s| s.stop_reason() == Some(StopReason::Exhausted))
    }

    #[must_use]
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }
}

impl Iterator for MergedStream<'_> {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.primed {
            self.primed = true;
            for index in 0..self.sources.len() {
                self.pull(index);
            }
        }

        while let Some(Reverse((instant, index))) = self.heap.pop() {
            self.pull(index);
            if self.last.is_some_and(|last| instant <= last) {
                continue;
            }
            self.last = Some(instant);
            return Some(instant);
        }
        None
    }
}
