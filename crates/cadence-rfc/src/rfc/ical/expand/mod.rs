//! Recurrence evaluation and rule-set combination.
//!
//! - `expander`: lazy per-rule evaluation
//! - `stream`: ascending sources and their k-way merge
//! - `set`: combined inclusion/exclusion streams
//! - `search`: next/previous/first/last lookups
//! - `timezone`: TZID resolution and local-to-UTC conversion

mod expander;
mod search;
mod set;
mod stream;
mod timezone;

pub use expander::{RuleEvaluator, StopReason, evaluate};
pub use search::{OccurrenceSearch, OccurrenceSummary};
pub use set::{CombinedSet, Exclusion, Occurrences, build};
pub use stream::{DateSource, MergedStream, Source};
pub use timezone::{ConversionError, TimeZoneResolver, convert_to_utc, localize};
