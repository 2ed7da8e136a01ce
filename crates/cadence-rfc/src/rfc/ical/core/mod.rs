//! iCalendar core models.
//!
//! Recurrence values are validated at construction and immutable afterwards:
//! - `RuleSpec`: frequency, interval, termination and typed by-constraints
//! - `AnchorPoint`: the local wall-clock start a rule is evaluated from
//! - `DateRange`: an exclusion span or an inclusion window
//! - `RuleSetEntry`: a rule bound to either an anchor or a set of windows
//!
//! The component types are the text-level tree used by the parser and
//! serializer.

mod anchor;
mod component;
mod entry;
mod property;
mod range;
mod rule;

pub use anchor::AnchorPoint;
pub use component::{Component, ComponentKind};
pub use entry::{EntrySource, RuleSetEntry};
pub use property::{Parameter, Property, names};
pub use range::{DateRange, RangeKind};
pub use rule::{
    ByConstraint, ByRules, Frequency, RuleSpec, RuleSpecBuilder, Termination, UntilFormat,
    Weekday, WeekdayNum,
};
