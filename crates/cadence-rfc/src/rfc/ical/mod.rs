//! iCalendar recurrence engine (RFC 5545).
//!
//! - `core`: rule, anchor, range and entry values plus the component model
//! - `expand`: rule evaluation, set combination and occurrence search
//! - `parse` / `build`: content-line text in and out
//! - `codec`: mapping between combined sets and `VCALENDAR` text

pub mod build;
pub mod codec;
pub mod core;
pub mod expand;
pub mod parse;

#[cfg(test)]
mod tests;
