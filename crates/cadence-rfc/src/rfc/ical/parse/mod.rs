//! iCalendar parsing (RFC 5545).
//!
//! ## Usage
//!
//! ```rust
//! use cadence_rfc::rfc::ical::parse;
//!
//! let input = "\
//! BEGIN:VCALENDAR\r\n\
//! VERSION:2.0\r\n\
//! BEGIN:VEVENT\r\n\
//! DTSTART:20260101T090000Z\r\n\
//! RRULE:FREQ=DAILY;COUNT=3\r\n\
//! END:VEVENT\r\n\
//! END:VCALENDAR\r\n";
//!
//! let calendar = parse::parse(input).unwrap();
//! assert_eq!(calendar.events().len(), 1);
//! ```
//!
//! ## Features
//!
//! - Handles line folding/unfolding and bare LF line endings
//! - RFC 6868 caret encoding for parameters
//! - RECUR values parsed into rule builders

mod error;
mod lexer;
mod parser;
mod values;

pub use error::{ParseError, ParseErrorKind, ParseResult};
pub use lexer::{parse_content_line, split_lines};
pub use parser::parse;
pub use values::{
    RecurParts, UntilValue, parse_date, parse_datetime, parse_datetime_list, parse_rrule,
    parse_time,
};
