//! Errors raised while reading iCalendar text.

use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

/// A located failure to read iCalendar text. Lines and columns are 1-based
/// and refer to the unfolded content line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at line {line}, column {column}{}", detail(.context.as_deref()))]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: usize,
    pub column: usize,
    pub context: Option<String>,
}

impl ParseError {
    #[must_use]
    pub const fn new(kind: ParseErrorKind, line: usize, column: usize) -> Self {
        Self {
            kind,
            line,
            column,
            context: None,
        }
    }

    /// Attaches a short description of the offending input.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

fn detail(context: Option<&str>) -> String {
    context.map_or_else(String::new, |c| format!(": {c}"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    // Content lines
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("malformed content line")]
    InvalidContentLine,
    #[error("missing property name")]
    MissingPropertyName,
    #[error("illegal character in property name")]
    InvalidPropertyName,
    #[error("missing ':' before value")]
    MissingColon,
    #[error("malformed parameter")]
    InvalidParameter,
    #[error("unterminated quoted parameter value")]
    UnclosedQuote,

    // Component structure
    #[error("missing BEGIN:VCALENDAR")]
    MissingBegin,
    #[error("missing END line")]
    MissingEnd,
    #[error("BEGIN/END names do not match")]
    MismatchedComponent,
    #[error("required property is missing")]
    MissingRequiredProperty,

    // Values
    #[error("invalid DATE value")]
    InvalidDate,
    #[error("invalid TIME value")]
    InvalidTime,
    #[error("invalid DATE-TIME value")]
    InvalidDateTime,
    #[error("invalid RECUR value")]
    InvalidRRule,
    #[error("invalid INTEGER value")]
    InvalidInteger,
    #[error("unknown FREQ")]
    InvalidFrequency,
    #[error("unknown weekday")]
    InvalidWeekday,
    /// Well-formed input the engine has no model for, such as PERIOD dates.
    #[error("unsupported value")]
    UnsupportedValue,
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
