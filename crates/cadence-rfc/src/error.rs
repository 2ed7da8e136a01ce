use thiserror::Error;

use crate::rfc::ical::expand::ConversionError;
use crate::rfc::ical::parse::ParseError;

/// Invalid engine input, rejected at construction or decode time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("COUNT and UNTIL are mutually exclusive")]
    CountAndUntil,

    #[error("interval must be at least 1")]
    ZeroInterval,

    #[error("count must be at least 1")]
    ZeroCount,

    #[error("{constraint} value {value} is out of range")]
    ConstraintOutOfRange {
        constraint: &'static str,
        value: i32,
    },

    #[error("{constraint} is not allowed with FREQ={frequency}")]
    ConstraintNotAllowed {
        constraint: &'static str,
        frequency: &'static str,
    },

    #[error("range start {start} must be before end {end}")]
    EmptyRange { start: String, end: String },

    #[error("end time is required for an event that is not full-day")]
    MissingEndTime,

    #[error("full-day events carry no end time")]
    UnexpectedEndTime,

    #[error("end {end} must be after start {start}")]
    EndNotAfterStart { start: String, end: String },

    #[error("{0} requires a recurrence rule")]
    MissingRule(&'static str),

    #[error("a rule with date ranges needs at least one inclusion range")]
    MissingInclusionRange,

    #[error("unknown frequency: {0}")]
    UnknownFrequency(String),

    #[error("unknown weekday: {0}")]
    UnknownWeekday(String),

    #[error("invalid instant: {0}")]
    InvalidInstant(String),
}

/// RFC parsing, validation and evaluation errors
#[derive(Error, Debug)]
pub enum RfcError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Timezone error: {0}")]
    Timezone(#[from] ConversionError),

    #[error("Description error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] cadence_core::error::CoreError),
}

impl RfcError {
    /// ## Summary
    /// Returns whether this error rejects the input itself rather than reporting
    /// a failure to compute or decode it.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

pub type RfcResult<T> = std::result::Result<T, RfcError>;
