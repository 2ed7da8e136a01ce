//! Recurrence evaluation, combination and RFC 5545 interchange.

pub mod error;
pub mod rfc;
