//! Mapping between combined sets and RFC 5545 `VCALENDAR` text.
//!
//! `decode(encode(set))` reproduces the occurrence stream of `set`. Exclusion
//! ranges and entry-owned dates come back as set-level exclusions, and
//! multi-range entries come back as one anchored entry per window.

mod decode;
mod encode;

pub use decode::{decode, decode_with_resolver};
pub use encode::{EncodeOptions, encode};

/// `X-CADENCE-ROLE` value of the block carrying set-level dates.
pub const ROLE_DATES: &str = "DATES";
