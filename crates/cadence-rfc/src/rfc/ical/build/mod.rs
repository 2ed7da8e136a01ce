//! iCalendar serialization (RFC 5545).
//!
//! This module provides serializers for iCalendar content:
//! - Escape: Text and parameter value escaping
//! - Fold: Content line folding at 75 octets
//! - Serializer: Component tree serialization with canonical ordering
//! - Values: DATE / DATE-TIME formatting

mod escape;
mod fold;
mod serializer;
mod values;

pub use escape::{escape_param_value, escape_text};
pub use fold::fold_line;
pub use serializer::{serialize_component, serialize_parameter, serialize_property};
pub use values::{format_date, format_local, format_utc, format_utc_list};
