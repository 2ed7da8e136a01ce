//! iCalendar serializer (RFC 5545).
//!
//! Serializes the component tree to folded CRLF text. Property values are
//! written as stored; callers escape TEXT values when building properties.

use super::escape::escape_param_value;
use super::fold::fold_line;
use crate::rfc::ical::core::{Component, ComponentKind, Parameter, Property, names};

/// Serializes a component (and its children) to a string.
#[must_use]
pub fn serialize_component(component: &Component) -> String {
    let mut result = String::new();

    result.push_str(&fold_line(&format!("BEGIN:{}", component.name)));

    for prop in canonical_property_order(&component.properties, component.kind) {
        result.push_str(&serialize_property(prop));
    }

    // VTIMEZONE blocks first, then children in their given order
    let (timezones, others): (Vec<&Component>, Vec<&Component>) = component
        .children
        .iter()
        .partition(|c| c.kind == Some(ComponentKind::Timezone));
    for child in timezones.into_iter().chain(others) {
        result.push_str(&serialize_component(child));
    }

    result.push_str(&fold_line(&format!("END:{}", component.name)));

    result
}

/// Serializes a property to a folded content line.
#[must_use]
pub fn serialize_property(prop: &Property) -> String {
    let mut line = prop.name.clone();

    for param in canonical_param_order(&prop.params) {
        line.push(';');
        line.push_str(&serialize_parameter(param));
    }

    line.push(':');
    line.push_str(&prop.value);

    fold_line(&line)
}

/// Serializes a parameter to `NAME=value[,value]`.
#[must_use]
pub fn serialize_parameter(param: &Parameter) -> String {
    let values: Vec<String> = param.values.iter().map(|v| escape_param_value(v)).collect();
    format!("{}={}", param.name, values.join(","))
}

/// Returns properties in canonical order for deterministic output.
///
/// Known properties come first in a fixed order; everything else (including
/// X-properties) follows in original order.
fn canonical_property_order(props: &[Property], kind: Option<ComponentKind>) -> Vec<&Property> {
    let order: &[&str] = match kind {
        Some(ComponentKind::Calendar) => &[
            names::VERSION,
            names::PRODID,
            names::CALSCALE,
            names::X_WR_TIMEZONE,
        ],
        Some(ComponentKind::Event) => &[
            names::UID,
            names::DTSTAMP,
            names::DTSTART,
            names::DTEND,
            names::RRULE,
            names::EXRULE,
            names::RDATE,
            names::EXDATE,
        ],
        _ => &[],
    };

    let mut ordered: Vec<&Property> = Vec::with_capacity(props.len());

    for &name in order {
        ordered.extend(props.iter().filter(|p| p.name.eq_ignore_ascii_case(name)));
    }
    ordered.extend(
        props
            .iter()
            .filter(|p| !order.iter().any(|&n| p.name.eq_ignore_ascii_case(n))),
    );

    ordered
}

/// Returns parameters in canonical order (`VALUE`, then `TZID`, then the rest).
fn canonical_param_order(params: &[Parameter]) -> Vec<&Parameter> {
    const ORDER: [&str; 2] = ["VALUE", "TZID"];

    let mut ordered: Vec<&Parameter> = Vec::with_capacity(params.len());
    for name in ORDER {
        ordered.extend(params.iter().filter(|p| p.name.eq_ignore_ascii_case(name)));
    }
    ordered.extend(
        params
            .iter()
            .filter(|p| !ORDER.iter().any(|n| p.name.eq_ignore_ascii_case(n))),
    );
    ordered
}
