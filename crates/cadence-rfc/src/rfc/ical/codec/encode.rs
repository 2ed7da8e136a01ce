//! Combined set to `VCALENDAR` text.

use cadence_core::config::CalendarConfig;
use cadence_core::constants::DEFAULT_PRODID;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

use super::ROLE_DATES;
use crate::rfc::ical::build::{
    escape_text, format_date, format_local, format_utc, format_utc_list, serialize_component,
    serialize_property,
};
use crate::rfc::ical::core::{
    AnchorPoint, Component, DateRange, EntrySource, Parameter, Property, RuleSetEntry, RuleSpec,
    UntilFormat, names,
};
use crate::rfc::ical::expand::{CombinedSet, Exclusion, RuleEvaluator};

/// Caller-supplied values written into every export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    /// `PRODID` of the calendar.
    pub prodid: String,
    /// `DTSTAMP` of every VEVENT. Never read from the clock.
    pub dtstamp: DateTime<Utc>,
}

impl EncodeOptions {
    #[must_use]
    pub fn new(dtstamp: DateTime<Utc>) -> Self {
        Self {
            prodid: DEFAULT_PRODID.to_string(),
            dtstamp,
        }
    }

    /// Options using the `calendar` settings section.
    #[must_use]
    pub fn from_config(config: &CalendarConfig, dtstamp: DateTime<Utc>) -> Self {
        Self {
            prodid: config.prodid.clone(),
            dtstamp,
        }
    }
}

/// ## Summary
/// Encodes a combined set as RFC 5545 text.
///
/// Each anchored entry becomes one VEVENT, each window of a multi-range
/// entry becomes one VEVENT whose `UNTIL` is capped at the window end, and
/// set-level dates go on a VEVENT marked `X-CADENCE-ROLE:DATES`. Exclusion
/// ranges are flattened into `EXDATE` instants.
#[must_use]
#[tracing::instrument(skip(set, options), fields(entries = set.entries().len()))]
pub fn encode(set: &CombinedSet, options: &EncodeOptions) -> String {
    let timezone = set.timezone();
    let mut calendar = Component::calendar();
    calendar.add_property(Property::new(names::VERSION, "2.0"));
    calendar.add_property(Property::new(names::PRODID, escape_text(&options.prodid)));
    calendar.add_property(Property::new(names::CALSCALE, "GREGORIAN"));
    calendar.add_property(Property::new(names::X_WR_TIMEZONE, escape_text(timezone.name())));

    let mut stray_exclusions = Vec::new();
    let mut blocks = Vec::new();
    for entry in set.entries() {
        let emitted = encode_entry(entry, timezone, &mut blocks);
        if !emitted {
            // Nowhere to attach them, so they ride on the dates block
            stray_exclusions.extend(entry.excluded_dates());
        }
    }

    if let Some(dates) = dates_block(set, stray_exclusions) {
        blocks.push(dates);
    }

    tracing::debug!(events = blocks.len(), "Encoded combined set");

    for (index, mut block) in blocks.into_iter().enumerate() {
        let uid = block_uid(&block, index);
        block.add_property(Property::new(names::UID, uid.to_string()));
        block.add_property(Property::new(names::DTSTAMP, format_utc(options.dtstamp)));
        calendar.add_child(block);
    }

    serialize_component(&calendar)
}

/// Appends the VEVENTs of one entry. Returns whether any was emitted.
fn encode_entry(entry: &RuleSetEntry, set_timezone: Tz, blocks: &mut Vec<Component>) -> bool {
    let rule_property = if entry.is_exclusion() {
        names::EXRULE
    } else {
        names::RRULE
    };
    let excluded = entry.excluded_dates();

    match entry.source() {
        EntrySource::Anchored { anchor, .. } => {
            let mut block = Component::event();
            add_anchor(&mut block, anchor, set_timezone);
            if let Some(rule) = entry.rule() {
                block.add_property(Property::new(
                    rule_property,
                    rule.to_ical_value(until_format(rule, anchor)),
                ));
            }
            add_instants(&mut block, names::EXDATE, &excluded);
            blocks.push(block);
            true
        }
        EntrySource::Ranged { .. } => {
            let Some(rule) = entry.rule() else {
                return false;
            };
            let mut emitted = false;
            for window in entry.windows() {
                let Some(bounded) = window_rule(rule, window) else {
                    tracing::trace!(start = %window.start_local(), "Skipping empty window");
                    continue;
                };
                let mut block = Component::event();
                block.add_property(local_property(
                    names::DTSTART,
                    window.start_local(),
                    window.timezone(),
                ));
                block.add_property(Property::new(
                    rule_property,
                    bounded.to_ical_value(UntilFormat::Utc),
                ));
                add_instants(&mut block, names::EXDATE, &excluded);
                blocks.push(block);
                emitted = true;
            }
            emitted
        }
    }
}

/// The rule as evaluated inside `window`, with the window end folded into
/// `UNTIL`. Counted rules end at their last in-window occurrence; `None`
/// when the window produces nothing.
fn window_rule(rule: &RuleSpec, window: &DateRange) -> Option<RuleSpec> {
    if rule.count().is_none() {
        return Some(rule.bounded_by(window.end()));
    }
    let last = RuleEvaluator::new(rule, window.start_local(), window.timezone())
        .with_implicit_until(window.end())
        .last()?;
    Some(rule.ending_at(last))
}

/// DATE-form `UNTIL` is only valid alongside a DATE `DTSTART`.
fn until_format(rule: &RuleSpec, anchor: &AnchorPoint) -> UntilFormat {
    if anchor.is_full_day() && rule.frequency().is_date_based() && !rule.by().has_time_constraints()
    {
        UntilFormat::Date(anchor.timezone())
    } else {
        UntilFormat::Utc
    }
}

fn add_anchor(block: &mut Component, anchor: &AnchorPoint, set_timezone: Tz) {
    if anchor.is_full_day() {
        let mut params = vec![Parameter::value_type("DATE")];
        if anchor.timezone() != set_timezone {
            params.push(Parameter::tzid(anchor.timezone().name()));
        }
        block.add_property(Property::with_params(
            names::DTSTART,
            params,
            format_date(anchor.start_local().date()),
        ));
        return;
    }

    block.add_property(local_property(
        names::DTSTART,
        anchor.start_local(),
        anchor.timezone(),
    ));
    if let Some(end) = anchor.end_local() {
        block.add_property(local_property(names::DTEND, end, anchor.timezone()));
    }
}

/// `…Z` for UTC, `;TZID=…` otherwise.
fn local_property(name: &str, local: chrono::NaiveDateTime, timezone: Tz) -> Property {
    if timezone == Tz::UTC {
        return Property::new(name, format!("{}Z", format_local(local)));
    }
    Property::with_params(
        name,
        vec![Parameter::tzid(timezone.name())],
        format_local(local),
    )
}

fn add_instants(block: &mut Component, name: &str, instants: &[DateTime<Utc>]) {
    if instants.is_empty() {
        return;
    }
    let mut sorted = instants.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    block.add_property(Property::new(name, format_utc_list(&sorted)));
}

/// The VEVENT holding set-level include and exclude dates, if there are any.
fn dates_block(set: &CombinedSet, stray_exclusions: Vec<DateTime<Utc>>) -> Option<Component> {
    let mut excluded: Vec<DateTime<Utc>> = set
        .exclusions()
        .iter()
        .flat_map(Exclusion::instants)
        .chain(stray_exclusions)
        .collect();
    excluded.sort_unstable();
    excluded.dedup();

    let included = set.include_dates();
    let start = included.first().into_iter().chain(excluded.first()).min()?;

    let mut block = Component::event();
    block.add_property(Property::new(names::DTSTART, format_utc(*start)));
    add_instants(&mut block, names::RDATE, included);
    add_instants(&mut block, names::EXDATE, &excluded);
    block.add_property(Property::new(names::X_CADENCE_ROLE, ROLE_DATES));
    Some(block)
}

/// Deterministic UUIDv5 over the block's position and content.
fn block_uid(block: &Component, index: usize) -> Uuid {
    let mut content = index.to_string();
    for property in &block.properties {
        content.push_str(&serialize_property(property));
    }
    Uuid::new_v5(&Uuid::NAMESPACE_OID, content.as_bytes())
}
