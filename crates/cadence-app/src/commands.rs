//! Subcommand bodies. Each takes the input text and returns what is printed.

use anyhow::{Context, Result};
use cadence_core::config::Settings;
use cadence_rfc::rfc::description::RuleSetDescription;
use cadence_rfc::rfc::ical::codec::{EncodeOptions, decode_with_resolver, encode};
use cadence_rfc::rfc::ical::expand::{CombinedSet, OccurrenceSearch, TimeZoneResolver};
use chrono::{DateTime, Utc};

/// ## Summary
/// Builds the described set and recomputes its occurrence summary at `at`.
///
/// ## Errors
/// Returns an error if the description is invalid or the search settings are
/// unusable.
#[tracing::instrument(skip(description, settings))]
pub fn recompute(description: &str, at: DateTime<Utc>, settings: &Settings) -> Result<String> {
    let set = build_set(description, settings)?;
    let search = OccurrenceSearch::from_config(&settings.search)?;

    let summary = search.recompute(&set, at);
    tracing::info!(?summary, "Recomputed occurrences");

    Ok(serde_json::to_string_pretty(&summary)?)
}

/// ## Summary
/// Builds the described set and encodes it as iCalendar text.
///
/// ## Errors
/// Returns an error if the description is invalid.
#[tracing::instrument(skip(description, settings))]
pub fn export(description: &str, dtstamp: DateTime<Utc>, settings: &Settings) -> Result<String> {
    let set = build_set(description, settings)?;
    Ok(encode(
        &set,
        &EncodeOptions::from_config(&settings.calendar, dtstamp),
    ))
}

/// ## Summary
/// Decodes iCalendar text and describes the resulting set.
///
/// ## Errors
/// Returns an error if the text cannot be decoded.
#[tracing::instrument(skip(text), fields(text_len = text.len()))]
pub fn import(text: &str) -> Result<String> {
    let set = decode_with_resolver(text, &mut TimeZoneResolver::new())
        .context("Failed to decode calendar")?;
    tracing::info!(entries = set.entries().len(), "Decoded calendar");

    Ok(RuleSetDescription::from_set(&set).to_json()?)
}

fn build_set(description: &str, settings: &Settings) -> Result<CombinedSet> {
    let mut resolver = TimeZoneResolver::new();
    let default_timezone = resolver
        .resolve(&settings.calendar.default_timezone)
        .context("Invalid calendar.default_timezone")?;

    let description =
        RuleSetDescription::from_json(description).context("Failed to read rule-set description")?;
    let set = description
        .build(&mut resolver, default_timezone)
        .context("Invalid rule-set description")?;
    Ok(set)
}
