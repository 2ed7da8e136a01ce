//! `VCALENDAR` text to combined set.

use chrono::{DateTime, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;

use super::ROLE_DATES;
use crate::error::RfcResult;
use crate::rfc::ical::core::{AnchorPoint, Component, Property, RuleSetEntry, RuleSpec, names};
use crate::rfc::ical::expand::{
    CombinedSet, Exclusion, TimeZoneResolver, build, convert_to_utc, localize,
};
use crate::rfc::ical::parse::{
    ParseError, ParseErrorKind, UntilValue, parse, parse_date, parse_datetime,
    parse_datetime_list, parse_rrule,
};

/// ## Summary
/// Decodes RFC 5545 text into a combined set.
///
/// ## Errors
/// Returns a parse error for malformed text, a validation error for
/// contradictory rules (e.g. `COUNT` with `UNTIL`), and a timezone error for
/// unknown TZIDs.
pub fn decode(text: &str) -> RfcResult<CombinedSet> {
    decode_with_resolver(text, &mut TimeZoneResolver::new())
}

/// ## Summary
/// Decodes RFC 5545 text, reusing the caller's timezone cache.
///
/// ## Errors
/// Same as [`decode`].
#[tracing::instrument(skip(text, resolver), fields(text_len = text.len()))]
pub fn decode_with_resolver(text: &str, resolver: &mut TimeZoneResolver) -> RfcResult<CombinedSet> {
    let calendar = parse(text)?;

    let timezone = match calendar.property_value(names::X_WR_TIMEZONE) {
        Some(tzid) => resolver.resolve(tzid)?,
        None => Tz::UTC,
    };

    let mut decoder = Decoder {
        resolver,
        timezone,
        entries: Vec::new(),
        include_dates: Vec::new(),
        exclude_dates: Vec::new(),
    };
    for event in calendar.events() {
        decoder.event(event)?;
    }

    tracing::debug!(
        %timezone,
        entries = decoder.entries.len(),
        include_dates = decoder.include_dates.len(),
        exclude_dates = decoder.exclude_dates.len(),
        "Decoded calendar"
    );

    Ok(build(
        timezone,
        decoder.entries,
        decoder.include_dates,
        decoder.exclude_dates.into_iter().map(Exclusion::Instant).collect(),
    ))
}

struct Decoder<'r> {
    resolver: &'r mut TimeZoneResolver,
    timezone: Tz,
    entries: Vec<RuleSetEntry>,
    include_dates: Vec<DateTime<Utc>>,
    exclude_dates: Vec<DateTime<Utc>>,
}

impl Decoder<'_> {
    fn event(&mut self, event: &Component) -> RfcResult<()> {
        let is_dates_block = event
            .property_value(names::X_CADENCE_ROLE)
            .is_some_and(|role| role.eq_ignore_ascii_case(ROLE_DATES));

        let anchor = if is_dates_block {
            None
        } else {
            Some(self.anchor(event)?)
        };

        // DATE-valued RDATE/EXDATE take the anchor's time of day
        let time = anchor
            .as_ref()
            .map_or(NaiveTime::MIN, |a| a.start_local().time());
        for property in event.get_properties(names::RDATE) {
            let dates = self.instants(property, time)?;
            self.include_dates.extend(dates);
        }
        for property in event.get_properties(names::EXDATE) {
            let dates = self.instants(property, time)?;
            self.exclude_dates.extend(dates);
        }

        let Some(anchor) = anchor else {
            return Ok(());
        };

        let inclusions = event.get_properties(names::RRULE);
        let exclusions = event.get_properties(names::EXRULE);

        for property in &inclusions {
            let rule = Self::rule(property, &anchor)?;
            self.entries.push(RuleSetEntry::event(anchor.clone(), Some(rule)));
        }
        for property in &exclusions {
            let rule = Self::rule(property, &anchor)?;
            self.entries.push(RuleSetEntry::exclusion_rule(anchor.clone(), rule));
        }
        if inclusions.is_empty() && exclusions.is_empty() {
            self.entries.push(RuleSetEntry::event(anchor, None));
        }
        Ok(())
    }

    fn anchor(&mut self, event: &Component) -> RfcResult<AnchorPoint> {
        let dtstart = event.get_property(names::DTSTART).ok_or_else(|| {
            ParseError::new(ParseErrorKind::MissingRequiredProperty, event.line, 1)
                .with_context("VEVENT without DTSTART")
        })?;

        let timezone = match dtstart.tzid() {
            Some(tzid) => self.resolver.resolve(tzid)?,
            None => self.timezone,
        };

        if dtstart.is_date_valued() {
            let date = parse_date(&dtstart.value, dtstart.line, value_column(dtstart))?;
            if event.get_property(names::DTEND).is_some() {
                tracing::trace!("Ignoring DTEND of a full-day event");
            }
            return Ok(AnchorPoint::full_day(date, timezone));
        }

        let (start, is_utc) = parse_datetime(&dtstart.value, dtstart.line, value_column(dtstart))?;
        let anchor = if is_utc {
            AnchorPoint::new(start, Tz::UTC)
        } else {
            AnchorPoint::new(start, timezone)
        };

        match event.get_property(names::DTEND) {
            Some(dtend) => {
                let end = self.instant(dtend, anchor.timezone())?;
                Ok(anchor.with_end_instant(end)?)
            }
            None => Ok(anchor),
        }
    }

    /// Resolves a single DATE-TIME property to an instant.
    fn instant(&mut self, property: &Property, default_tz: Tz) -> RfcResult<DateTime<Utc>> {
        let (local, is_utc) =
            parse_datetime(&property.value, property.line, value_column(property))?;
        if is_utc {
            return Ok(local.and_utc());
        }
        match property.tzid() {
            Some(tzid) => Ok(convert_to_utc(local, tzid, self.resolver)?),
            None => Ok(localize(local, default_tz)),
        }
    }

    /// Resolves every entry of an RDATE/EXDATE property.
    fn instants(&mut self, property: &Property, time: NaiveTime) -> RfcResult<Vec<DateTime<Utc>>> {
        let timezone = match property.tzid() {
            Some(tzid) => self.resolver.resolve(tzid)?,
            None => self.timezone,
        };
        let date_valued = property.is_date_valued();

        let values = parse_datetime_list(
            &property.value,
            date_valued,
            property.line,
            value_column(property),
        )?;
        Ok(values
            .into_iter()
            .map(|(local, is_utc)| {
                let local = if date_valued {
                    local.date().and_time(time)
                } else {
                    local
                };
                if is_utc {
                    local.and_utc()
                } else {
                    localize(local, timezone)
                }
            })
            .collect())
    }

    /// Parses an RRULE/EXRULE against the anchor it belongs to.
    fn rule(property: &Property, anchor: &AnchorPoint) -> RfcResult<RuleSpec> {
        let recur = parse_rrule(&property.value, property.line, value_column(property))?;
        let mut builder = recur.builder;
        if let Some(until) = recur.until {
            builder = builder.with_until(resolve_until(until, anchor));
        }
        Ok(builder.build()?)
    }
}

/// DATE `UNTIL` is inclusive through the end of that local day; a floating
/// DATE-TIME is read in the anchor's timezone.
fn resolve_until(until: UntilValue, anchor: &AnchorPoint) -> DateTime<Utc> {
    let local: NaiveDateTime = match until {
        UntilValue::DateTime(local, true) => return local.and_utc(),
        UntilValue::DateTime(local, false) => local,
        UntilValue::Date(date) => date.and_time(end_of_day()),
    };
    localize(local, anchor.timezone())
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)
}

/// 1-based column where the property value starts, as far as it can be
/// reconstructed from the unfolded line.
fn value_column(property: &Property) -> usize {
    let params: usize = property
        .params
        .iter()
        .map(|p| {
            let values: usize = p.values.iter().map(String::len).sum();
            p.name.len() + 2 + values + p.values.len().saturating_sub(1)
        })
        .sum();
    property.name.len() + params + 2
}
