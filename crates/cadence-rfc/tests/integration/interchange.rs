use cadence_rfc::error::{RfcError, ValidationError};
use cadence_rfc::rfc::description::RuleSetDescription;
use cadence_rfc::rfc::ical::codec::{EncodeOptions, decode, encode};
use cadence_rfc::rfc::ical::expand::{CombinedSet, OccurrenceSearch, TimeZoneResolver};
use cadence_rfc::rfc::ical::parse::ParseErrorKind;
use chrono_tz::Tz;

use crate::helpers::utc;

const DESCRIPTION: &str = r#"{
    "timezone": "Europe/Amsterdam",
    "events": [
        {
            "startTime": "2026-01-07T19:00:00",
            "endTime": "2026-01-07T21:00:00",
            "rule": {"frequency": "WEEKLY", "interval": 2, "byWeekday": ["WE"], "count": 20},
            "exclusions": [{"startDate": "2026-02-01", "endDate": "2026-02-10"}]
        },
        {
            "startTime": "2026-01-01",
            "isFullDay": true,
            "rule": {"frequency": "MONTHLY", "byMonthDay": [1, -1]}
        }
    ],
    "rules": [
        {
            "rule": {"frequency": "DAILY", "byHour": [8, 17]},
            "dateRanges": [
                {"startDate": "2026-07-01T00:00:00", "endDate": "2026-07-08T00:00:00"},
                {"startDate": "2026-07-04", "endDate": "2026-07-05", "isExclusion": true}
            ]
        }
    ],
    "includeDates": ["2026-12-24T18:00:00"],
    "excludeDates": ["2026-03-31T00:00:00"]
}"#;

fn described() -> CombinedSet {
    RuleSetDescription::from_json(DESCRIPTION)
        .unwrap()
        .build(&mut TimeZoneResolver::new(), Tz::UTC)
        .unwrap()
}

fn options() -> EncodeOptions {
    EncodeOptions::new(utc(2026, 1, 1, 0))
}

#[test_log::test]
fn decode_of_encode_keeps_the_stream() {
    let set = described();
    let text = encode(&set, &options());
    let back = decode(&text).unwrap();

    let (from, to) = (utc(2025, 12, 1, 0), utc(2028, 1, 1, 0));
    let expected = set.between(from, to);
    assert!(expected.len() > 40);
    assert_eq!(back.between(from, to), expected);

    // Explicit dates survive
    assert!(expected.contains(&utc(2026, 12, 24, 17)));
    assert!(!expected.contains(&utc(2026, 3, 30, 22)));
}

#[test_log::test]
fn decode_of_encode_keeps_the_summary() {
    let set = described();
    let back = decode(&encode(&set, &options())).unwrap();
    let search = OccurrenceSearch::default();

    for reference in [utc(2026, 1, 1, 0), utc(2026, 7, 4, 12), utc(2027, 6, 1, 0)] {
        let original = search.recompute(&set, reference);
        let restored = search.recompute(&back, reference);
        assert_eq!(restored.next, original.next);
        assert_eq!(restored.previous, original.previous);
        assert_eq!(restored.first, original.first);
    }
}

#[test_log::test]
fn empty_set_encodes_no_events() {
    let text = encode(&CombinedSet::empty(Tz::UTC), &options());
    assert!(text.starts_with("BEGIN:VCALENDAR\r\n"));
    assert!(!text.contains("BEGIN:VEVENT"));

    let back = decode(&text).unwrap();
    let summary = OccurrenceSearch::default().recompute(&back, utc(2026, 1, 1, 0));
    assert_eq!(summary.next, None);
    assert_eq!(summary.last, None);
}

#[test_log::test]
fn malformed_text_is_located() {
    let text = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nDTSTART:2026013T090000Z\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
    let err = decode(text).unwrap_err();
    assert!(!err.is_validation());
    match err {
        RfcError::Parse(parse) => {
            assert_eq!(parse.kind, ParseErrorKind::InvalidDate);
            assert_eq!(parse.line, 3);
        }
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test_log::test]
fn contradictory_rule_is_a_validation_error() {
    let text = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nDTSTART:20260101T090000Z\r\nRRULE:FREQ=DAILY;COUNT=2;UNTIL=20260201T000000Z\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
    let err = decode(text).unwrap_err();
    assert!(err.is_validation());
    assert!(matches!(
        err,
        RfcError::Validation(ValidationError::CountAndUntil)
    ));
}

#[test_log::test]
fn import_then_describe_then_build() {
    let set = described();
    let back = decode(&encode(&set, &options())).unwrap();

    let described_again = RuleSetDescription::from_set(&back);
    let json = described_again.to_json().unwrap();
    let rebuilt = RuleSetDescription::from_json(&json)
        .unwrap()
        .build(&mut TimeZoneResolver::new(), Tz::UTC)
        .unwrap();

    let (from, to) = (utc(2025, 12, 1, 0), utc(2028, 1, 1, 0));
    assert_eq!(rebuilt.between(from, to), set.between(from, to));
}
