use cadence_rfc::rfc::ical::core::{AnchorPoint, Frequency, RuleSetEntry, RuleSpec};
use cadence_rfc::rfc::ical::expand::{Exclusion, build};
use chrono_tz::Tz;

use crate::helpers::{daily_event, date, local, utc};

#[test_log::test]
fn exclusion_range_removes_whole_days() {
    // Daily over D0..=D13 with D6..=D9 excluded
    let entry = daily_event(local(2026, 6, 1, 9), Tz::UTC, Some(14))
        .with_exclusion(date(2026, 6, 7), date(2026, 6, 10))
        .unwrap();
    let set = build(Tz::UTC, vec![entry], Vec::new(), Vec::new());

    let all: Vec<_> = set.occurrences(None).collect();
    let expected: Vec<_> = (1..=6)
        .chain(11..=14)
        .map(|d| utc(2026, 6, d, 9))
        .collect();
    assert_eq!(all, expected);
    assert_eq!(all.len(), 10);
}

#[test_log::test]
fn exclusion_ranges_step_daily_under_hourly_rules() {
    let rule = RuleSpec::builder(Frequency::Hourly)
        .with_count(48)
        .build()
        .unwrap();
    let anchor = AnchorPoint::new(local(2026, 6, 1, 9), Tz::UTC)
        .with_end(local(2026, 6, 1, 10))
        .unwrap();
    let entry = RuleSetEntry::event(anchor, Some(rule))
        .with_exclusion(date(2026, 6, 1), date(2026, 6, 2))
        .unwrap();
    let set = build(Tz::UTC, vec![entry], Vec::new(), Vec::new());

    let all: Vec<_> = set.occurrences(None).collect();
    assert_eq!(all.len(), 46);
    assert!(!all.contains(&utc(2026, 6, 1, 9)));
    assert!(!all.contains(&utc(2026, 6, 2, 9)));
    assert!(all.contains(&utc(2026, 6, 1, 10)));
}

#[test_log::test]
fn exclusion_rule_and_dates_win() {
    let inclusion = daily_event(local(2026, 1, 1, 8), Tz::UTC, Some(10));
    let weekly = RuleSpec::builder(Frequency::Weekly).build().unwrap();
    let exclusion = RuleSetEntry::exclusion_rule(AnchorPoint::new(local(2026, 1, 1, 8), Tz::UTC), weekly);

    let set = build(
        Tz::UTC,
        vec![inclusion, exclusion],
        vec![utc(2026, 1, 3, 8), utc(2026, 2, 1, 8)],
        vec![Exclusion::Instant(utc(2026, 1, 4, 8)), Exclusion::Instant(utc(2026, 2, 1, 8))],
    );

    let all: Vec<_> = set.occurrences(None).collect();
    assert_eq!(
        all,
        vec![
            utc(2026, 1, 2, 8),
            utc(2026, 1, 3, 8),
            utc(2026, 1, 5, 8),
            utc(2026, 1, 6, 8),
            utc(2026, 1, 7, 8),
            utc(2026, 1, 9, 8),
            utc(2026, 1, 10, 8),
        ]
    );
}

#[test_log::test]
fn count_is_exact_for_every_frequency() {
    for frequency in [
        Frequency::Yearly,
        Frequency::Monthly,
        Frequency::Weekly,
        Frequency::Daily,
        Frequency::Hourly,
        Frequency::Minutely,
        Frequency::Secondly,
    ] {
        for count in [1, 7, 25] {
            let rule = RuleSpec::builder(frequency).with_count(count).build().unwrap();
            let anchor = AnchorPoint::new(local(2026, 1, 31, 23), Tz::UTC);
            let entry = RuleSetEntry::event(anchor, Some(rule));
            let set = build(Tz::UTC, vec![entry], Vec::new(), Vec::new());

            let emitted = set.occurrences(None).count();
            assert_eq!(emitted, usize::try_from(count).unwrap(), "{frequency} COUNT={count}");
        }
    }
}

#[test_log::test]
fn dst_keeps_local_noon() {
    let tz: Tz = "Europe/Berlin".parse().unwrap();
    let set = build(
        tz,
        vec![daily_event(local(2026, 3, 27, 12), tz, Some(5))],
        Vec::new(),
        Vec::new(),
    );

    let all: Vec<_> = set.occurrences(None).collect();
    let local_hours: Vec<_> = all
        .iter()
        .map(|t| t.with_timezone(&tz).format("%H:%M").to_string())
        .collect();
    assert_eq!(local_hours, vec!["12:00"; 5]);
    // CET before 29 March, CEST after
    assert_eq!(all[0], utc(2026, 3, 27, 11));
    assert_eq!(all[4], utc(2026, 3, 31, 10));
}
