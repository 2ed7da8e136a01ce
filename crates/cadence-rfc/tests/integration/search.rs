use cadence_rfc::rfc::ical::core::{AnchorPoint, DateRange, Frequency, RuleSetEntry, RuleSpec};
use cadence_rfc::rfc::ical::expand::{CombinedSet, Exclusion, OccurrenceSearch, OccurrenceSummary, build};
use chrono::{DateTime, TimeDelta, Utc};
use chrono_tz::Tz;

use crate::helpers::{daily_event, local, utc};

fn search() -> OccurrenceSearch {
    OccurrenceSearch::new(30, 4).unwrap()
}

#[test_log::test]
fn next_and_previous_are_strict() {
    let set = build(
        Tz::UTC,
        vec![daily_event(local(2026, 1, 1, 9), Tz::UTC, None)],
        Vec::new(),
        vec![Exclusion::Instant(utc(2026, 1, 6, 9))],
    );
    let search = search();

    let on = utc(2026, 1, 4, 9);
    assert_eq!(search.next(&set, on), Some(utc(2026, 1, 5, 9)));
    assert_eq!(search.previous(&set, on), Some(utc(2026, 1, 3, 9)));

    // Neighbours of an excluded instant skip it
    assert_eq!(search.next(&set, utc(2026, 1, 5, 9)), Some(utc(2026, 1, 7, 9)));
    assert_eq!(search.previous(&set, utc(2026, 1, 7, 9)), Some(utc(2026, 1, 5, 9)));

    assert_eq!(search.previous(&set, utc(2026, 1, 1, 9)), None);
    assert_eq!(search.next(&set, utc(2025, 6, 1, 0)), Some(utc(2026, 1, 1, 9)));
}

#[test_log::test]
fn strictness_holds_across_references() {
    let tz: Tz = "America/Chicago".parse().unwrap();
    let rule = RuleSpec::builder(Frequency::Weekly).build().unwrap();
    let set = build(
        tz,
        vec![RuleSetEntry::event(AnchorPoint::new(local(2026, 2, 2, 18), tz), Some(rule))],
        vec![utc(2026, 2, 4, 0)],
        vec![Exclusion::Instant(utc(2026, 2, 17, 0))],
    );
    let search = search();

    let mut reference = utc(2026, 1, 20, 0);
    while reference < utc(2026, 4, 1, 0) {
        if let Some(next) = search.next(&set, reference) {
            assert!(next > reference);
        }
        if let Some(previous) = search.previous(&set, reference) {
            assert!(previous < reference);
        }
        reference += TimeDelta::hours(7);
    }
}

#[test_log::test]
fn unbounded_rule_has_first_but_no_last() {
    let set = build(
        Tz::UTC,
        vec![daily_event(local(2026, 1, 1, 9), Tz::UTC, None)],
        Vec::new(),
        Vec::new(),
    );
    let search = search();

    assert_eq!(search.first(&set), Some(utc(2026, 1, 1, 9)));
    assert_eq!(search.last(&set), None);
}

#[test_log::test]
fn cancelled_unbounded_rule_terminates() {
    let daily = RuleSpec::builder(Frequency::Daily).build().unwrap();
    let anchor = AnchorPoint::new(local(2026, 1, 1, 9), Tz::UTC);
    let set = build(
        Tz::UTC,
        vec![
            RuleSetEntry::event(anchor.clone(), Some(daily.clone())),
            RuleSetEntry::exclusion_rule(anchor, daily),
        ],
        Vec::new(),
        Vec::new(),
    );
    let search = OccurrenceSearch::new(10, 2).unwrap();

    assert_eq!(search.first(&set), None);
    assert_eq!(search.last(&set), None);
    assert_eq!(search.next(&set, utc(2026, 3, 1, 0)), None);
}

#[test_log::test]
fn bounded_set_has_last() {
    let set = build(
        Tz::UTC,
        vec![daily_event(local(2026, 1, 1, 9), Tz::UTC, Some(400))],
        vec![utc(2024, 5, 5, 5)],
        Vec::new(),
    );
    let search = OccurrenceSearch::default();

    assert_eq!(search.first(&set), Some(utc(2024, 5, 5, 5)));
    assert_eq!(
        search.last(&set),
        Some(utc(2026, 1, 1, 9) + TimeDelta::days(399))
    );
}

#[test_log::test]
fn multi_range_rule_is_bounded_by_its_windows() {
    let tz: Tz = "Australia/Sydney".parse().unwrap();
    let rule = RuleSpec::builder(Frequency::Weekly).build().unwrap();
    let windows = vec![
        DateRange::window(local(2026, 1, 5, 7), local(2026, 2, 1, 0), tz).unwrap(),
        DateRange::window(local(2026, 6, 1, 7), local(2026, 6, 20, 0), tz).unwrap(),
    ];
    let entry = RuleSetEntry::ranged(rule, windows, false).unwrap();
    let set = build(tz, vec![entry], Vec::new(), Vec::new());
    let search = search();

    let to_utc = |at: chrono::NaiveDateTime| -> DateTime<Utc> {
        at.and_local_timezone(tz).single().unwrap().to_utc()
    };
    assert_eq!(search.first(&set), Some(to_utc(local(2026, 1, 5, 7))));
    assert_eq!(search.last(&set), Some(to_utc(local(2026, 6, 15, 7))));
    assert_eq!(
        search.next(&set, to_utc(local(2026, 1, 27, 0))),
        Some(to_utc(local(2026, 6, 1, 7)))
    );
}

#[test_log::test]
fn empty_set_finds_nothing() {
    let set = CombinedSet::empty(Tz::UTC);
    let summary = search().recompute(&set, utc(2026, 1, 1, 0));
    assert_eq!(summary, OccurrenceSummary::default());
}

#[test_log::test]
fn recompute_fills_every_field() {
    let set = build(
        Tz::UTC,
        vec![daily_event(local(2026, 1, 1, 9), Tz::UTC, Some(10))],
        Vec::new(),
        Vec::new(),
    );
    let summary = search().recompute(&set, utc(2026, 1, 5, 12));

    assert_eq!(
        summary,
        OccurrenceSummary {
            next: Some(utc(2026, 1, 6, 9)),
            previous: Some(utc(2026, 1, 5, 9)),
            first: Some(utc(2026, 1, 1, 9)),
            last: Some(utc(2026, 1, 10, 9)),
        }
    );
}

#[test]
fn zero_bounds_are_rejected() {
    assert!(OccurrenceSearch::new(0, 4).is_err());
    assert!(OccurrenceSearch::new(365, 0).is_err());
}
