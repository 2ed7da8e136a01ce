use chrono::{DateTime, FixedOffset};
use rrule::{RRuleSet, Tz};

/// One recurrence scenario, written as the body of a VEVENT.
pub struct RuleCase {
    pub name: &'static str,
    pub event: &'static str,
    pub expected: Option<&'static [&'static str]>,
    pub expected_len: Option<usize>,
    pub limit: u16,
    pub after: Option<&'static str>,
    pub before: Option<&'static str>,
}

#[expect(clippy::too_many_lines)]
pub fn rule_cases() -> Vec<RuleCase> {
    vec![
        RuleCase {
            name: "daily_count",
            event: "DTSTART:20260310T081500Z\nRRULE:FREQ=DAILY;COUNT=3",
            expected: Some(&[
                "2026-03-10T08:15:00+00:00",
                "2026-03-11T08:15:00+00:00",
                "2026-03-12T08:15:00+00:00",
            ]),
            expected_len: None,
            limit: 100,
            after: None,
            before: None,
        },
        RuleCase {
            name: "daily_until_is_inclusive",
            event: "DTSTART:20260101T090000Z\nRRULE:FREQ=DAILY;UNTIL=20260103T090000Z",
            expected: Some(&[
                "2026-01-01T09:00:00+00:00",
                "2026-01-02T09:00:00+00:00",
                "2026-01-03T09:00:00+00:00",
            ]),
            expected_len: None,
            limit: 100,
            after: None,
            before: None,
        },
        RuleCase {
            name: "biweekly_tuesday",
            event: "DTSTART:20260106T170000Z\nRRULE:FREQ=WEEKLY;INTERVAL=2;COUNT=4;BYDAY=TU",
            expected: Some(&[
                "2026-01-06T17:00:00+00:00",
                "2026-01-20T17:00:00+00:00",
                "2026-02-03T17:00:00+00:00",
                "2026-02-17T17:00:00+00:00",
            ]),
            expected_len: None,
            limit: 100,
            after: None,
            before: None,
        },
        RuleCase {
            name: "monthly_skips_short_months",
            event: "DTSTART:20260131T120000Z\nRRULE:FREQ=MONTHLY;COUNT=4;BYMONTHDAY=31",
            expected: Some(&[
                "2026-01-31T12:00:00+00:00",
                "2026-03-31T12:00:00+00:00",
                "2026-05-31T12:00:00+00:00",
                "2026-07-31T12:00:00+00:00",
            ]),
            expected_len: None,
            limit: 100,
            after: None,
            before: None,
        },
        RuleCase {
            name: "last_weekday_of_month",
            event: "DTSTART:20260101T160000Z\nRRULE:FREQ=MONTHLY;COUNT=3;BYDAY=MO,TU,WE,TH,FR;BYSETPOS=-1",
            expected: Some(&[
                "2026-01-30T16:00:00+00:00",
                "2026-02-27T16:00:00+00:00",
                "2026-03-31T16:00:00+00:00",
            ]),
            expected_len: None,
            limit: 100,
            after: None,
            before: None,
        },
        RuleCase {
            name: "leap_day",
            event: "DTSTART:20240229T100000Z\nRRULE:FREQ=YEARLY;COUNT=3;BYMONTH=2;BYMONTHDAY=29",
            expected: Some(&[
                "2024-02-29T10:00:00+00:00",
                "2028-02-29T10:00:00+00:00",
                "2032-02-29T10:00:00+00:00",
            ]),
            expected_len: None,
            limit: 100,
            after: None,
            before: None,
        },
        RuleCase {
            name: "week_number_monday",
            event: "DTSTART:20260105T090000Z\nRRULE:FREQ=YEARLY;COUNT=3;BYWEEKNO=20;BYDAY=MO",
            expected: Some(&[
                "2026-05-11T09:00:00+00:00",
                "2027-05-17T09:00:00+00:00",
                "2028-05-15T09:00:00+00:00",
            ]),
            expected_len: None,
            limit: 100,
            after: None,
            before: None,
        },
        RuleCase {
            name: "every_six_hours",
            event: "DTSTART:20260101T030000Z\nRRULE:FREQ=HOURLY;INTERVAL=6;COUNT=4",
            expected: Some(&[
                "2026-01-01T03:00:00+00:00",
                "2026-01-01T09:00:00+00:00",
                "2026-01-01T15:00:00+00:00",
                "2026-01-01T21:00:00+00:00",
            ]),
            expected_len: None,
            limit: 100,
            after: None,
            before: None,
        },
        RuleCase {
            name: "quarter_hours",
            event: "DTSTART:20260101T100000Z\nRRULE:FREQ=MINUTELY;INTERVAL=15;COUNT=3",
            expected: Some(&[
                "2026-01-01T10:00:00+00:00",
                "2026-01-01T10:15:00+00:00",
                "2026-01-01T10:30:00+00:00",
            ]),
            expected_len: None,
            limit: 100,
            after: None,
            before: None,
        },
        RuleCase {
            name: "explicit_dates",
            event: "DTSTART:20260401T093000Z\nRRULE:FREQ=DAILY;COUNT=3\nRDATE:20260410T093000Z\nEXDATE:20260402T093000Z",
            expected: Some(&[
                "2026-04-01T09:30:00+00:00",
                "2026-04-03T09:30:00+00:00",
                "2026-04-10T09:30:00+00:00",
            ]),
            expected_len: None,
            limit: 100,
            after: None,
            before: None,
        },
        RuleCase {
            name: "bounded_lookup",
            event: "DTSTART:20260401T093000Z\nRRULE:FREQ=DAILY;COUNT=5",
            expected: Some(&[
                "2026-04-02T09:30:00+00:00",
                "2026-04-03T09:30:00+00:00",
            ]),
            expected_len: None,
            limit: 100,
            after: Some("2026-04-01T10:00:00+00:00"),
            before: Some("2026-04-03T12:00:00+00:00"),
        },
        RuleCase {
            name: "dst_spring_forward_new_york",
            event: "DTSTART;TZID=America/New_York:20260307T120000\nRRULE:FREQ=DAILY;COUNT=3",
            expected: Some(&[
                "2026-03-07T12:00:00-05:00",
                "2026-03-08T12:00:00-04:00",
                "2026-03-09T12:00:00-04:00",
            ]),
            expected_len: None,
            limit: 100,
            after: None,
            before: None,
        },
        RuleCase {
            name: "dst_fall_back_berlin",
            event: "DTSTART;TZID=Europe/Berlin:20261024T120000\nRRULE:FREQ=DAILY;COUNT=3",
            expected: Some(&[
                "2026-10-24T12:00:00+02:00",
                "2026-10-25T12:00:00+01:00",
                "2026-10-26T12:00:00+01:00",
            ]),
            expected_len: None,
            limit: 100,
            after: None,
            before: None,
        },
        RuleCase {
            name: "every_day_in_january",
            event: "DTSTART;TZID=America/New_York:19980101T090000\nRRULE:FREQ=YEARLY;UNTIL=20000131T140000Z;BYMONTH=1;BYDAY=SU,MO,TU,WE,TH,FR,SA",
            expected: None,
            expected_len: Some(93),
            limit: 200,
            after: None,
            before: None,
        },
        RuleCase {
            name: "unbounded_limited",
            event: "DTSTART;TZID=Asia/Tokyo:20260101T000000\nRRULE:FREQ=WEEKLY;BYDAY=SA,SU",
            expected: None,
            expected_len: Some(10),
            limit: 10,
            after: None,
            before: None,
        },
    ]
}

/// Wraps the case's event lines in a calendar the codec can decode.
pub fn calendar(case: &RuleCase) -> String {
    format!(
        "BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:-//cases//EN\nBEGIN:VEVENT\n{}\nEND:VEVENT\nEND:VCALENDAR\n",
        case.event
    )
}

/// Lookup bounds of the case, both inclusive.
pub fn bounds(case: &RuleCase) -> (Option<DateTime<FixedOffset>>, Option<DateTime<FixedOffset>>) {
    (case.after.map(parse_rfc3339), case.before.map(parse_rfc3339))
}

/// Timestamps the rrule crate produces for the same case.
pub fn oracle_timestamps(case: &RuleCase) -> Vec<i64> {
    let mut rrule_set: RRuleSet = case
        .event
        .parse()
        .unwrap_or_else(|err| panic!("Failed to parse {}: {}", case.name, err));

    let (after, before) = bounds(case);
    if let Some(after) = after {
        rrule_set = rrule_set.after(after.with_timezone(&Tz::UTC));
    }
    if let Some(before) = before {
        rrule_set = rrule_set.before(before.with_timezone(&Tz::UTC));
    }

    rrule_set
        .all(case.limit)
        .dates
        .iter()
        .map(chrono::DateTime::timestamp)
        .collect()
}

/// Checks the engine's timestamps against the literal expectations and the
/// rrule crate.
pub fn assert_case(case: &RuleCase, actual: &[i64]) {
    if let Some(expected) = case.expected {
        let expected: Vec<i64> = expected
            .iter()
            .map(|value| parse_rfc3339(value).timestamp())
            .collect();
        assert_eq!(actual, expected.as_slice(), "Case {} did not match", case.name);
    }

    if let Some(expected_len) = case.expected_len {
        assert_eq!(
            actual.len(),
            expected_len,
            "Case {} expected {} occurrences",
            case.name,
            expected_len
        );
    }

    assert_eq!(
        actual,
        oracle_timestamps(case).as_slice(),
        "Case {} disagrees with rrule",
        case.name
    );
}

fn parse_rfc3339(value: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(value)
        .unwrap_or_else(|err| panic!("Failed to parse rfc3339 value {value}: {err}"))
}
