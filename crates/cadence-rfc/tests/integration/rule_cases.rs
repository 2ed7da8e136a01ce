use cadence_rfc::rfc::ical::codec::decode;

include!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/rule_cases_data/mod.rs"));

fn engine_timestamps(case: &RuleCase) -> Vec<i64> {
    let set = decode(&calendar(case))
        .unwrap_or_else(|err| panic!("Failed to decode {}: {err}", case.name));
    let (after, before) = bounds(case);
    let after = after.map(|a| a.to_utc());
    set.occurrences(before.map(|b| b.to_utc()))
        .filter(|t| after.is_none_or(|a| *t >= a))
        .take(usize::from(case.limit))
        .map(|t| t.timestamp())
        .collect()
}

/// ## Summary
/// Every shared case agrees with its literal expectation and with rrule.
#[test_log::test]
fn rule_cases_integration() {
    for case in rule_cases() {
        assert_case(&case, &engine_timestamps(&case));
    }
}
