//! Pinned results for expressions seen in real job registries.
//!
//! Everything is evaluated in UTC so the table is independent of the host
//! timezone.

use chrono::{NaiveDateTime, Utc};
use rerun_reltime::{RelativeTimeEvaluator, TimeExprError};

fn at(s: &str) -> i64 {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .unwrap_or_else(|e| panic!("bad fixture {s}: {e}"))
        .and_utc()
        .timestamp()
}

#[test]
fn regression_table() {
    let evaluator = RelativeTimeEvaluator::new(Utc);
    // Wednesday.
    let reference = at("2019-01-30 04:17:09");

    let cases = [
        ("now", "2019-01-30 04:17:09"),
        ("-15m", "2019-01-30 04:02:09"),
        ("-24h", "2019-01-29 04:17:09"),
        ("-1d@d", "2019-01-29 00:00:00"),
        ("@d", "2019-01-30 00:00:00"),
        ("@h", "2019-01-30 04:00:00"),
        ("@m", "2019-01-30 04:17:00"),
        ("-7d@w", "2019-01-21 00:00:00"),
        ("@w+1d", "2019-01-29 00:00:00"),
        ("@mon", "2019-01-01 00:00:00"),
        ("-1mon@mon", "2018-12-01 00:00:00"),
        ("+1mon", "2019-02-28 04:17:09"),
        ("-1mon@y+12d", "2018-12-13 00:00:00"),
        ("@y", "2019-01-01 00:00:00"),
        ("-1y@y", "2018-01-01 00:00:00"),
        ("-15m+5s@d+1h", "2019-01-30 00:45:05"),
        ("-2hours@days", "2019-01-29 22:00:00"),
        ("1546300800", "2019-01-01 00:00:00"),
        // Anything after the longest matching prefix is ignored.
        ("-7d@w0", "2019-01-21 00:00:00"),
        ("@w1", "2019-01-28 00:00:00"),
        ("-1d@d+1h+2m", "2019-01-29 01:00:00"),
        ("-1d@", "2019-01-29 04:17:09"),
    ];

    for (expr, expected) in cases {
        assert_eq!(
            evaluator.evaluate(expr, reference),
            Ok(at(expected)),
            "expression {expr}"
        );
    }
}

#[test]
fn jan_31_plus_one_month_is_feb_28() {
    let evaluator = RelativeTimeEvaluator::new(Utc);
    assert_eq!(
        evaluator.evaluate("+1mon", at("2019-01-31 00:00:00")),
        Ok(at("2019-02-28 00:00:00"))
    );
}

#[test]
fn literal_is_returned_verbatim() {
    let evaluator = RelativeTimeEvaluator::new(Utc);
    for reference in [0, 1_000, at("2030-06-01 12:00:00")] {
        assert_eq!(evaluator.evaluate("1700000000", reference), Ok(1_700_000_000));
    }
}

#[test]
fn malformed_expressions_are_rejected() {
    let evaluator = RelativeTimeEvaluator::new(Utc);
    assert!(matches!(
        evaluator.evaluate("", 0),
        Err(TimeExprError::Grammar { .. })
    ));
    assert!(matches!(
        evaluator.evaluate("-d@d", 0),
        Err(TimeExprError::Grammar { .. })
    ));
    assert!(matches!(
        evaluator.evaluate("-1zz", 0),
        Err(TimeExprError::Unit { .. })
    ));
}
