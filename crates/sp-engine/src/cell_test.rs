use super::*;

fn cell(tag: &str, value: &str) -> ExpectedCell {
    ExpectedCell::from_fixture(Some(&FixtureCell::new(tag, value))).unwrap()
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[test]
fn test_parse_tagged_cells() {
    assert_eq!(cell("integer", "7"), ExpectedCell::Value(SqlValue::Integer(7)));
    assert_eq!(cell("LONG", " -3 "), ExpectedCell::Value(SqlValue::Long(-3)));
    assert_eq!(
        cell("bigdecimal", "1.5E2"),
        ExpectedCell::Value(SqlValue::Decimal(dec("150")))
    );
    assert_eq!(
        cell("boolean", "TRUE"),
        ExpectedCell::Value(SqlValue::Boolean(true))
    );
    assert_eq!(cell("char", "x"), ExpectedCell::Value(SqlValue::Char('x')));
    assert_eq!(
        cell("date", "2024-03-01").sort_value().to_string(),
        "2024-03-01"
    );
    assert_eq!(
        cell("timestamp", "2024-03-01 10:00:00").sort_value().to_string(),
        "2024-03-01 10:00:00"
    );
    assert_eq!(
        cell("unprintable", "YQFi"),
        ExpectedCell::Value(SqlValue::Text("a\u{1}b".into()))
    );
    assert_eq!(
        cell("somethingelse", "text"),
        ExpectedCell::Value(SqlValue::Text("text".into()))
    );
    assert_eq!(
        ExpectedCell::from_fixture(None).unwrap(),
        ExpectedCell::Value(SqlValue::Null)
    );
}

#[test]
fn test_parse_rejects_bad_values() {
    for (tag, value) in [
        ("integer", "seven"),
        ("char", "ab"),
        ("boolean", "yes"),
        ("date", "01/02/2024"),
        ("regex", "("),
    ] {
        let result = ExpectedCell::from_fixture(Some(&FixtureCell::new(tag, value)));
        assert!(
            matches!(result, Err(EngineError::InvalidExpected(_))),
            "{} {}",
            tag,
            value
        );
    }
}

#[test]
fn test_ordering_nulls_first_then_natural() {
    let mut values = vec![
        SqlValue::Integer(10),
        SqlValue::Null,
        SqlValue::Integer(9),
        SqlValue::Integer(-1),
    ];
    values.sort_by(compare_values);
    assert_eq!(
        values,
        vec![
            SqlValue::Null,
            SqlValue::Integer(-1),
            SqlValue::Integer(9),
            SqlValue::Integer(10)
        ]
    );
}

#[test]
fn test_ordering_mixed_types_by_text() {
    assert_eq!(
        compare_values(&SqlValue::Integer(10), &SqlValue::Text("9".into())),
        Ordering::Less
    );
    assert_eq!(
        compare_values(&SqlValue::Long(5), &SqlValue::Integer(5)),
        Ordering::Equal
    );
}

#[test]
fn test_decimal_tolerance_is_inclusive() {
    let expected = cell("bigdecimal", "10.00");
    let t = dec("0.05");
    assert!(cell_mismatch(&expected, &SqlValue::Decimal(dec("10.00")), Decimal::ZERO).is_none());
    assert!(cell_mismatch(&expected, &SqlValue::Decimal(dec("10.05")), t).is_none());
    assert!(cell_mismatch(&expected, &SqlValue::Decimal(dec("9.95")), t).is_none());
    let msg = cell_mismatch(&expected, &SqlValue::Decimal(dec("10.06")), t).unwrap();
    assert_eq!(
        msg,
        "Actual and expected value are different. Actual: [10.06], expected: [10.00]."
    );
}

#[test]
fn test_double_tolerance() {
    let expected = cell("double", "1.5");
    assert!(cell_mismatch(&expected, &SqlValue::Double(1.5), Decimal::ZERO).is_none());
    assert!(cell_mismatch(&expected, &SqlValue::Double(1.75), dec("0.25")).is_none());
    assert!(cell_mismatch(&expected, &SqlValue::Double(1.8), dec("0.25")).is_some());
}

#[test]
fn test_nan_matches_nan() {
    let expected = cell("double", "NaN");
    assert!(cell_mismatch(&expected, &SqlValue::Double(f64::NAN), Decimal::ZERO).is_none());
    assert!(cell_mismatch(&expected, &SqlValue::Double(1.0), dec("5")).is_some());
    assert!(cell_mismatch(&cell("double", "1.0"), &SqlValue::Double(f64::NAN), dec("5")).is_some());

    let expected = cell("float", "NaN");
    assert!(cell_mismatch(&expected, &SqlValue::Float(f32::NAN), dec("0.1")).is_none());
}

#[test]
fn test_integers_ignore_tolerance() {
    let expected = cell("integer", "5");
    assert!(cell_mismatch(&expected, &SqlValue::Long(5), dec("1")).is_none());
    assert!(cell_mismatch(&expected, &SqlValue::Integer(6), dec("1")).is_some());
}

#[test]
fn test_integer_against_decimal_uses_tolerance() {
    let expected = cell("integer", "5");
    assert!(cell_mismatch(&expected, &SqlValue::Decimal(dec("5.4")), dec("0.5")).is_none());
}

#[test]
fn test_nulls() {
    let null = ExpectedCell::Value(SqlValue::Null);
    assert!(cell_mismatch(&null, &SqlValue::Null, Decimal::ZERO).is_none());
    assert_eq!(
        cell_mismatch(&null, &SqlValue::Integer(1), Decimal::ZERO).unwrap(),
        "Expected null but get value."
    );
    assert_eq!(
        cell_mismatch(&cell("integer", "1"), &SqlValue::Null, Decimal::ZERO).unwrap(),
        "Expected value but get null."
    );
}

#[test]
fn test_regex_cell() {
    let expected = cell("regex", "user_[0-9]+");
    assert!(cell_mismatch(&expected, &SqlValue::Text("user_42".into()), Decimal::ZERO).is_none());
    assert!(cell_mismatch(&expected, &SqlValue::Text("user_42x".into()), Decimal::ZERO).is_some());
    assert_eq!(expected.sort_value().to_string(), "user_[0-9]+");
}

#[test]
fn test_string_fallback_equality() {
    let expected = cell("string", "5");
    assert!(cell_mismatch(&expected, &SqlValue::Integer(5), Decimal::ZERO).is_none());
}

#[test]
fn test_text_diff_length() {
    assert_eq!(
        text_diff("abc", "abcd").unwrap(),
        "Actual and expected value are different. Actual length: [4], expected length: [3]."
    );
    assert!(text_diff("same", "same").is_none());
}

#[test]
fn test_text_diff_window() {
    let expected = "0123456789abcdefghijklmnopqrstuvwxyz";
    let actual = "0123456789abcdefghijklmnoXqrstuvwxyz";
    assert_eq!(
        text_diff(expected, actual).unwrap(),
        "Actual and expected value are different at position 25. \
         Actual: [...fghijklmnoXqrstuvwxy...], expected: [...fghijklmnopqrstuvwxy...]."
    );

    assert_eq!(
        text_diff("abc", "abd").unwrap(),
        "Actual and expected value are different at position 2. Actual: [...abd...], expected: [...abc...]."
    );
}
