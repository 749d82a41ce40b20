use super::*;
use crate::actual::ActualException;
use std::str::FromStr;

fn exception(class: &str, message: &str) -> ActualResult {
    ActualResult::Exception(ActualException {
        class: class.to_string(),
        message: message.to_string(),
        root_cause_message: message.to_string(),
        stack_trace: String::new(),
    })
}

fn expected_exception(class: &str, message: Option<&str>, regex: Option<&str>) -> ExpectedResult {
    ExpectedResult::Exception {
        class: class.to_string(),
        message: message.map(str::to_string),
        pattern: regex.map(|r| Regex::new(&format!("(?s)^(?:{})$", r)).unwrap()),
    }
}

fn id_column() -> Vec<ColumnMeta> {
    vec![ColumnMeta::new("ID", "integer")]
}

fn expected_ids(ids: &[i32]) -> ExpectedResult {
    ExpectedResult::Table {
        columns: id_column(),
        rows: ids
            .iter()
            .map(|i| vec![ExpectedCell::Value(SqlValue::Integer(*i))])
            .collect(),
    }
}

fn actual_ids(ids: &[i32]) -> ActualResult {
    ActualResult::Table(ResultTable {
        columns: id_column(),
        rows: ids.iter().map(|i| vec![SqlValue::Integer(*i)]).collect(),
    })
}

fn two_columns(rows: &[(i32, &str)]) -> (ExpectedResult, ActualResult) {
    let columns = vec![
        ColumnMeta::new("id", "integer"),
        ColumnMeta::new("name", "string"),
    ];
    let expected = ExpectedResult::Table {
        columns: columns.clone(),
        rows: rows
            .iter()
            .map(|(i, n)| {
                vec![
                    ExpectedCell::Value(SqlValue::Integer(*i)),
                    ExpectedCell::Value(SqlValue::Text(n.to_string())),
                ]
            })
            .collect(),
    };
    let actual = ActualResult::Table(ResultTable {
        columns,
        rows: rows
            .iter()
            .map(|(i, n)| vec![SqlValue::Integer(*i), SqlValue::Text(n.to_string())])
            .collect(),
    });
    (expected, actual)
}

fn shuffle_actual(actual: &ActualResult, order: &[usize]) -> ActualResult {
    let ActualResult::Table(table) = actual else {
        panic!("expected table");
    };
    ActualResult::Table(ResultTable {
        columns: table.columns.clone(),
        rows: order.iter().map(|i| table.rows[*i].clone()).collect(),
    })
}

fn shuffle_expected(expected: &ExpectedResult, order: &[usize]) -> ExpectedResult {
    let ExpectedResult::Table { columns, rows } = expected else {
        panic!("expected table");
    };
    ExpectedResult::Table {
        columns: columns.clone(),
        rows: order.iter().map(|i| rows[*i].clone()).collect(),
    }
}

fn amounts(rows: &[(&str, &str)]) -> (ExpectedResult, ActualResult) {
    let columns = vec![
        ColumnMeta::new("amount", "bigdecimal"),
        ColumnMeta::new("name", "string"),
    ];
    let decimal = |s: &str| SqlValue::Decimal(Decimal::from_str(s).unwrap());
    let expected = ExpectedResult::Table {
        columns: columns.clone(),
        rows: rows
            .iter()
            .map(|(a, n)| {
                vec![
                    ExpectedCell::Value(decimal(a)),
                    ExpectedCell::Value(SqlValue::Text(n.to_string())),
                ]
            })
            .collect(),
    };
    let actual = ActualResult::Table(ResultTable {
        columns,
        rows: rows
            .iter()
            .map(|(a, n)| vec![decimal(a), SqlValue::Text(n.to_string())])
            .collect(),
    });
    (expected, actual)
}

#[test]
fn test_update_counts_equal() {
    let errors = compare(
        &ExpectedResult::Update(3),
        &ActualResult::Update(3),
        false,
        Decimal::ZERO,
    );
    assert!(errors.is_empty());
}

#[test]
fn test_update_counts_differ() {
    let errors = compare(
        &ExpectedResult::Update(3),
        &ActualResult::Update(2),
        false,
        Decimal::ZERO,
    );
    assert_eq!(
        errors,
        vec!["Expected and actual update count are different. Expected: [3], actual: [2]."]
    );
}

#[test]
fn test_single_row_table_passes() {
    let errors = compare(&expected_ids(&[1]), &actual_ids(&[1]), true, Decimal::ZERO);
    assert!(errors.is_empty());
}

#[test]
fn test_exception_regex() {
    let expected = expected_exception("TimeoutError", None, Some(".*retry.*"));
    assert!(compare(
        &expected,
        &exception("TimeoutError", "please retry later"),
        false,
        Decimal::ZERO
    )
    .is_empty());

    let errors = compare(
        &expected,
        &exception("TimeoutError", "gave up"),
        false,
        Decimal::ZERO,
    );
    assert_eq!(
        errors,
        vec!["Message does not match pattern. Message: [gave up], pattern: [.*retry.*]."]
    );
}

#[test]
fn test_exception_message_trimmed() {
    let expected = expected_exception("CatalogError", Some("  table missing "), None);
    assert!(compare(
        &expected,
        &exception("CatalogError", "table missing"),
        false,
        Decimal::ZERO
    )
    .is_empty());
    assert_eq!(
        compare(
            &expected,
            &exception("CatalogError", "other"),
            false,
            Decimal::ZERO
        )
        .len(),
        1
    );
}

#[test]
fn test_exception_class_must_match() {
    let expected = expected_exception("CatalogError", Some("boom"), None);
    let errors = compare(
        &expected,
        &exception("BinderError", "boom"),
        false,
        Decimal::ZERO,
    );
    assert_eq!(
        errors,
        vec!["Expected and actual exception class are different. Expected: [CatalogError], actual: [BinderError]."]
    );
}

#[test]
fn test_cross_kind_is_single_mismatch() {
    let errors = compare(
        &ExpectedResult::Update(1),
        &actual_ids(&[1, 2]),
        false,
        Decimal::ZERO,
    );
    assert_eq!(errors, vec!["Expected update but found table."]);

    let errors = compare(
        &expected_ids(&[1]),
        &exception("CatalogError", "missing"),
        false,
        Decimal::ZERO,
    );
    assert_eq!(errors, vec!["Expected table but found exception[CatalogError]."]);

    let errors = compare(
        &ExpectedResult::NoResult,
        &ActualResult::Update(0),
        false,
        Decimal::ZERO,
    );
    assert_eq!(errors, vec!["Expected no-result but found update."]);

    assert!(compare(
        &ExpectedResult::NoResult,
        &ActualResult::NoResult,
        false,
        Decimal::ZERO
    )
    .is_empty());
}

#[test]
fn test_column_count_stops_comparison() {
    let (expected, _) = two_columns(&[(1, "a")]);
    let errors = compare(&expected, &actual_ids(&[1]), false, Decimal::ZERO);
    assert_eq!(
        errors,
        vec!["Expected and actual column count are different. Expected: [2], actual: [1]."]
    );
}

#[test]
fn test_row_count_stops_comparison() {
    let errors = compare(&expected_ids(&[1, 2]), &actual_ids(&[1]), true, Decimal::ZERO);
    assert_eq!(
        errors,
        vec!["Expected and actual row count are different. Expected: [2], actual: [1]."]
    );
}

#[test]
fn test_labels_compared_case_insensitively_and_accumulate() {
    let expected = ExpectedResult::Table {
        columns: vec![ColumnMeta::new("Id", "INTEGER"), ColumnMeta::new("a", "string")],
        rows: vec![],
    };
    let actual = ActualResult::Table(ResultTable {
        columns: vec![ColumnMeta::new("id", "integer"), ColumnMeta::new("b", "long")],
        rows: vec![],
    });
    let errors = compare(&expected, &actual, false, Decimal::ZERO);
    assert_eq!(
        errors,
        vec![
            "Expected and actual column label are different. Expected:[a], actual: [b].",
            "Expected and actual column type are different. Expected:[string], actual: [long].",
        ]
    );
}

#[test]
fn test_sortable_ignores_row_order() {
    let (expected, actual) = two_columns(&[(3, "c"), (1, "a"), (2, "b"), (2, "a")]);
    let orders = [[0, 1, 2, 3], [3, 2, 1, 0], [1, 3, 0, 2], [2, 0, 3, 1]];
    for expected_order in orders {
        let expected = shuffle_expected(&expected, &expected_order);
        for actual_order in orders {
            let actual = shuffle_actual(&actual, &actual_order);
            assert!(
                compare(&expected, &actual, true, Decimal::ZERO).is_empty(),
                "expected order {:?}, actual order {:?}",
                expected_order,
                actual_order
            );
        }
    }
}

#[test]
fn test_sortable_pairs_rows_before_applying_tolerance() {
    let (expected, _) = amounts(&[("10.00", "a"), ("20.00", "b"), ("30.00", "c")]);
    let (_, actual) = amounts(&[("10.02", "a"), ("19.95", "b"), ("30.00", "c")]);
    let tolerance = Decimal::from_str("0.05").unwrap();
    let orders = [[0, 1, 2], [2, 1, 0], [1, 2, 0]];
    for expected_order in orders {
        let expected = shuffle_expected(&expected, &expected_order);
        for actual_order in orders {
            let actual = shuffle_actual(&actual, &actual_order);
            assert!(compare(&expected, &actual, true, tolerance).is_empty());
            assert_eq!(
                compare(&expected, &actual, true, Decimal::from_str("0.01").unwrap()).len(),
                2
            );
        }
    }
}

fn codes(expected: Vec<ExpectedCell>, actual: &[&str]) -> (ExpectedResult, ActualResult) {
    let columns = vec![ColumnMeta::new("code", "string")];
    (
        ExpectedResult::Table {
            columns: columns.clone(),
            rows: expected.into_iter().map(|c| vec![c]).collect(),
        },
        ActualResult::Table(ResultTable {
            columns,
            rows: actual
                .iter()
                .map(|c| vec![SqlValue::Text(c.to_string())])
                .collect(),
        }),
    )
}

fn pattern(source: &str) -> ExpectedCell {
    ExpectedCell::Pattern(Regex::new(&format!("^(?:{})$", source)).unwrap())
}

fn text(value: &str) -> ExpectedCell {
    ExpectedCell::Value(SqlValue::Text(value.to_string()))
}

#[test]
fn test_sortable_pairs_pattern_rows_with_their_matches() {
    // "[a-c]x" sorts before "abc" but its match "bx" sorts after it
    let (expected, actual) = codes(vec![pattern("[a-c]x"), text("abc")], &["bx", "abc"]);
    for order in [[0, 1], [1, 0]] {
        let actual = shuffle_actual(&actual, &order);
        assert!(compare(&expected, &actual, true, Decimal::ZERO).is_empty());
    }

    // a broad pattern must not take the only row a plain value matches
    let (expected, actual) = codes(vec![pattern(".*"), text("a")], &["b", "a"]);
    assert!(compare(&expected, &actual, true, Decimal::ZERO).is_empty());

    let (expected, actual) = codes(vec![pattern("[a-c]x"), text("abc")], &["dx", "abc"]);
    assert_eq!(
        compare(&expected, &actual, true, Decimal::ZERO),
        vec!["Actual value does not match pattern. Actual: [dx], pattern: [[a-c]x]. \
              [cell 1][row 1; row number in expected result 1; row number in actual result 1]."]
    );
}

#[test]
fn test_unsortable_detects_swapped_rows() {
    let (expected, actual) = two_columns(&[(1, "a"), (2, "b")]);
    assert!(compare(&expected, &actual, false, Decimal::ZERO).is_empty());

    let swapped = shuffle_actual(&actual, &[1, 0]);
    let errors = compare(&expected, &swapped, false, Decimal::ZERO);
    assert_eq!(errors.len(), 4);
    assert_eq!(
        errors[0],
        "Actual and expected value are different. Actual: [2], expected: [1]. \
         [cell 1][row 1; row number in expected result 1; row number in actual result 1]."
    );
}

#[test]
fn test_all_cell_mismatches_collected() {
    let (expected, _) = two_columns(&[(1, "alpha"), (2, "beta")]);
    let (_, actual) = two_columns(&[(1, "alphx"), (2, "gamma")]);
    let errors = compare(&expected, &actual, true, Decimal::ZERO);
    assert_eq!(errors.len(), 2);
    assert!(errors[0].starts_with("Actual and expected value are different at position 4."));
    assert!(errors[0].ends_with("[cell 2][row 1; row number in expected result 1; row number in actual result 1]."));
    assert!(errors[1].contains("Actual length: [5], expected length: [4]."));
}

#[test]
fn test_sorted_row_numbers_reference_original_positions() {
    let expected = expected_ids(&[2, 1]);
    let actual = actual_ids(&[1, 3]);
    let errors = compare(&expected, &actual, true, Decimal::ZERO);
    assert_eq!(
        errors,
        vec!["Actual and expected value are different. Actual: [3], expected: [2]. \
              [cell 1][row 2; row number in expected result 1; row number in actual result 2]."]
    );
}

#[test]
fn test_tolerance_boundary() {
    let expected = ExpectedResult::Table {
        columns: vec![ColumnMeta::new("amount", "bigdecimal")],
        rows: vec![vec![ExpectedCell::Value(SqlValue::Decimal(
            Decimal::from_str("100.0").unwrap(),
        ))]],
    };
    let actual = |v: &str| {
        ActualResult::Table(ResultTable {
            columns: vec![ColumnMeta::new("amount", "bigdecimal")],
            rows: vec![vec![SqlValue::Decimal(Decimal::from_str(v).unwrap())]],
        })
    };
    let tolerance = Decimal::from_str("0.5").unwrap();
    assert!(compare(&expected, &actual("100.0"), true, Decimal::ZERO).is_empty());
    assert!(compare(&expected, &actual("100.5"), true, tolerance).is_empty());
    assert!(compare(&expected, &actual("99.5"), true, tolerance).is_empty());
    assert_eq!(compare(&expected, &actual("100.51"), true, tolerance).len(), 1);
}
