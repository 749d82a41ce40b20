//! Result comparator
//!
//! Judges an [`ActualResult`] against an [`ExpectedResult`] and describes
//! every difference found. An empty list means the query passed.
//!
//! Cross-kind differences (a table where an update was expected, ...) and
//! structural differences (column or row count) end the comparison. Cell
//! differences are all collected.

use crate::actual::{ActualResult, ResultTable};
use crate::cell::{cell_mismatch, compare_values, ExpectedCell};
use crate::expected::ExpectedResult;
use regex::Regex;
use rust_decimal::Decimal;
use sp_db::{ColumnMeta, SqlValue};
use std::cmp::Ordering;

/// Compare `actual` with `expected`.
///
/// When `sortable` is set both row lists are sorted before rows are paired,
/// so row order does not matter. `tolerance` is the largest difference still
/// treated as equal for fractional numbers.
pub fn compare(
    expected: &ExpectedResult,
    actual: &ActualResult,
    sortable: bool,
    tolerance: Decimal,
) -> Vec<String> {
    let mut errors = Vec::new();
    match expected {
        ExpectedResult::Exception {
            class,
            message,
            pattern,
        } => compare_exception(
            class,
            message.as_deref(),
            pattern.as_ref(),
            actual,
            &mut errors,
        ),
        ExpectedResult::Update(count) => compare_update(*count, actual, &mut errors),
        ExpectedResult::Table { columns, rows } => {
            compare_table(columns, rows, actual, sortable, tolerance, &mut errors)
        }
        ExpectedResult::NoResult => {
            if !matches!(actual, ActualResult::NoResult) {
                errors.push(format!("Expected no-result but found {}.", actual.kind()));
            }
        }
        ExpectedResult::Sql(sql) => {
            errors.push(format!("Expected result SQL was never executed: {}", sql));
        }
    }
    errors
}

fn compare_exception(
    class: &str,
    message: Option<&str>,
    pattern: Option<&Regex>,
    actual: &ActualResult,
    errors: &mut Vec<String>,
) {
    let exception = match actual {
        ActualResult::Exception(e) => e,
        ActualResult::NoResult => {
            errors.push("Expected exception but found no-result.".to_string());
            return;
        }
        other => {
            errors.push(format!(
                "Expected exception [{}] but found {}.",
                class,
                other.kind()
            ));
            return;
        }
    };

    if exception.class != class {
        errors.push(format!(
            "Expected and actual exception class are different. Expected: [{}], actual: [{}].",
            class, exception.class
        ));
        return;
    }

    let actual_message = exception.root_cause_message.as_str();
    if let Some(expected_message) = message {
        if expected_message != actual_message && expected_message.trim() != actual_message.trim()
        {
            errors.push(format!(
                "Expected and actual message are different. Expected: [{}], actual: [{}].",
                expected_message, actual_message
            ));
        }
    }
    if let Some(re) = pattern {
        if !re.is_match(actual_message) {
            errors.push(format!(
                "Message does not match pattern. Message: [{}], pattern: [{}].",
                actual_message,
                display_pattern(re)
            ));
        }
    }
}

fn display_pattern(re: &Regex) -> &str {
    re.as_str()
        .strip_prefix("(?s)^(?:")
        .and_then(|s| s.strip_suffix(")$"))
        .unwrap_or(re.as_str())
}

fn compare_update(count: u64, actual: &ActualResult, errors: &mut Vec<String>) {
    match actual {
        ActualResult::Update(actual_count) => {
            if *actual_count != count {
                errors.push(format!(
                    "Expected and actual update count are different. Expected: [{}], actual: [{}].",
                    count, actual_count
                ));
            }
        }
        ActualResult::Exception(e) => errors.push(format!(
            "Expected update but found exception[{}].",
            e.class
        )),
        other => errors.push(format!("Expected update but found {}.", other.kind())),
    }
}

fn compare_table(
    columns: &[ColumnMeta],
    rows: &[Vec<ExpectedCell>],
    actual: &ActualResult,
    sortable: bool,
    tolerance: Decimal,
    errors: &mut Vec<String>,
) {
    let table = match actual {
        ActualResult::Table(t) => t,
        ActualResult::Exception(e) => {
            errors.push(format!("Expected table but found exception[{}].", e.class));
            return;
        }
        other => {
            errors.push(format!("Expected table but found {}.", other.kind()));
            return;
        }
    };

    if columns.len() != table.columns.len() {
        errors.push(format!(
            "Expected and actual column count are different. Expected: [{}], actual: [{}].",
            columns.len(),
            table.columns.len()
        ));
        return;
    }
    for (expected, actual) in columns.iter().zip(&table.columns) {
        if !expected.label.eq_ignore_ascii_case(&actual.label) {
            errors.push(format!(
                "Expected and actual column label are different. Expected:[{}], actual: [{}].",
                expected.label, actual.label
            ));
        }
        if !expected.type_name.eq_ignore_ascii_case(&actual.type_name) {
            errors.push(format!(
                "Expected and actual column type are different. Expected:[{}], actual: [{}].",
                expected.type_name, actual.type_name
            ));
        }
    }
    if rows.len() != table.rows.len() {
        errors.push(format!(
            "Expected and actual row count are different. Expected: [{}], actual: [{}].",
            rows.len(),
            table.rows.len()
        ));
        return;
    }
    if !errors.is_empty() {
        return;
    }

    compare_rows(rows, table, sortable, tolerance, errors);
}

fn compare_rows(
    rows: &[Vec<ExpectedCell>],
    table: &ResultTable,
    sortable: bool,
    tolerance: Decimal,
    errors: &mut Vec<String>,
) {
    // (1-based position in the original result, row)
    let mut expected: Vec<(usize, &Vec<ExpectedCell>)> =
        rows.iter().enumerate().map(|(i, r)| (i + 1, r)).collect();
    let mut actual: Vec<(usize, &Vec<SqlValue>)> =
        table.rows.iter().enumerate().map(|(i, r)| (i + 1, r)).collect();
    if sortable {
        expected.sort_by(|(_, a), (_, b)| {
            compare_rows_by(a.as_slice(), b.as_slice(), |x, y| {
                compare_values(&x.sort_value(), &y.sort_value())
            })
        });
        actual.sort_by(|(_, a), (_, b)| {
            compare_rows_by(a.as_slice(), b.as_slice(), compare_values)
        });
        if rows.iter().flatten().any(ExpectedCell::is_pattern) {
            actual = align_to_patterns(&expected, &actual, tolerance);
        }
    }

    for (n, ((expected_idx, expected_row), (actual_idx, actual_row))) in
        expected.iter().zip(actual.iter()).enumerate()
    {
        let row_id = format!(
            "[row {}; row number in expected result {}; row number in actual result {}].",
            n + 1,
            expected_idx,
            actual_idx
        );
        for (c, (e, a)) in expected_row.iter().zip(actual_row.iter()).enumerate() {
            if let Some(msg) = cell_mismatch(e, a, tolerance) {
                errors.push(format!("{} [cell {}]{}", msg, c + 1, row_id));
            }
        }
    }
}

/// Reorder sorted `actual` rows so every expected row faces a row it fully
/// matches, when one is left.
///
/// A pattern sorts by its source text, which says nothing about where its
/// matches sort. Rows without patterns claim their partner first so a broad
/// pattern cannot take it; unclaimed rows fill the gaps in sorted order.
fn align_to_patterns<'a>(
    expected: &[(usize, &Vec<ExpectedCell>)],
    actual: &[(usize, &'a Vec<SqlValue>)],
    tolerance: Decimal,
) -> Vec<(usize, &'a Vec<SqlValue>)> {
    let has_pattern = |row: &Vec<ExpectedCell>| row.iter().any(ExpectedCell::is_pattern);
    let claim_order = (0..expected.len())
        .filter(|&i| !has_pattern(expected[i].1))
        .chain((0..expected.len()).filter(|&i| has_pattern(expected[i].1)));

    let mut partner: Vec<Option<usize>> = vec![None; expected.len()];
    let mut taken = vec![false; actual.len()];
    for i in claim_order {
        let found = (0..actual.len()).find(|&j| {
            !taken[j]
                && expected[i]
                    .1
                    .iter()
                    .zip(actual[j].1.iter())
                    .all(|(e, a)| cell_mismatch(e, a, tolerance).is_none())
        });
        if let Some(j) = found {
            taken[j] = true;
            partner[i] = Some(j);
        }
    }

    let mut unclaimed = (0..actual.len()).filter(|&j| !taken[j]);
    partner
        .into_iter()
        .filter_map(|p| p.or_else(|| unclaimed.next()))
        .map(|j| actual[j])
        .collect()
}

fn compare_rows_by<T>(a: &[T], b: &[T], cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| cmp(x, y))
        .find(|o| *o != Ordering::Equal)
        .unwrap_or_else(|| a.len().cmp(&b.len()))
}

#[cfg(test)]
#[path = "compare_test.rs"]
mod tests;
