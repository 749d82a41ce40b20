//! Typed cell parsing, ordering and equality

use crate::error::{EngineError, EngineResult};
use base64::Engine;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sp_core::fixture::tags;
use sp_core::FixtureCell;
use sp_db::value::{DATE_FORMAT, TIMESTAMP_FORMAT, TIME_FORMAT};
use sp_db::SqlValue;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::str::FromStr;

/// Characters of context shown around the first difference
const DIFF_WINDOW: usize = 20;

/// One cell of an expected table
#[derive(Debug, Clone)]
pub enum ExpectedCell {
    Value(SqlValue),
    /// The actual cell's text must fully match
    Pattern(Regex),
}

impl PartialEq for ExpectedCell {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ExpectedCell::Value(a), ExpectedCell::Value(b)) => a == b,
            (ExpectedCell::Pattern(a), ExpectedCell::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl ExpectedCell {
    /// Parse a fixture cell; `None` is SQL NULL.
    pub fn from_fixture(cell: Option<&FixtureCell>) -> EngineResult<Self> {
        let Some(cell) = cell else {
            return Ok(ExpectedCell::Value(SqlValue::Null));
        };
        let v = cell.value.as_str();
        let bad = |e: &dyn std::fmt::Display| {
            EngineError::InvalidExpected(format!(
                "cannot read '{}' as {}: {}",
                cell.value, cell.tag, e
            ))
        };

        let value = match cell.tag.to_ascii_lowercase().as_str() {
            tags::INTEGER => SqlValue::Integer(v.trim().parse().map_err(|e| bad(&e))?),
            tags::LONG => SqlValue::Long(v.trim().parse().map_err(|e| bad(&e))?),
            tags::SHORT => SqlValue::Short(v.trim().parse().map_err(|e| bad(&e))?),
            tags::BYTE => SqlValue::Byte(v.trim().parse().map_err(|e| bad(&e))?),
            tags::BIG_INTEGER => SqlValue::BigInteger(v.trim().parse().map_err(|e| bad(&e))?),
            tags::FLOAT => SqlValue::Float(v.trim().parse().map_err(|e| bad(&e))?),
            tags::DOUBLE => SqlValue::Double(v.trim().parse().map_err(|e| bad(&e))?),
            tags::BIG_DECIMAL => {
                SqlValue::Decimal(parse_decimal(v.trim()).map_err(|e| bad(&e))?)
            }
            tags::BOOLEAN => match v.trim().to_ascii_lowercase().as_str() {
                "true" => SqlValue::Boolean(true),
                "false" => SqlValue::Boolean(false),
                _ => return Err(bad(&"expected true or false")),
            },
            tags::CHAR => {
                let mut chars = v.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => SqlValue::Char(c),
                    _ => return Err(bad(&"expected exactly one character")),
                }
            }
            tags::DATE => {
                SqlValue::Date(NaiveDate::parse_from_str(v, DATE_FORMAT).map_err(|e| bad(&e))?)
            }
            tags::TIME => {
                SqlValue::Time(NaiveTime::parse_from_str(v, TIME_FORMAT).map_err(|e| bad(&e))?)
            }
            tags::TIMESTAMP => SqlValue::Timestamp(
                NaiveDateTime::parse_from_str(v, TIMESTAMP_FORMAT).map_err(|e| bad(&e))?,
            ),
            tags::UNPRINTABLE => {
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(v.trim())
                    .map_err(|e| bad(&e))?;
                SqlValue::Text(String::from_utf8(bytes).map_err(|e| bad(&e))?)
            }
            tags::REGEX => {
                let re = Regex::new(&format!("^(?:{})$", v)).map_err(|e| bad(&e))?;
                return Ok(ExpectedCell::Pattern(re));
            }
            _ => SqlValue::Text(v.to_string()),
        };
        Ok(ExpectedCell::Value(value))
    }

    pub fn is_pattern(&self) -> bool {
        matches!(self, ExpectedCell::Pattern(_))
    }

    /// Value used when ordering rows; a pattern orders by its source text
    pub fn sort_value(&self) -> Cow<'_, SqlValue> {
        match self {
            ExpectedCell::Value(v) => Cow::Borrowed(v),
            ExpectedCell::Pattern(re) => {
                Cow::Owned(SqlValue::Text(pattern_source(re).to_string()))
            }
        }
    }
}

fn pattern_source(re: &Regex) -> &str {
    re.as_str()
        .strip_prefix("^(?:")
        .and_then(|s| s.strip_suffix(")$"))
        .unwrap_or(re.as_str())
}

fn parse_decimal(text: &str) -> Result<Decimal, rust_decimal::Error> {
    Decimal::from_str(text).or_else(|_| Decimal::from_scientific(text))
}

/// Total order used to sort rows: nulls first, values of the same type in
/// natural order, anything else by text.
pub fn compare_values(a: &SqlValue, b: &SqlValue) -> Ordering {
    use SqlValue as V;
    match (a, b) {
        (V::Null, V::Null) => Ordering::Equal,
        (V::Null, _) => Ordering::Less,
        (_, V::Null) => Ordering::Greater,
        (V::Boolean(x), V::Boolean(y)) => x.cmp(y),
        (V::Byte(x), V::Byte(y)) => x.cmp(y),
        (V::Short(x), V::Short(y)) => x.cmp(y),
        (V::Integer(x), V::Integer(y)) => x.cmp(y),
        (V::Long(x), V::Long(y)) => x.cmp(y),
        (V::BigInteger(x), V::BigInteger(y)) => x.cmp(y),
        (V::Float(x), V::Float(y)) => x.total_cmp(y),
        (V::Double(x), V::Double(y)) => x.total_cmp(y),
        (V::Decimal(x), V::Decimal(y)) => x.cmp(y),
        (V::Char(x), V::Char(y)) => x.cmp(y),
        (V::Text(x), V::Text(y)) => x.cmp(y),
        (V::Date(x), V::Date(y)) => x.cmp(y),
        (V::Time(x), V::Time(y)) => x.cmp(y),
        (V::Timestamp(x), V::Timestamp(y)) => x.cmp(y),
        (V::Blob(x), V::Blob(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// Compare an expected cell with an actual one.
///
/// Returns a description of the difference, or `None` when they are equal.
pub fn cell_mismatch(
    expected: &ExpectedCell,
    actual: &SqlValue,
    tolerance: Decimal,
) -> Option<String> {
    let expected = match expected {
        ExpectedCell::Pattern(re) => {
            if actual.is_null() {
                return Some("Expected value but get null.".to_string());
            }
            let text = actual.to_string();
            return (!re.is_match(&text)).then(|| {
                format!(
                    "Actual value does not match pattern. Actual: [{}], pattern: [{}].",
                    text,
                    pattern_source(re)
                )
            });
        }
        ExpectedCell::Value(v) => v,
    };

    match (expected.is_null(), actual.is_null()) {
        (true, true) => return None,
        (true, false) => return Some("Expected null but get value.".to_string()),
        (false, true) => return Some("Expected value but get null.".to_string()),
        (false, false) => {}
    }

    let equal = match (expected, actual) {
        (SqlValue::Boolean(e), SqlValue::Boolean(a)) => Some(e == a),
        (e, a) if is_numeric(e) && is_numeric(a) => Some(numbers_equal(e, a, tolerance)),
        _ => None,
    };
    match equal {
        Some(true) => None,
        Some(false) => Some(format!(
            "Actual and expected value are different. Actual: [{}], expected: [{}].",
            actual, expected
        )),
        None if expected == actual => None,
        None => text_diff(&expected.to_string(), &actual.to_string()),
    }
}

fn is_numeric(v: &SqlValue) -> bool {
    v.is_integral() || v.is_fractional()
}

fn numbers_equal(expected: &SqlValue, actual: &SqlValue, tolerance: Decimal) -> bool {
    if let (Some(e), Some(a)) = (expected.as_i128(), actual.as_i128()) {
        return e == a;
    }
    let uses_float = |v: &SqlValue| matches!(v, SqlValue::Float(_) | SqlValue::Double(_));
    if !uses_float(expected) && !uses_float(actual) {
        if let (Some(e), Some(a)) = (to_decimal(expected), to_decimal(actual)) {
            return e == a || (a >= e - tolerance && a <= e + tolerance);
        }
    }
    match (to_f64(expected), to_f64(actual), tolerance.to_f64()) {
        (Some(e), _, _) if e.is_nan() => to_f64(actual).is_some_and(f64::is_nan),
        (Some(e), Some(a), Some(t)) => e == a || (a >= e - t && a <= e + t),
        _ => false,
    }
}

fn to_decimal(v: &SqlValue) -> Option<Decimal> {
    match v {
        SqlValue::Decimal(d) => Some(*d),
        other => other
            .as_i128()
            .and_then(|i| Decimal::try_from_i128_with_scale(i, 0).ok()),
    }
}

fn to_f64(v: &SqlValue) -> Option<f64> {
    match v {
        SqlValue::Float(f) => Some(f64::from(*f)),
        SqlValue::Double(d) => Some(*d),
        SqlValue::Decimal(d) => d.to_f64(),
        other => other.as_i128().map(|i| i as f64),
    }
}

/// Describe where two texts first differ.
///
/// `None` when the texts are equal.
pub fn text_diff(expected: &str, actual: &str) -> Option<String> {
    let e: Vec<char> = expected.chars().collect();
    let a: Vec<char> = actual.chars().collect();
    if e.len() != a.len() {
        return Some(format!(
            "Actual and expected value are different. Actual length: [{}], expected length: [{}].",
            a.len(),
            e.len()
        ));
    }
    let position = e.iter().zip(a.iter()).position(|(x, y)| x != y)?;
    let start = position.saturating_sub(DIFF_WINDOW / 2);
    let end = (start + DIFF_WINDOW).min(e.len());
    let window = |chars: &[char]| chars[start..end].iter().collect::<String>();
    Some(format!(
        "Actual and expected value are different at position {}. Actual: [...{}...], expected: [...{}...].",
        position,
        window(&a),
        window(&e)
    ))
}

#[cfg(test)]
#[path = "cell_test.rs"]
mod tests;
