//! Typed cell values

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use std::fmt;

/// One cell of a result row
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Integer(i32),
    Long(i64),
    BigInteger(i128),
    Float(f32),
    Double(f64),
    Decimal(Decimal),
    Char(char),
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Blob(Vec<u8>),
}

/// Formats used for temporal values in text form
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S%.f";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Fixture tag naming this value's type
    pub fn type_tag(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Boolean(_) => "boolean",
            SqlValue::Byte(_) => "byte",
            SqlValue::Short(_) => "short",
            SqlValue::Integer(_) => "integer",
            SqlValue::Long(_) => "long",
            SqlValue::BigInteger(_) => "biginteger",
            SqlValue::Float(_) => "float",
            SqlValue::Double(_) => "double",
            SqlValue::Decimal(_) => "bigdecimal",
            SqlValue::Char(_) => "char",
            SqlValue::Text(_) => "string",
            SqlValue::Date(_) => "date",
            SqlValue::Time(_) => "time",
            SqlValue::Timestamp(_) => "timestamp",
            SqlValue::Blob(_) => "blob",
        }
    }

    /// Whole-number value, for the integer variants
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            SqlValue::Byte(v) => Some(i128::from(*v)),
            SqlValue::Short(v) => Some(i128::from(*v)),
            SqlValue::Integer(v) => Some(i128::from(*v)),
            SqlValue::Long(v) => Some(i128::from(*v)),
            SqlValue::BigInteger(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_integral(&self) -> bool {
        self.as_i128().is_some()
    }

    /// Decimal and floating-point variants
    pub fn is_fractional(&self) -> bool {
        matches!(
            self,
            SqlValue::Float(_) | SqlValue::Double(_) | SqlValue::Decimal(_)
        )
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "null"),
            SqlValue::Boolean(v) => write!(f, "{}", v),
            SqlValue::Byte(v) => write!(f, "{}", v),
            SqlValue::Short(v) => write!(f, "{}", v),
            SqlValue::Integer(v) => write!(f, "{}", v),
            SqlValue::Long(v) => write!(f, "{}", v),
            SqlValue::BigInteger(v) => write!(f, "{}", v),
            SqlValue::Float(v) => write!(f, "{}", v),
            SqlValue::Double(v) => write!(f, "{}", v),
            SqlValue::Decimal(v) => write!(f, "{}", v),
            SqlValue::Char(v) => write!(f, "{}", v),
            SqlValue::Text(v) => write!(f, "{}", v),
            SqlValue::Date(v) => write!(f, "{}", v.format(DATE_FORMAT)),
            SqlValue::Time(v) => write!(f, "{}", v.format(TIME_FORMAT)),
            SqlValue::Timestamp(v) => write!(f, "{}", v.format(TIMESTAMP_FORMAT)),
            SqlValue::Blob(bytes) => {
                write!(f, "\\x")?;
                for b in bytes {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_temporal() {
        let ts = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_milli_opt(13, 5, 9, 250)
            .unwrap();
        assert_eq!(
            SqlValue::Timestamp(ts).to_string(),
            "2024-02-29 13:05:09.250"
        );
        assert_eq!(SqlValue::Date(ts.date()).to_string(), "2024-02-29");
        assert_eq!(
            SqlValue::Time(NaiveTime::from_hms_opt(1, 2, 3).unwrap()).to_string(),
            "01:02:03"
        );
    }

    #[test]
    fn test_display_blob_and_decimal() {
        assert_eq!(SqlValue::Blob(vec![0x0a, 0xff]).to_string(), "\\x0aff");
        assert_eq!(
            SqlValue::Decimal(Decimal::new(1050, 2)).to_string(),
            "10.50"
        );
    }

    #[test]
    fn test_numeric_helpers() {
        assert_eq!(SqlValue::Short(-4).as_i128(), Some(-4));
        assert!(SqlValue::BigInteger(1).is_integral());
        assert!(SqlValue::Float(1.0).is_fractional());
        assert!(!SqlValue::Text("1".into()).is_fractional());
        assert_eq!(SqlValue::Decimal(Decimal::ONE).type_tag(), "bigdecimal");
    }
}
