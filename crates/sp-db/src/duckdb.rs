//! DuckDB connection strategy

use crate::error::{DatabaseError, DbError, DbResult};
use crate::traits::{
    probe_connection, ColumnMeta, ConnectionStrategy, DbConnection, StatementOutcome,
};
use crate::value::SqlValue;
use chrono::{DateTime, NaiveDate, NaiveTime};
use duckdb::arrow::datatypes::DataType;
use duckdb::types::{TimeUnit, Value};
use duckdb::Connection;
use sp_core::ConnectionConfig;
use sp_sql::SqlParser;
use std::path::Path;
use std::sync::Mutex;

/// Days from 0001-01-01 (CE) to 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// DuckDB connection
pub struct DuckDbConnection {
    conn: Mutex<Connection>,
    parser: SqlParser,
}

impl DuckDbConnection {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self::wrap(conn))
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path).map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self::wrap(conn))
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn wrap(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            parser: SqlParser::duckdb(),
        }
    }

    fn query_rows(conn: &Connection, sql: &str) -> DbResult<StatementOutcome> {
        let mut stmt = conn.prepare(sql)?;

        // Column metadata is only available once the statement has run,
        // so rows are collected first.
        let raw_rows: Vec<Vec<Value>> = stmt
            .query_map([], |row| {
                let width = row.as_ref().column_count();
                (0..width)
                    .map(|i| row.get::<_, Value>(i))
                    .collect::<duckdb::Result<Vec<Value>>>()
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let columns: Vec<ColumnMeta> = (0..stmt.column_count())
            .map(|i| {
                let label = stmt
                    .column_name(i)
                    .map_or_else(|_| format!("column{}", i + 1), |n| n.to_string());
                ColumnMeta::new(label, type_name(&stmt.column_type(i)))
            })
            .collect();

        let rows = raw_rows
            .into_iter()
            .map(|row| row.into_iter().map(convert_value).collect())
            .collect::<DbResult<Vec<Vec<SqlValue>>>>()?;

        Ok(StatementOutcome::Rows { columns, rows })
    }
}

impl DbConnection for DuckDbConnection {
    fn execute(&self, sql: &str) -> DbResult<StatementOutcome> {
        let info = self.parser.classify(sql);
        let conn = self
            .conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))?;

        if info.returns_rows && info.statement_count > 1 {
            // Run everything but the last statement as a batch, then query.
            let statements = self.parser.parse(sql).map_err(|e| {
                DatabaseError::new("ParserError", e.to_string()).with_sql_state("42601")
            })?;
            let Some((last, head)) = statements.split_last() else {
                return Ok(StatementOutcome::NoResult);
            };
            let batch = head
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(";\n");
            conn.execute_batch(&batch)?;
            Self::query_rows(&conn, &last.to_string())
        } else if info.returns_rows {
            Self::query_rows(&conn, sql)
        } else if info.statement_count > 1 {
            conn.execute_batch(sql)?;
            Ok(StatementOutcome::Update(0))
        } else {
            let changed = conn.execute(sql, [])?;
            Ok(StatementOutcome::Update(changed as u64))
        }
    }
}

/// Fixture type name for an Arrow column type
fn type_name(data_type: &DataType) -> &'static str {
    match data_type {
        DataType::Boolean => "boolean",
        DataType::Int8 => "byte",
        DataType::Int16 | DataType::UInt8 => "short",
        DataType::Int32 | DataType::UInt16 => "integer",
        DataType::Int64 | DataType::UInt32 => "long",
        DataType::UInt64 => "biginteger",
        DataType::Float16 | DataType::Float32 => "float",
        DataType::Float64 => "double",
        DataType::Decimal128(..) | DataType::Decimal256(..) => "bigdecimal",
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => "string",
        DataType::Binary
        | DataType::LargeBinary
        | DataType::BinaryView
        | DataType::FixedSizeBinary(_) => "blob",
        DataType::Date32 | DataType::Date64 => "date",
        DataType::Time32(_) | DataType::Time64(_) => "time",
        DataType::Timestamp(..) => "timestamp",
        DataType::Null => "null",
        _ => "object",
    }
}

fn to_micros(unit: TimeUnit, value: i64) -> i64 {
    match unit {
        TimeUnit::Second => value.saturating_mul(1_000_000),
        TimeUnit::Millisecond => value.saturating_mul(1_000),
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    }
}

fn decode_error(what: &str, value: impl std::fmt::Debug) -> DbError {
    DbError::DecodeError(format!("{} out of range: {:?}", what, value))
}

/// Convert a DuckDB value into a typed cell
fn convert_value(value: Value) -> DbResult<SqlValue> {
    Ok(match value {
        Value::Null => SqlValue::Null,
        Value::Boolean(v) => SqlValue::Boolean(v),
        Value::TinyInt(v) => SqlValue::Byte(v),
        Value::SmallInt(v) => SqlValue::Short(v),
        Value::Int(v) => SqlValue::Integer(v),
        Value::BigInt(v) => SqlValue::Long(v),
        Value::HugeInt(v) => SqlValue::BigInteger(v),
        Value::UTinyInt(v) => SqlValue::Short(i16::from(v)),
        Value::USmallInt(v) => SqlValue::Integer(i32::from(v)),
        Value::UInt(v) => SqlValue::Long(i64::from(v)),
        Value::UBigInt(v) => SqlValue::BigInteger(i128::from(v)),
        Value::Float(v) => SqlValue::Float(v),
        Value::Double(v) => SqlValue::Double(v),
        Value::Decimal(v) => SqlValue::Decimal(v),
        Value::Text(v) => SqlValue::Text(v),
        Value::Enum(v) => SqlValue::Text(v),
        Value::Blob(v) => SqlValue::Blob(v),
        Value::Date32(days) => days
            .checked_add(UNIX_EPOCH_DAYS_FROM_CE)
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .map(SqlValue::Date)
            .ok_or_else(|| decode_error("date", days))?,
        Value::Time64(unit, v) => {
            let micros = to_micros(unit, v);
            let secs = u32::try_from(micros.div_euclid(1_000_000))
                .map_err(|_| decode_error("time", v))?;
            let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
            NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
                .map(SqlValue::Time)
                .ok_or_else(|| decode_error("time", v))?
        }
        Value::Timestamp(unit, v) => DateTime::from_timestamp_micros(to_micros(unit, v))
            .map(|dt| SqlValue::Timestamp(dt.naive_utc()))
            .ok_or_else(|| decode_error("timestamp", v))?,
        other => SqlValue::Text(format!("{:?}", other)),
    })
}

/// Connection strategy opening DuckDB databases by path
#[derive(Default)]
pub struct DuckDbStrategy {
    config: Option<ConnectionConfig>,
}

impl DuckDbStrategy {
    pub const NAME: &'static str = "duckdb";

    pub fn new() -> Self {
        Self::default()
    }
}

impl ConnectionStrategy for DuckDbStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn init(&mut self, config: &ConnectionConfig) -> DbResult<()> {
        self.config = Some(config.clone());
        Ok(())
    }

    fn get_connection(&self) -> DbResult<Box<dyn DbConnection>> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| DbError::NotInitialized(Self::NAME.to_string()))?;
        let conn = DuckDbConnection::new(&config.path)?;
        for (key, value) in &config.properties {
            let sql = format!("SET {} = '{}'", key, value.replace('\'', "''"));
            conn.execute(&sql).map_err(|e| {
                DbError::ConnectionError(format!("setting '{}' failed: {}", key, e))
            })?;
        }
        log::debug!("Opened DuckDB connection to {}", config.path);
        Ok(Box::new(conn))
    }

    fn is_connection_valid(&self, conn: &dyn DbConnection) -> bool {
        let sql = self
            .config
            .as_ref()
            .and_then(|c| c.valid_connection_sql.as_deref());
        probe_connection(conn, sql)
    }

    fn close_connection(&self, conn: Box<dyn DbConnection>) {
        drop(conn);
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
