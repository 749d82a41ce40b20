//! Connection traits

use crate::error::DbResult;
use crate::value::SqlValue;
use sp_core::ConnectionConfig;

/// Label and declared type of one result column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    pub label: String,
    pub type_name: String,
}

impl ColumnMeta {
    pub fn new(label: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            type_name: type_name.into(),
        }
    }
}

/// What executing one statement produced
#[derive(Debug, Clone, PartialEq)]
pub enum StatementOutcome {
    /// Number of rows changed (0 for DDL)
    Update(u64),
    Rows {
        columns: Vec<ColumnMeta>,
        rows: Vec<Vec<SqlValue>>,
    },
    /// The statement produced neither rows nor a count
    NoResult,
}

/// An open database connection
///
/// The statement handle lives only for the duration of `execute`; it is
/// released before the outcome is returned.
pub trait DbConnection: Send {
    /// Execute one SQL text and decode its outcome
    fn execute(&self, sql: &str) -> DbResult<StatementOutcome>;
}

/// Opens, validates and closes connections for a scenario
pub trait ConnectionStrategy: Send {
    /// Name the strategy is registered under
    fn name(&self) -> &str;

    /// Configure the strategy; called once per scenario before `get_connection`
    fn init(&mut self, config: &ConnectionConfig) -> DbResult<()>;

    fn get_connection(&self) -> DbResult<Box<dyn DbConnection>>;

    /// Whether `conn` can still run statements
    fn is_connection_valid(&self, conn: &dyn DbConnection) -> bool;

    fn close_connection(&self, conn: Box<dyn DbConnection>);
}

/// Run the probe statement (or `SELECT 1`) and report whether it succeeded.
pub fn probe_connection(conn: &dyn DbConnection, valid_sql: Option<&str>) -> bool {
    let sql = valid_sql.unwrap_or("SELECT 1");
    match conn.execute(sql) {
        Ok(_) => true,
        Err(e) => {
            log::debug!("Connection validation '{}' failed: {}", sql, e);
            false
        }
    }
}
