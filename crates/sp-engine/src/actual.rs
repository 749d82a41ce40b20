//! Live query outcomes

use base64::Engine;
use sp_db::{ColumnMeta, DatabaseError, SqlValue, StatementOutcome};
use std::error::Error;

/// A database error as seen by the comparator
#[derive(Debug, Clone, PartialEq)]
pub struct ActualException {
    /// Class of the outermost error
    pub class: String,
    pub message: String,
    /// Message of the deepest error in the cause chain
    pub root_cause_message: String,
    /// One `Class: message` line per error in the chain
    pub stack_trace: String,
}

impl ActualException {
    pub fn from_database_error(err: &DatabaseError) -> Self {
        Self {
            class: err.class.clone(),
            message: err.message.clone(),
            root_cause_message: root_cause(err).to_string(),
            stack_trace: stack_trace(err),
        }
    }
}

/// Column metadata and rows of a tabular outcome
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    pub columns: Vec<ColumnMeta>,
    pub rows: Vec<Vec<SqlValue>>,
}

/// Normalized outcome of one query execution
#[derive(Debug, Clone, PartialEq)]
pub enum ActualResult {
    Exception(ActualException),
    Update(u64),
    Table(ResultTable),
    NoResult,
}

impl ActualResult {
    /// Build from a decoded statement outcome.
    ///
    /// Binary cells are carried as base64 text.
    pub fn from_outcome(outcome: StatementOutcome) -> Self {
        match outcome {
            StatementOutcome::Update(count) => ActualResult::Update(count),
            StatementOutcome::NoResult => ActualResult::NoResult,
            StatementOutcome::Rows { columns, rows } => {
                let rows = rows
                    .into_iter()
                    .map(|row| row.into_iter().map(encode_blob).collect())
                    .collect();
                ActualResult::Table(ResultTable { columns, rows })
            }
        }
    }

    pub fn from_error(err: &DatabaseError) -> Self {
        ActualResult::Exception(ActualException::from_database_error(err))
    }

    pub fn exception(&self) -> Option<&ActualException> {
        match self {
            ActualResult::Exception(e) => Some(e),
            _ => None,
        }
    }

    /// Short name of the variant, used in mismatch messages
    pub fn kind(&self) -> &'static str {
        match self {
            ActualResult::Exception(_) => "exception",
            ActualResult::Update(_) => "update",
            ActualResult::Table(_) => "table",
            ActualResult::NoResult => "no-result",
        }
    }
}

fn encode_blob(value: SqlValue) -> SqlValue {
    match value {
        SqlValue::Blob(bytes) => {
            SqlValue::Text(base64::engine::general_purpose::STANDARD.encode(bytes))
        }
        other => other,
    }
}

/// Follow `source()` links until the last error in the chain.
pub fn root_cause<'a>(err: &'a (dyn Error + 'static)) -> &'a (dyn Error + 'static) {
    let mut current = err;
    while let Some(next) = current.source() {
        current = next;
    }
    current
}

fn stack_trace(err: &DatabaseError) -> String {
    let mut lines = vec![err.describe()];
    let mut cause = err.cause.as_deref();
    while let Some(c) = cause {
        lines.push(format!("Caused by: {}", c.describe()));
        cause = c.cause.as_deref();
    }
    lines.join("\n")
}
