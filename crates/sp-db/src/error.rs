//! Error types for sp-db

use std::fmt;
use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Unknown connection strategy (D002)
    #[error("[D002] Unknown connection strategy '{name}'. Available: {available}")]
    UnknownStrategy { name: String, available: String },

    /// Strategy used before `init` (D003)
    #[error("[D003] Connection strategy '{0}' is not initialized")]
    NotInitialized(String),

    /// Mutex poisoned (D004)
    #[error("[D004] Database mutex poisoned: {0}")]
    MutexPoisoned(String),

    /// A result value could not be read (D005)
    #[error("[D005] Unable to decode result: {0}")]
    DecodeError(String),

    /// The database rejected the statement (D006)
    #[error("[D006] {0}")]
    Sql(#[from] DatabaseError),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

/// SQL state of connection-level failures
pub const CONNECTION_FAILURE_STATE: &str = "08000";

/// An error raised by the database for one statement.
///
/// Mirrors what a driver reports: an error class, the message, an optional
/// SQL state and an optional underlying cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseError {
    pub class: String,
    pub message: String,
    pub sql_state: Option<String>,
    pub cause: Option<Box<DatabaseError>>,
}

impl DatabaseError {
    pub fn new(class: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            message: message.into(),
            sql_state: None,
            cause: None,
        }
    }

    pub fn with_sql_state(mut self, state: impl Into<String>) -> Self {
        self.sql_state = Some(state.into());
        self
    }

    pub fn with_cause(mut self, cause: DatabaseError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// SQL-state class "08": the server or the link to it is gone
    pub fn is_connection_failure(&self) -> bool {
        self.sql_state
            .as_deref()
            .is_some_and(|s| s.starts_with("08"))
    }

    /// `Class: message`, the way the error is shown in reports
    pub fn describe(&self) -> String {
        format!("{}: {}", self.class, self.message)
    }

    /// Build from a DuckDB error, deriving class and SQL state from the
    /// `<Kind> Error:` prefix DuckDB puts on its messages.
    pub fn from_duckdb(err: &duckdb::Error) -> Self {
        let text = err.to_string();
        match split_duckdb_kind(&text) {
            Some((kind, message)) => DatabaseError::new(class_name(kind), message)
                .with_sql_state(sql_state_for(kind)),
            None => DatabaseError::new("DuckDbError", text).with_sql_state("HY000"),
        }
    }
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DatabaseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|c| c as &(dyn std::error::Error + 'static))
    }
}

/// `"Catalog Error: Table x does not exist"` -> `("Catalog", "Table x does not exist")`
fn split_duckdb_kind(text: &str) -> Option<(&str, &str)> {
    let (head, rest) = text.split_once(": ")?;
    let kind = head.strip_suffix(" Error")?;
    if kind.is_empty() || !kind.chars().all(|c| c.is_ascii_alphabetic() || c == ' ') {
        return None;
    }
    Some((kind, rest.trim()))
}

fn class_name(kind: &str) -> String {
    let mut name: String = kind
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();
    name.push_str("Error");
    name
}

fn sql_state_for(kind: &str) -> &'static str {
    match kind.to_ascii_lowercase().as_str() {
        "connection" => CONNECTION_FAILURE_STATE,
        "io" => "58030",
        "parser" | "syntax" => "42601",
        "catalog" => "42P01",
        "binder" => "42703",
        "constraint" => "23000",
        "conversion" => "22018",
        "out of range" => "22003",
        "invalid input" => "22023",
        "interrupt" => "57014",
        "transaction" => "25000",
        "not implemented" => "0A000",
        _ => "HY000",
    }
}

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        match err {
            duckdb::Error::FromSqlConversionFailure(..)
            | duckdb::Error::InvalidColumnType(..)
            | duckdb::Error::IntegralValueOutOfRange(..) => DbError::DecodeError(err.to_string()),
            other => DbError::Sql(DatabaseError::from_duckdb(&other)),
        }
    }
}

impl DbError {
    /// View any error as a database error. Errors that mean the connection
    /// itself is unusable carry the connection-failure SQL state.
    pub fn into_database_error(self) -> DatabaseError {
        match self {
            DbError::Sql(e) => e,
            DbError::DecodeError(m) => DatabaseError::new("DecodeError", m),
            other => DatabaseError::new("ConnectionError", other.to_string())
                .with_sql_state(CONNECTION_FAILURE_STATE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_duckdb_kind() {
        assert_eq!(
            split_duckdb_kind("Catalog Error: Table with name x does not exist!"),
            Some(("Catalog", "Table with name x does not exist!"))
        );
        assert_eq!(
            split_duckdb_kind("Out of Range Error: value too large"),
            Some(("Out of Range", "value too large"))
        );
        assert_eq!(split_duckdb_kind("plain message"), None);
        assert_eq!(split_duckdb_kind("Note: not an error"), None);
    }

    #[test]
    fn test_class_and_state() {
        assert_eq!(class_name("Out of Range"), "OutOfRangeError");
        assert_eq!(class_name("Catalog"), "CatalogError");
        assert_eq!(sql_state_for("Connection"), "08000");
        assert_eq!(sql_state_for("Something New"), "HY000");
    }

    #[test]
    fn test_connection_failure() {
        let e = DatabaseError::new("ConnectionError", "gone").with_sql_state("08006");
        assert!(e.is_connection_failure());
        let e = DatabaseError::new("CatalogError", "missing").with_sql_state("42P01");
        assert!(!e.is_connection_failure());
        assert!(!DatabaseError::new("X", "no state").is_connection_failure());
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error;
        let root = DatabaseError::new("IoError", "disk full");
        let top = DatabaseError::new("TransactionError", "commit failed").with_cause(root);
        let source = top.source().unwrap();
        assert_eq!(source.to_string(), "disk full");
        assert!(source.source().is_none());
    }

    #[test]
    fn test_into_database_error() {
        let e = DbError::MutexPoisoned("boom".into()).into_database_error();
        assert!(e.is_connection_failure());
        let e = DbError::DecodeError("bad".into()).into_database_error();
        assert_eq!(e.class, "DecodeError");
        assert!(!e.is_connection_failure());
    }
}
