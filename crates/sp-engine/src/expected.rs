//! Expected query outcomes built from fixtures

use crate::actual::ActualResult;
use crate::cell::ExpectedCell;
use crate::error::{EngineError, EngineResult};
use regex::Regex;
use sp_core::{FixtureOutcome, FixtureResult};
use sp_db::{ColumnMeta, DbConnection};

/// What a query is expected to produce
#[derive(Debug, Clone)]
pub enum ExpectedResult {
    Exception {
        class: String,
        message: Option<String>,
        /// Full match against the root-cause message, `.` matching newlines
        pattern: Option<Regex>,
    },
    Update(u64),
    Table {
        columns: Vec<ColumnMeta>,
        rows: Vec<Vec<ExpectedCell>>,
    },
    NoResult,
    /// Not yet resolved: the outcome of this SQL becomes the expectation
    Sql(String),
}

impl ExpectedResult {
    /// Convert a validated fixture outcome.
    pub fn from_fixture(result: &FixtureResult) -> EngineResult<Self> {
        Ok(match result.outcome()? {
            FixtureOutcome::Update(count) => ExpectedResult::Update(count),
            FixtureOutcome::NoResult => ExpectedResult::NoResult,
            FixtureOutcome::Sql(sql) => ExpectedResult::Sql(sql.to_string()),
            FixtureOutcome::Exception(e) => {
                let pattern = e
                    .message_regex
                    .as_deref()
                    .map(|re| {
                        Regex::new(&format!("(?s)^(?:{})$", re)).map_err(|err| {
                            EngineError::InvalidExpected(format!(
                                "bad message pattern '{}': {}",
                                re, err
                            ))
                        })
                    })
                    .transpose()?;
                ExpectedResult::Exception {
                    class: e.class.clone(),
                    message: e.message.clone(),
                    pattern,
                }
            }
            FixtureOutcome::Table { columns, table } => ExpectedResult::Table {
                columns: columns
                    .iter()
                    .map(|c| ColumnMeta::new(&c.name, &c.type_name))
                    .collect(),
                rows: table
                    .rows
                    .iter()
                    .map(|row| {
                        row.iter()
                            .map(|c| ExpectedCell::from_fixture(c.as_ref()))
                            .collect::<EngineResult<Vec<_>>>()
                    })
                    .collect::<EngineResult<Vec<_>>>()?,
            },
        })
    }

    /// Expect exactly what `actual` holds
    pub fn from_actual(actual: &ActualResult) -> Self {
        match actual {
            ActualResult::Exception(e) => ExpectedResult::Exception {
                class: e.class.clone(),
                message: Some(e.root_cause_message.clone()),
                pattern: None,
            },
            ActualResult::Update(count) => ExpectedResult::Update(*count),
            ActualResult::Table(table) => ExpectedResult::Table {
                columns: table.columns.clone(),
                rows: table
                    .rows
                    .iter()
                    .map(|row| row.iter().cloned().map(ExpectedCell::Value).collect())
                    .collect(),
            },
            ActualResult::NoResult => ExpectedResult::NoResult,
        }
    }

    /// Run a pending `Sql` expectation on `conn`; other variants are returned as is.
    pub fn resolve(self, conn: &dyn DbConnection) -> Self {
        let ExpectedResult::Sql(sql) = self else {
            return self;
        };
        log::debug!("Building expected result from SQL: {}", sql);
        let actual = match conn.execute(&sql) {
            Ok(outcome) => ActualResult::from_outcome(outcome),
            Err(e) => ActualResult::from_error(&e.into_database_error()),
        };
        Self::from_actual(&actual)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ExpectedResult::Exception { .. } => "exception",
            ExpectedResult::Update(_) => "update",
            ExpectedResult::Table { .. } => "table",
            ExpectedResult::NoResult => "no-result",
            ExpectedResult::Sql(_) => "sql",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sp_core::{FixtureCell, FixtureColumn, FixtureException};
    use sp_db::{DuckDbConnection, SqlValue};

    #[test]
    fn test_table_fixture() {
        let fixture = FixtureResult::table(
            vec![FixtureColumn {
                name: "id".into(),
                type_name: "integer".into(),
            }],
            vec![vec![Some(FixtureCell::new("integer", "1"))], vec![None]],
        );
        let ExpectedResult::Table { columns, rows } =
            ExpectedResult::from_fixture(&fixture).unwrap()
        else {
            panic!("expected table");
        };
        assert_eq!(columns, vec![ColumnMeta::new("id", "integer")]);
        assert_eq!(rows[0][0], ExpectedCell::Value(SqlValue::Integer(1)));
        assert_eq!(rows[1][0], ExpectedCell::Value(SqlValue::Null));
    }

    #[test]
    fn test_exception_pattern_is_dotall() {
        let fixture = FixtureResult::exception(FixtureException {
            class: "TimeoutError".into(),
            message: None,
            message_regex: Some(".*retry.*".into()),
            stack_trace: None,
        });
        let ExpectedResult::Exception { pattern, .. } =
            ExpectedResult::from_fixture(&fixture).unwrap()
        else {
            panic!("expected exception");
        };
        assert!(pattern.unwrap().is_match("first line\nplease retry"));
    }

    #[test]
    fn test_sql_fallback_resolves_table() {
        let conn = DuckDbConnection::in_memory().unwrap();
        let fixture = FixtureResult {
            sql: Some("SELECT 42 AS answer".into()),
            ..FixtureResult::default()
        };
        let pending = ExpectedResult::from_fixture(&fixture).unwrap();
        assert_eq!(pending.kind(), "sql");
        let ExpectedResult::Table { columns, rows } = pending.resolve(&conn) else {
            panic!("expected table");
        };
        assert_eq!(columns[0].label, "answer");
        assert_eq!(rows, vec![vec![ExpectedCell::Value(SqlValue::Integer(42))]]);
    }

    #[test]
    fn test_sql_fallback_resolves_exception() {
        let conn = DuckDbConnection::in_memory().unwrap();
        let resolved = ExpectedResult::Sql("SELECT * FROM missing_table".into()).resolve(&conn);
        match resolved {
            ExpectedResult::Exception { class, message, .. } => {
                assert_eq!(class, "CatalogError");
                assert!(message.unwrap().contains("missing_table"));
            }
            other => panic!("expected exception, got {:?}", other),
        }
    }
}
