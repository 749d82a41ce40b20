//! Expected-result fixture documents and compare-mode error artifacts.
//!
//! A fixture stores the outcome of one query as YAML:
//!
//! ```yaml
//! query: SELECT id, name FROM users ORDER BY id
//! result:
//!   select:
//!     - { name: id, type: integer }
//!     - { name: name, type: string }
//!   table:
//!     column_count: 2
//!     row_count: 1
//!     rows:
//!       - [{ integer: 1 }, { string: alice }]
//! ```
//!
//! `result` holds exactly one of `update`, `exception`, `select` + `table`,
//! `sql` or `no_result`.

use crate::error::{CoreError, CoreResult};
use crate::serde_helpers::is_false;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Cell tag names understood in fixture tables
pub mod tags {
    pub const STRING: &str = "string";
    pub const INTEGER: &str = "integer";
    pub const LONG: &str = "long";
    pub const SHORT: &str = "short";
    pub const BYTE: &str = "byte";
    pub const BIG_INTEGER: &str = "biginteger";
    pub const FLOAT: &str = "float";
    pub const DOUBLE: &str = "double";
    pub const BIG_DECIMAL: &str = "bigdecimal";
    pub const BOOLEAN: &str = "boolean";
    pub const CHAR: &str = "char";
    pub const DATE: &str = "date";
    pub const TIME: &str = "time";
    pub const TIMESTAMP: &str = "timestamp";
    /// Base64 of the UTF-8 text; used for values unsafe in the document
    pub const UNPRINTABLE: &str = "unprintable";
    /// Expected-only: the actual value's text must fully match the pattern
    pub const REGEX: &str = "regex";
}

/// One fixture file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureDocument {
    /// SQL text the fixture was recorded for
    pub query: String,

    /// Recorded outcome
    pub result: FixtureResult,
}

/// Outcome section of a fixture
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<FixtureException>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Vec<FixtureColumn>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<FixtureTable>,

    /// Substitute SQL whose live outcome becomes the expectation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub no_result: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureException {
    /// Error class name
    pub class: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Full-match pattern for the root-cause message; `.` matches newlines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_regex: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureTable {
    pub column_count: usize,
    pub row_count: usize,
    /// `None` entries are SQL NULL
    #[serde(default)]
    pub rows: Vec<Vec<Option<FixtureCell>>>,
}

/// A typed cell written as a single-entry map, e.g. `{ integer: 7 }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, serde_yaml::Value>",
    into = "BTreeMap<String, serde_yaml::Value>"
)]
pub struct FixtureCell {
    pub tag: String,
    pub value: String,
}

impl FixtureCell {
    pub fn new(tag: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            value: value.into(),
        }
    }
}

impl TryFrom<BTreeMap<String, serde_yaml::Value>> for FixtureCell {
    type Error = String;

    fn try_from(map: BTreeMap<String, serde_yaml::Value>) -> Result<Self, Self::Error> {
        if map.len() != 1 {
            return Err(format!(
                "a cell must have exactly one type tag, found {}",
                map.len()
            ));
        }
        let Some((tag, value)) = map.into_iter().next() else {
            return Err("empty cell".to_string());
        };
        let value = match value {
            serde_yaml::Value::String(s) => s,
            serde_yaml::Value::Number(n) => n.to_string(),
            serde_yaml::Value::Bool(b) => b.to_string(),
            serde_yaml::Value::Null => String::new(),
            _ => return Err(format!("cell '{}' must hold a scalar value", tag)),
        };
        Ok(Self { tag, value })
    }
}

impl From<FixtureCell> for BTreeMap<String, serde_yaml::Value> {
    fn from(cell: FixtureCell) -> Self {
        let mut map = BTreeMap::new();
        map.insert(cell.tag, serde_yaml::Value::String(cell.value));
        map
    }
}

/// Validated view of a fixture's single outcome
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FixtureOutcome<'a> {
    Update(u64),
    Exception(&'a FixtureException),
    Table {
        columns: &'a [FixtureColumn],
        table: &'a FixtureTable,
    },
    Sql(&'a str),
    NoResult,
}

impl FixtureResult {
    pub fn update(count: u64) -> Self {
        Self {
            update: Some(count),
            ..Self::default()
        }
    }

    pub fn exception(exception: FixtureException) -> Self {
        Self {
            exception: Some(exception),
            ..Self::default()
        }
    }

    pub fn table(columns: Vec<FixtureColumn>, rows: Vec<Vec<Option<FixtureCell>>>) -> Self {
        let table = FixtureTable {
            column_count: columns.len(),
            row_count: rows.len(),
            rows,
        };
        Self {
            select: Some(columns),
            table: Some(table),
            ..Self::default()
        }
    }

    pub fn no_result() -> Self {
        Self {
            no_result: true,
            ..Self::default()
        }
    }

    /// Check the document rules and return the single outcome it describes.
    pub fn outcome(&self) -> CoreResult<FixtureOutcome<'_>> {
        let present = [
            self.update.is_some(),
            self.exception.is_some(),
            self.select.is_some() || self.table.is_some(),
            self.sql.is_some(),
            self.no_result,
        ]
        .iter()
        .filter(|p| **p)
        .count();
        if present != 1 {
            return Err(invalid(format!(
                "result must contain exactly one of update, exception, select/table, sql or no_result (found {})",
                present
            )));
        }

        if let Some(count) = self.update {
            return Ok(FixtureOutcome::Update(count));
        }
        if let Some(exception) = &self.exception {
            if exception.class.trim().is_empty() {
                return Err(invalid("exception class cannot be empty"));
            }
            return Ok(FixtureOutcome::Exception(exception));
        }
        if let Some(sql) = &self.sql {
            if sql.trim().is_empty() {
                return Err(invalid("sql cannot be empty"));
            }
            return Ok(FixtureOutcome::Sql(sql));
        }
        if self.no_result {
            return Ok(FixtureOutcome::NoResult);
        }

        let (Some(columns), Some(table)) = (&self.select, &self.table) else {
            return Err(invalid("select and table must be specified together"));
        };
        if table.column_count != columns.len() {
            return Err(invalid(format!(
                "column_count {} does not match {} select columns",
                table.column_count,
                columns.len()
            )));
        }
        if table.row_count != table.rows.len() {
            return Err(invalid(format!(
                "row_count {} does not match {} rows",
                table.row_count,
                table.rows.len()
            )));
        }
        for (i, row) in table.rows.iter().enumerate() {
            if row.len() != table.column_count {
                return Err(invalid(format!(
                    "row {} has {} cells, expected {}",
                    i + 1,
                    row.len(),
                    table.column_count
                )));
            }
        }
        Ok(FixtureOutcome::Table { columns, table })
    }
}

fn invalid(message: impl Into<String>) -> CoreError {
    CoreError::FixtureInvalid {
        message: message.into(),
    }
}

impl FixtureDocument {
    /// Load and validate a fixture file
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| CoreError::io_with_path(path, e))?;
        let doc: FixtureDocument =
            serde_yaml::from_str(&content).map_err(|e| CoreError::FixtureParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        doc.result.outcome()?;
        Ok(doc)
    }

    /// Write the fixture, creating parent directories as needed
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        write_yaml(path, self)
    }
}

/// Diff artifact written when a query fails in compare mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorArtifact {
    pub query: String,
    /// Fixture as stored; absent when the query never had one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<FixtureResult>,
    /// Live outcome, including the stack trace of an error
    pub actual: FixtureResult,
    pub failures: Vec<String>,
}

impl ErrorArtifact {
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        write_yaml(path, self)
    }
}

fn write_yaml<T: Serialize>(path: &Path, value: &T) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| CoreError::io_with_path(parent, e))?;
    }
    let yaml = serde_yaml::to_string(value)?;
    fs::write(path, yaml).map_err(|e| CoreError::io_with_path(path, e))
}

#[cfg(test)]
#[path = "fixture_test.rs"]
mod tests;
