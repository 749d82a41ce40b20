//! SQL dialect abstraction

use sqlparser::ast::Statement;
use sqlparser::dialect::{
    Dialect, DuckDbDialect as SqlParserDuckDb, GenericDialect as SqlParserGeneric,
};
use sqlparser::parser::Parser;

use crate::error::{SqlError, SqlResult};

/// Trait for SQL dialect implementations
pub trait SqlDialect: Send + Sync {
    /// Get the underlying sqlparser dialect
    fn parser_dialect(&self) -> &dyn Dialect;

    /// Parse SQL into AST statements
    fn parse(&self, sql: &str) -> SqlResult<Vec<Statement>> {
        Parser::parse_sql(self.parser_dialect(), sql).map_err(|e| parse_error(sql, e.to_string()))
    }

    /// Get the dialect name
    fn name(&self) -> &'static str;
}

/// Characters of the statement quoted after a parse error
const NEAR_CHARS: usize = 24;

/// Build a parse error that quotes the statement where the parser stopped.
fn parse_error(sql: &str, message: String) -> SqlError {
    let (line, column) = location_in_message(&message);
    SqlError::ParseError {
        near: text_at(sql, line, column),
        message,
        line,
        column,
    }
}

/// Read "Line: N, Column: M" back out of a sqlparser message; (0, 0) when absent.
fn location_in_message(msg: &str) -> (usize, usize) {
    let number_after = |label: &str| -> Option<usize> {
        let start = msg.rfind(label)? + label.len();
        let digits: String = msg[start..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok()
    };
    match (number_after("Line: "), number_after("Column: ")) {
        (Some(line), Some(column)) => (line, column),
        _ => (0, 0),
    }
}

/// The rest of 1-based `line` from `column`, cut to [`NEAR_CHARS`].
fn text_at(sql: &str, line: usize, column: usize) -> String {
    if line == 0 || column == 0 {
        return String::new();
    }
    sql.lines()
        .nth(line - 1)
        .map(|l| {
            l.chars()
                .skip(column - 1)
                .take(NEAR_CHARS)
                .collect::<String>()
                .trim_end()
                .to_string()
        })
        .unwrap_or_default()
}

/// DuckDB SQL dialect
pub struct DuckDbDialect {
    dialect: SqlParserDuckDb,
}

impl DuckDbDialect {
    /// Create a new DuckDB dialect
    pub fn new() -> Self {
        Self {
            dialect: SqlParserDuckDb {},
        }
    }
}

impl Default for DuckDbDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlDialect for DuckDbDialect {
    fn parser_dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    fn name(&self) -> &'static str {
        "duckdb"
    }
}

/// ANSI-leaning dialect for connection strategies without a dedicated one
pub struct GenericDialect {
    dialect: SqlParserGeneric,
}

impl GenericDialect {
    pub fn new() -> Self {
        Self {
            dialect: SqlParserGeneric {},
        }
    }
}

impl Default for GenericDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlDialect for GenericDialect {
    fn parser_dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    fn name(&self) -> &'static str {
        "generic"
    }
}
