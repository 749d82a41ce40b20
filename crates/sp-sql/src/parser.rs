//! SQL parser wrapper

use crate::classify::{self, StatementInfo};
use crate::dialect::{DuckDbDialect, GenericDialect, SqlDialect};
use crate::error::{SqlError, SqlResult};
use sqlparser::ast::Statement;

/// SQL parser that wraps sqlparser-rs with dialect support
pub struct SqlParser {
    dialect: Box<dyn SqlDialect>,
}

impl SqlParser {
    /// Create a new parser with DuckDB dialect
    pub fn duckdb() -> Self {
        Self {
            dialect: Box::new(DuckDbDialect::new()),
        }
    }

    /// Create a new parser with the generic dialect
    pub fn generic() -> Self {
        Self {
            dialect: Box::new(GenericDialect::new()),
        }
    }

    /// Create a parser from dialect name
    pub fn from_dialect_name(name: &str) -> SqlResult<Self> {
        match name.to_lowercase().as_str() {
            "duckdb" => Ok(Self::duckdb()),
            "generic" | "ansi" => Ok(Self::generic()),
            _ => Err(SqlError::UnknownDialect(name.to_string())),
        }
    }

    /// Parse SQL into AST statements
    ///
    /// Error locations count lines of `sql` as given, leading blank lines included.
    pub fn parse(&self, sql: &str) -> SqlResult<Vec<Statement>> {
        if sql.trim().is_empty() {
            return Err(SqlError::EmptySql);
        }

        self.dialect.parse(sql.trim_end())
    }

    /// Parse SQL and return the first statement
    pub fn parse_single(&self, sql: &str) -> SqlResult<Statement> {
        let stmts = self.parse(sql)?;
        stmts.into_iter().next().ok_or(SqlError::EmptySql)
    }

    /// Classify `sql`, falling back to keyword inspection when it does not
    /// parse in this dialect.
    pub fn classify(&self, sql: &str) -> StatementInfo {
        match self.parse(sql) {
            Ok(stmts) => classify::from_statements(&stmts),
            Err(e) => {
                log::debug!("Classifying by keywords: {}", e);
                classify::from_keywords(sql)
            }
        }
    }

    /// Get the dialect name
    pub fn dialect_name(&self) -> &'static str {
        self.dialect.name()
    }
}

impl Default for SqlParser {
    fn default() -> Self {
        Self::duckdb()
    }
}

#[cfg(test)]
#[path = "parser_test.rs"]
mod tests;
