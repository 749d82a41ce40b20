//! Statement classification

use sqlparser::ast::Statement;

/// What the engine needs to know about a statement before running it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatementInfo {
    /// The (last) statement produces a result set
    pub returns_rows: bool,
    /// The result set order is fixed by an ORDER BY
    pub ordered: bool,
    /// Number of statements in the text
    pub statement_count: usize,
}

impl StatementInfo {
    /// Rows may be compared order-independently
    pub fn sortable(&self) -> bool {
        !self.ordered
    }
}

/// Keywords that start a row-producing statement
const ROW_KEYWORDS: &[&str] = &[
    "SELECT",
    "WITH",
    "VALUES",
    "FROM",
    "TABLE",
    "SHOW",
    "DESCRIBE",
    "DESC",
    "EXPLAIN",
    "PRAGMA",
    "SUMMARIZE",
    "CALL",
];

pub fn from_statements(stmts: &[Statement]) -> StatementInfo {
    let last = stmts.last();
    StatementInfo {
        returns_rows: last.is_some_and(returns_rows),
        ordered: last.is_some_and(has_order_by),
        statement_count: stmts.len(),
    }
}

pub fn returns_rows(stmt: &Statement) -> bool {
    match stmt {
        Statement::Query(_)
        | Statement::Explain { .. }
        | Statement::ExplainTable { .. }
        | Statement::ShowTables { .. }
        | Statement::ShowColumns { .. }
        | Statement::ShowCreate { .. }
        | Statement::ShowVariable { .. }
        | Statement::ShowFunctions { .. }
        | Statement::Pragma { .. }
        | Statement::Call { .. } => true,
        Statement::Insert(insert) => insert.returning.is_some(),
        Statement::Update(update) => update.returning.is_some(),
        Statement::Delete(delete) => delete.returning.is_some(),
        _ => false,
    }
}

pub fn has_order_by(stmt: &Statement) -> bool {
    match stmt {
        Statement::Query(query) => query.order_by.is_some(),
        _ => false,
    }
}

/// Classification for SQL the parser rejects: the first keyword decides
/// whether rows come back, and any `ORDER BY` counts as ordering.
pub fn from_keywords(sql: &str) -> StatementInfo {
    let code: Vec<&str> = sql
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with("--"))
        .collect();
    let normalized = code
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase();

    let first = normalized
        .trim_start_matches('(')
        .split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .next()
        .unwrap_or("");

    let padded = format!(" {} ", normalized);
    StatementInfo {
        returns_rows: ROW_KEYWORDS.contains(&first) || padded.contains(" RETURNING "),
        ordered: padded.contains(" ORDER BY "),
        statement_count: usize::from(!normalized.is_empty()),
    }
}

#[cfg(test)]
#[path = "classify_test.rs"]
mod tests;
