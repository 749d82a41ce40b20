//! sp-sql - SQL parsing layer for sqlproof
//!
//! This crate wraps sqlparser-rs with dialect support and answers the two
//! questions the engine asks about a statement: does it produce rows, and
//! does it fix the order of those rows.

pub mod classify;
pub mod dialect;
pub mod error;
pub mod parser;

pub use classify::StatementInfo;
pub use dialect::{DuckDbDialect, GenericDialect, SqlDialect};
pub use error::{SqlError, SqlResult};
pub use parser::SqlParser;
