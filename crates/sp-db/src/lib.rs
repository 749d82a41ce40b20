//! sp-db - Database layer for sqlproof
//!
//! This crate provides the `DbConnection` and `ConnectionStrategy` traits,
//! the typed `SqlValue` cell model, a name-keyed `ConnectionRegistry`, and
//! the DuckDB implementation.

pub mod duckdb;
pub mod error;
pub mod registry;
pub mod traits;
pub mod value;

pub use duckdb::{DuckDbConnection, DuckDbStrategy};
pub use error::{DatabaseError, DbError, DbResult};
pub use registry::ConnectionRegistry;
pub use traits::{ColumnMeta, ConnectionStrategy, DbConnection, StatementOutcome};
pub use value::SqlValue;
