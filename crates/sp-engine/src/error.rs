//! Error types for sp-engine

use sp_core::CoreError;
use sp_db::{DatabaseError, DbError};
use thiserror::Error;

/// Engine setup and I/O errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Suite file could not be turned into a hierarchy (W001)
    #[error("[W001] Failed to load suite '{suite}': {source}")]
    SuiteLoad {
        suite: String,
        #[source]
        source: CoreError,
    },

    /// Scenario could not acquire or ping its connection (W002)
    #[error("[W002] Scenario '{scenario}' setup failed: {message}")]
    ScenarioSetup { scenario: String, message: String },

    /// Fixture content could not be turned into an expected result (W003)
    #[error("[W003] Invalid expected result: {0}")]
    InvalidExpected(String),

    /// Artifact or summary file could not be written (W004)
    #[error("[W004] Failed to write {path}: {message}")]
    WriteFailed { path: String, message: String },

    /// The run thread died without returning a report (W005)
    #[error("[W005] Run thread panicked")]
    WorkerPanicked,

    /// Core error (W006)
    #[error("[W006] {0}")]
    Core(#[from] CoreError),

    /// Database error (W007)
    #[error("[W007] {0}")]
    Db(#[from] DbError),
}

/// Result type alias for EngineError
pub type EngineResult<T> = Result<T, EngineError>;

/// Conditions that abort the running query-set and propagate to the scenario
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    /// Connection-level database error (SQL state class "08")
    #[error("Server not available: {0}")]
    ServerNotAvailable(DatabaseError),

    /// The statement failed and the connection no longer validates
    #[error("Database not available: {0}")]
    DbNotAvailable(DatabaseError),

    #[error("Max time exceeded.")]
    MaxTimeExceeded,

    #[error("Execution interrupted.")]
    Interrupted,
}

pub type ExecutionResult<T> = Result<T, ExecutionError>;
