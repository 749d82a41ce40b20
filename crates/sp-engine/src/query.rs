//! A single SQL statement and its latest result

use crate::actual::ActualResult;
use crate::context::ExecutionContext;
use crate::error::ExecutionError;
use crate::progress::{ProgressMonitor, ProgressMonitors};
use crate::strategy::{QueryView, ResultStrategy, Verdict};
use chrono::{DateTime, Utc};
use sp_core::{QueryReport, QueryStatus};
use sp_db::{DatabaseError, DbError};
use std::time::{Duration, Instant};

/// Error class of the synthetic error recorded when a guard fails
pub const GUARD_FAILURE_CLASS: &str = "MetaQuerySetFailure";

/// Why a query has an exception attached
#[derive(Debug, Clone, PartialEq)]
pub enum QueryError {
    /// Ordinary statement error, judged by the result strategy
    Database(DatabaseError),
    ServerNotAvailable(DatabaseError),
    DbNotAvailable(DatabaseError),
    /// The outcome could not be decoded, or the strategy failed
    Internal(String),
}

impl QueryError {
    pub fn describe(&self) -> String {
        match self {
            QueryError::Database(e) => e.describe(),
            QueryError::ServerNotAvailable(e) => format!("Server not available: {}", e),
            QueryError::DbNotAvailable(e) => format!("Database not available: {}", e),
            QueryError::Internal(message) => message.clone(),
        }
    }

    /// The propagating error this exception stands for, if any
    pub fn as_execution_error(&self) -> Option<ExecutionError> {
        match self {
            QueryError::ServerNotAvailable(e) => {
                Some(ExecutionError::ServerNotAvailable(e.clone()))
            }
            QueryError::DbNotAvailable(e) => Some(ExecutionError::DbNotAvailable(e.clone())),
            _ => None,
        }
    }
}

/// Verdict of one execution
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub pass: bool,
    /// Mismatch descriptions from the result strategy
    pub errors: Vec<String>,
    pub exception: Option<QueryError>,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
}

impl QueryResult {
    /// First mismatch, else the exception, as one line
    pub fn first_failure(&self) -> Option<String> {
        self.errors
            .first()
            .cloned()
            .or_else(|| self.exception.as_ref().map(QueryError::describe))
    }
}

#[derive(Debug, Clone)]
pub struct Query {
    pub id: String,
    pub suite_id: String,
    pub sql: String,
    actual: Option<ActualResult>,
    result: Option<QueryResult>,
}

impl Query {
    pub fn new(id: impl Into<String>, suite_id: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            suite_id: suite_id.into(),
            sql: sql.into(),
            actual: None,
            result: None,
        }
    }

    /// `None` until the query ran or was failed by a guard
    pub fn result(&self) -> Option<&QueryResult> {
        self.result.as_ref()
    }

    pub fn actual(&self) -> Option<&ActualResult> {
        self.actual.as_ref()
    }

    pub fn is_executed(&self) -> bool {
        self.result.is_some()
    }

    pub fn is_passed(&self) -> bool {
        self.result.as_ref().is_some_and(|r| r.pass)
    }

    pub fn is_failed(&self) -> bool {
        self.result.as_ref().is_some_and(|r| !r.pass)
    }

    /// Connection-level failure recorded by the last run
    pub fn execution_error(&self) -> Option<ExecutionError> {
        self.result
            .as_ref()
            .and_then(|r| r.exception.as_ref())
            .and_then(QueryError::as_execution_error)
    }

    pub fn reset(&mut self) {
        self.actual = None;
        self.result = None;
    }

    /// Execute on the scenario connection and record a result.
    ///
    /// `meta_of` is the id of the entity a meta-query-set guards; when set,
    /// the meta strategy judges the query instead of the main one.
    pub fn run(&mut self, ctx: &ExecutionContext<'_>, meta_of: Option<&str>) {
        let is_meta = meta_of.is_some();
        if is_meta {
            ctx.monitors.meta_query_started(self);
        } else {
            ctx.monitors.query_started(self);
        }

        self.result = Some(self.execute(ctx, meta_of));

        if is_meta {
            ctx.monitors.meta_query_finished(self);
        } else {
            ctx.monitors.query_finished(self);
        }
    }

    fn execute(&mut self, ctx: &ExecutionContext<'_>, meta_of: Option<&str>) -> QueryResult {
        let started_at = Utc::now();
        let start = Instant::now();
        log::debug!("Running query {} - {}", self.suite_id, self.id);

        let outcome = ctx.conn.execute(&self.sql);
        let finish = |pass: bool, errors: Vec<String>, exception: Option<QueryError>| QueryResult {
            pass,
            errors,
            exception,
            started_at,
            duration: start.elapsed(),
        };

        let exception = match outcome {
            Ok(outcome) => {
                self.actual = Some(ActualResult::from_outcome(outcome));
                None
            }
            Err(DbError::DecodeError(message)) => {
                self.actual = None;
                return finish(
                    false,
                    Vec::new(),
                    Some(QueryError::Internal(format!(
                        "Unable to build result: {}",
                        message
                    ))),
                );
            }
            Err(err) => {
                let err = err.into_database_error();
                self.actual = Some(ActualResult::from_error(&err));
                if err.is_connection_failure() {
                    log::error!(
                        "Query {} - {}: server not available: {}",
                        self.suite_id,
                        self.id,
                        err
                    );
                    return finish(false, Vec::new(), Some(QueryError::ServerNotAvailable(err)));
                }
                if !ctx.connection_strategy.is_connection_valid(ctx.conn) {
                    log::error!(
                        "Query {} - {}: connection lost after error: {}",
                        self.suite_id,
                        self.id,
                        err
                    );
                    return finish(false, Vec::new(), Some(QueryError::DbNotAvailable(err)));
                }
                Some(QueryError::Database(err))
            }
        };

        let Some(actual) = self.actual.as_ref() else {
            return finish(false, Vec::new(), exception);
        };
        let strategy: &dyn ResultStrategy = match meta_of {
            Some(_) => ctx.meta_strategy,
            None => ctx.result_strategy,
        };
        let view = QueryView {
            suite_id: &self.suite_id,
            query_id: &self.id,
            sql: &self.sql,
            main_id: meta_of,
            actual,
            conn: ctx.conn,
        };
        match strategy.handle_result(&view) {
            Verdict::Pass => finish(true, Vec::new(), exception),
            Verdict::Fail(errors) => finish(false, errors, exception),
            Verdict::Error(message) => {
                finish(false, Vec::new(), Some(QueryError::Internal(message)))
            }
        }
    }

    /// Fail without executing because the guarding meta-query-set `kind`
    /// failed with `cause`.
    pub fn before_set_failed(&mut self, cause: &str, kind: &str, monitors: &ProgressMonitors) {
        monitors.query_started(self);
        let err = DatabaseError::new(GUARD_FAILURE_CLASS, format!("{} failed [{}]", kind, cause));
        self.actual = Some(ActualResult::from_error(&err));
        self.result = Some(QueryResult {
            pass: false,
            errors: Vec::new(),
            exception: Some(QueryError::Database(err)),
            started_at: Utc::now(),
            duration: Duration::ZERO,
        });
        monitors.query_finished(self);
    }

    pub fn to_report(&self) -> QueryReport {
        let status = match &self.result {
            None => QueryStatus::Skip,
            Some(r) if r.pass => QueryStatus::Pass,
            Some(_) => QueryStatus::Fail,
        };
        QueryReport {
            id: self.id.clone(),
            status,
            failures: self
                .result
                .as_ref()
                .map(|r| r.errors.clone())
                .unwrap_or_default(),
            error: self
                .result
                .as_ref()
                .filter(|r| !r.pass)
                .and_then(|r| r.exception.as_ref())
                .map(QueryError::describe),
            duration_ms: self
                .result
                .as_ref()
                .map(|r| r.duration.as_millis() as u64),
        }
    }
}

#[cfg(test)]
#[path = "query_test.rs"]
mod tests;
