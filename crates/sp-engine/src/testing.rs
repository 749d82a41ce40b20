//! Scripted connections and a ready-made execution context for unit tests

use crate::actual::ActualResult;
use crate::cancel::CancellationToken;
use crate::context::ExecutionContext;
use crate::progress::ProgressMonitors;
use crate::strategy::{MetaQuerySetStrategy, QueryView, ResultStrategy, Verdict};
use sp_core::{ConnectionConfig, ScenarioConfig};
use sp_db::{
    ConnectionStrategy, DatabaseError, DbConnection, DbError, DbResult, DuckDbConnection,
    StatementOutcome,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

enum Scripted {
    Sql(DatabaseError),
    Decode,
}

/// In-memory DuckDB that raises scripted errors for chosen SQL texts
pub(crate) struct ScriptedConnection {
    inner: DuckDbConnection,
    failures: BTreeMap<String, Scripted>,
    log: Mutex<Vec<String>>,
}

impl ScriptedConnection {
    pub fn new() -> Self {
        Self {
            inner: DuckDbConnection::in_memory().unwrap(),
            failures: BTreeMap::new(),
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn fail(mut self, sql: &str, err: DatabaseError) -> Self {
        self.failures.insert(sql.to_string(), Scripted::Sql(err));
        self
    }

    pub fn fail_decode(mut self, sql: &str) -> Self {
        self.failures.insert(sql.to_string(), Scripted::Decode);
        self
    }

    /// SQL texts in execution order
    pub fn executed(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

impl DbConnection for ScriptedConnection {
    fn execute(&self, sql: &str) -> DbResult<StatementOutcome> {
        self.log.lock().unwrap().push(sql.to_string());
        match self.failures.get(sql) {
            Some(Scripted::Sql(e)) => Err(DbError::Sql(e.clone())),
            Some(Scripted::Decode) => Err(DbError::DecodeError("bad blob".into())),
            None => self.inner.execute(sql),
        }
    }
}

/// Connection strategy whose validity answer is switched by the test
#[derive(Clone, Default)]
pub(crate) struct SwitchableValidity {
    pub invalid: Arc<AtomicBool>,
}

impl ConnectionStrategy for SwitchableValidity {
    fn name(&self) -> &str {
        "scripted"
    }

    fn init(&mut self, _config: &ConnectionConfig) -> DbResult<()> {
        Ok(())
    }

    fn get_connection(&self) -> DbResult<Box<dyn DbConnection>> {
        Ok(Box::new(ScriptedConnection::new()))
    }

    fn is_connection_valid(&self, _conn: &dyn DbConnection) -> bool {
        !self.invalid.load(Ordering::SeqCst)
    }

    fn close_connection(&self, _conn: Box<dyn DbConnection>) {}
}

/// Fails any query whose outcome is an exception
pub(crate) struct ExceptionsFail;

impl ResultStrategy for ExceptionsFail {
    fn name(&self) -> &str {
        "EXCEPTIONS_FAIL"
    }

    fn reset_configuration(&mut self, _scenario: &ScenarioConfig) {}

    fn handle_result(&self, query: &QueryView<'_>) -> Verdict {
        match query.actual {
            ActualResult::Exception(e) => Verdict::Fail(vec![format!("unexpected {}", e.class)]),
            _ => Verdict::Pass,
        }
    }

    fn error_file(&self, _suite_id: &str, _query_id: &str) -> Option<PathBuf> {
        None
    }
}

pub(crate) fn scenario_config(root: &Path) -> ScenarioConfig {
    ScenarioConfig {
        id: "scenario".into(),
        connection: ConnectionConfig::default(),
        queryset_dir: "set".into(),
        expected_results_dir: "expected".into(),
        test_queries_dir: "queries".into(),
        ping_query: None,
        after_query: None,
        time_for_one_query: None,
        fast_fail: true,
        allowed_divergence: None,
        include_suites: vec![],
        exclude_suites: vec![],
        vars: BTreeMap::new(),
        artifacts_root: root.join("artifacts"),
        output_root: root.join("out"),
    }
}

/// Owns everything an `ExecutionContext` borrows
pub(crate) struct Harness {
    pub conn: ScriptedConnection,
    pub validity: SwitchableValidity,
    pub strategy: ExceptionsFail,
    pub meta: MetaQuerySetStrategy,
    pub monitors: ProgressMonitors,
    pub cancel: CancellationToken,
    pub dir: tempfile::TempDir,
}

impl Harness {
    pub fn new(conn: ScriptedConnection) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut meta = MetaQuerySetStrategy::new("EXCEPTIONS_FAIL");
        meta.reset_configuration(&scenario_config(dir.path()));
        Self {
            conn,
            validity: SwitchableValidity::default(),
            strategy: ExceptionsFail,
            meta,
            monitors: ProgressMonitors::new(),
            cancel: CancellationToken::new(),
            dir,
        }
    }

    pub fn ctx(&self) -> ExecutionContext<'_> {
        ExecutionContext {
            conn: &self.conn,
            connection_strategy: &self.validity,
            result_strategy: &self.strategy,
            meta_strategy: &self.meta,
            monitors: &self.monitors,
            cancel: &self.cancel,
        }
    }
}

/// A connection-level error (SQL state class 08)
pub(crate) fn connection_lost() -> DatabaseError {
    DatabaseError::new("IOException", "connection reset").with_sql_state("08006")
}

pub(crate) fn catalog_error(table: &str) -> DatabaseError {
    DatabaseError::new(
        "CatalogError",
        format!("Table with name {} does not exist!", table),
    )
}
