//! Scenario lifecycle: one connection, suites run in id order

use crate::actual::ActualException;
use crate::cancel::CancellationToken;
use crate::context::ExecutionContext;
use crate::error::{EngineError, EngineResult, ExecutionError, ExecutionResult};
use crate::progress::ProgressMonitors;
use crate::query::Query;
use crate::strategy::{MetaQuerySetStrategy, ResultStrategy};
use crate::suite::Suite;
use chrono::{DateTime, Local, Utc};
use sp_core::{Counts, ScenarioConfig, ScenarioReport};
use sp_db::{ConnectionStrategy, DatabaseError, DbConnection};
use std::fs::OpenOptions;
use std::io::Write;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::time::Instant;

/// Appended to in the output root when a scenario cannot connect
pub const SETUP_FAIL_FILE: &str = "Summary_scenario_setup_fail.txt";
/// Appended to in the output root when the teardown query fails
pub const TEARDOWN_FAIL_FILE: &str = "Summary_scenario_teardown_fail.txt";

pub struct Scenario {
    config: ScenarioConfig,
    /// Sorted by id
    suites: Vec<Suite>,
    connection_strategy: Box<dyn ConnectionStrategy>,
    meta_strategy: MetaQuerySetStrategy,
    /// Open between a successful `before` and `after`
    connection: Option<Box<dyn DbConnection>>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    error: Option<String>,
}

impl Scenario {
    pub fn new(
        config: ScenarioConfig,
        mut suites: Vec<Suite>,
        connection_strategy: Box<dyn ConnectionStrategy>,
    ) -> Self {
        suites.sort();
        Self {
            config,
            suites,
            connection_strategy,
            meta_strategy: MetaQuerySetStrategy::new(""),
            connection: None,
            started_at: None,
            finished_at: None,
            error: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    pub fn suites(&self) -> &[Suite] {
        &self.suites
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Why the scenario stopped early, if it did
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn counts(&self) -> Counts {
        let mut counts = Counts::default();
        for suite in &self.suites {
            counts.add(&suite.counts());
        }
        counts
    }

    pub fn number_of_queries(&self) -> usize {
        self.suites.iter().map(Suite::number_of_queries).sum()
    }

    pub fn failed_queries(&self) -> impl Iterator<Item = &Query> {
        self.suites.iter().flat_map(Suite::failed_queries)
    }

    /// Acquire and ping the connection.
    ///
    /// On failure the cause is appended to the setup-fail summary and no
    /// connection is kept.
    pub fn before(&mut self) -> EngineResult<()> {
        self.error = None;
        if let Err(message) = self.connect() {
            log::error!("Scenario {} setup failed: {}", self.config.id, message);
            self.append_failure(SETUP_FAIL_FILE, &message);
            if let Some(conn) = self.connection.take() {
                self.connection_strategy.close_connection(conn);
            }
            self.error = Some(message.clone());
            return Err(EngineError::ScenarioSetup {
                scenario: self.config.id.clone(),
                message,
            });
        }
        Ok(())
    }

    fn connect(&mut self) -> Result<(), String> {
        self.connection_strategy
            .init(&self.config.connection)
            .map_err(|e| e.to_string())?;
        let conn = self
            .connection_strategy
            .get_connection()
            .map_err(|e| e.to_string())?;
        let conn = self.connection.insert(conn);
        match &self.config.ping_query {
            Some(ping) => {
                conn.execute(ping).map_err(|e| {
                    format!(
                        "Ping query failed\n{}",
                        ActualException::from_database_error(&e.into_database_error())
                            .stack_trace
                    )
                })?;
            }
            None => log::info!("Scenario {}: no ping query configured", self.config.id),
        }
        Ok(())
    }

    /// Run every suite on the open connection.
    ///
    /// The first propagating failure stops the scenario and is returned
    /// after being recorded as the scenario error.
    pub fn run(
        &mut self,
        result_strategy: &dyn ResultStrategy,
        monitors: &ProgressMonitors,
        cancel: &CancellationToken,
    ) -> ExecutionResult<()> {
        self.started_at = Some(Utc::now());
        self.finished_at = None;
        self.meta_strategy = MetaQuerySetStrategy::new(result_strategy.name());
        self.meta_strategy.reset_configuration(&self.config);

        let result = self.run_suites(result_strategy, monitors, cancel);

        self.finished_at = Some(Utc::now());
        if let Err(e) = &result {
            log::error!("Scenario {} stopped: {}", self.config.id, e);
            self.error = Some(e.to_string());
        }
        result
    }

    fn run_suites(
        &mut self,
        result_strategy: &dyn ResultStrategy,
        monitors: &ProgressMonitors,
        cancel: &CancellationToken,
    ) -> ExecutionResult<()> {
        let total = self.number_of_queries();
        let Scenario {
            config,
            suites,
            connection_strategy,
            meta_strategy,
            connection,
            ..
        } = self;

        let conn = connection.as_deref().ok_or_else(|| {
            ExecutionError::ServerNotAvailable(
                DatabaseError::new("ConnectionError", "scenario is not connected")
                    .with_sql_state("08003"),
            )
        })?;
        let ctx = ExecutionContext {
            conn,
            connection_strategy: &**connection_strategy,
            result_strategy,
            meta_strategy,
            monitors,
            cancel,
        };

        let deadline = config.time_for_one_query.and_then(|per_query| {
            let budget = per_query.saturating_mul(u32::try_from(total).unwrap_or(u32::MAX));
            Instant::now().checked_add(budget)
        });

        for suite in suites.iter_mut() {
            suite.run(&ctx, deadline)?;
        }
        Ok(())
    }

    /// Run the teardown query and release the connection.
    pub fn after(&mut self) {
        let Some(conn) = self.connection.take() else {
            return;
        };
        if let Some(sql) = &self.config.after_query {
            if let Err(e) = conn.execute(sql) {
                let err = e.into_database_error();
                log::error!("Scenario {} teardown failed: {}", self.config.id, err);
                let trace = ActualException::from_database_error(&err).stack_trace;
                self.append_failure(TEARDOWN_FAIL_FILE, &format!("After query failed\n{}", trace));
            }
        }
        self.connection_strategy.close_connection(conn);
    }

    /// Connect and return a guard that runs `after` when dropped.
    pub fn open(&mut self) -> EngineResult<ScenarioSession<'_>> {
        self.before()?;
        Ok(ScenarioSession { scenario: self })
    }

    fn failure_file(&self, name: &str) -> PathBuf {
        self.config.output_root.join(name)
    }

    fn append_failure(&self, name: &str, text: &str) {
        let path = self.failure_file(name);
        let entry = format!(
            "------------------------------\n{} - {}\n{}\n",
            self.config.id,
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            text
        );
        let written = std::fs::create_dir_all(&self.config.output_root).and_then(|_| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)?
                .write_all(entry.as_bytes())
        });
        if let Err(e) = written {
            log::warn!("Cannot write {}: {}", path.display(), e);
        }
    }

    pub fn to_report(&self) -> ScenarioReport {
        ScenarioReport {
            id: self.config.id.clone(),
            counts: self.counts(),
            error: self.error.clone(),
            suites: self.suites.iter().map(Suite::to_report).collect(),
        }
    }
}

/// An open scenario; the connection is released when this is dropped
pub struct ScenarioSession<'a> {
    scenario: &'a mut Scenario,
}

impl Deref for ScenarioSession<'_> {
    type Target = Scenario;

    fn deref(&self) -> &Scenario {
        self.scenario
    }
}

impl DerefMut for ScenarioSession<'_> {
    fn deref_mut(&mut self) -> &mut Scenario {
        self.scenario
    }
}

impl Drop for ScenarioSession<'_> {
    fn drop(&mut self) {
        self.scenario.after();
    }
}

#[cfg(test)]
#[path = "scenario_test.rs"]
mod tests;
