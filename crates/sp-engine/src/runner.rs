//! Top-level driver: every selected scenario of a project, one after another

use crate::cancel::CancellationToken;
use crate::error::{EngineError, EngineResult, ExecutionError};
use crate::loader::load_scenario;
use crate::progress::{ProgressMonitor, ProgressMonitors, RunStatus, StatusMonitor};
use crate::scenario::Scenario;
use crate::strategy::{ResultStrategy, ResultStrategyRegistry};
use crate::summary::SummaryWriter;
use sp_core::{Counts, Project, RunReport, ScenarioReport};
use sp_db::ConnectionRegistry;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread::JoinHandle;

/// Name of the JSON report written to the output root
pub const REPORT_FILE: &str = "result.json";

/// Error recorded for scenarios skipped by an interrupted run
pub const NOT_RUN: &str = "Not run: execution interrupted";

pub struct Runner {
    project: Project,
    connections: ConnectionRegistry,
    strategies: ResultStrategyRegistry,
    /// Overrides the project's `result_mode`
    result_mode: Option<String>,
    /// `-D key=value` variables, applied over scenario vars
    overrides: BTreeMap<String, String>,
    monitors: ProgressMonitors,
    cancel: CancellationToken,
}

impl Runner {
    pub fn new(project: Project) -> Self {
        Self {
            project,
            connections: ConnectionRegistry::with_defaults(),
            strategies: ResultStrategyRegistry::with_defaults(),
            result_mode: None,
            overrides: BTreeMap::new(),
            monitors: ProgressMonitors::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_result_mode(mut self, mode: Option<String>) -> Self {
        self.result_mode = mode;
        self
    }

    pub fn with_overrides(mut self, overrides: BTreeMap<String, String>) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_monitor(mut self, monitor: Arc<dyn ProgressMonitor>) -> Self {
        self.monitors.add(monitor);
        self
    }

    pub fn with_connections(mut self, connections: ConnectionRegistry) -> Self {
        self.connections = connections;
        self
    }

    pub fn with_strategies(mut self, strategies: ResultStrategyRegistry) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Strategy name for this run: explicit mode, then project, then `NONE`
    pub fn result_mode(&self) -> &str {
        self.result_mode
            .as_deref()
            .or(self.project.config.result_mode.as_deref())
            .unwrap_or("NONE")
    }

    /// Run every scenario and write `result.json` (and the text summaries
    /// when enabled) to the output root.
    ///
    /// A scenario that fails to load, connect or finish is recorded in the
    /// report; the run moves on to the next one.
    pub fn run(&self) -> EngineResult<RunReport> {
        let output_root = self.project.output_root();
        let mut report = RunReport::new();
        let mut strategy = self.strategies.create(self.result_mode());
        let summaries = self
            .project
            .config
            .write_summaries
            .then(|| SummaryWriter::new(output_root.clone()));

        log::info!(
            "Run {}: {} scenarios, result mode {}",
            report.run_id,
            self.project.scenarios.len(),
            strategy.name()
        );
        self.monitors.run_started();

        let mut pending = self.project.scenarios.iter();
        for file in pending.by_ref() {
            if self.cancel.is_cancelled() {
                report.interrupted = true;
                report.push_scenario(not_run(&file.id));
                break;
            }
            let mut scenario = match self
                .project
                .scenario_config(file, &self.overrides)
                .map_err(EngineError::from)
                .and_then(|config| load_scenario(config, &self.connections))
            {
                Ok(scenario) => scenario,
                Err(e) => {
                    log::error!("Scenario {} could not be loaded: {}", file.id, e);
                    report.push_scenario(scenario_error(&file.id, e.to_string()));
                    continue;
                }
            };

            strategy.reset_configuration(scenario.config());
            let outcome = self.run_scenario(&mut scenario, strategy.as_ref());
            if matches!(outcome, Some(ExecutionError::Interrupted)) {
                report.interrupted = true;
            }

            if let Some(writer) = &summaries {
                if let Err(e) = writer.write_scenario(&scenario) {
                    log::warn!("{}", e);
                }
            }
            report.push_scenario(scenario.to_report());
            if report.interrupted {
                break;
            }
        }
        for file in pending {
            report.push_scenario(not_run(&file.id));
        }

        strategy.destroy();
        self.monitors.run_finished();
        report.finish();
        report.save(&output_root.join(REPORT_FILE))?;
        Ok(report)
    }

    /// Connect, run and disconnect one scenario; returns what stopped it early.
    fn run_scenario(
        &self,
        scenario: &mut Scenario,
        strategy: &dyn ResultStrategy,
    ) -> Option<ExecutionError> {
        self.monitors.scenario_started(scenario);
        let outcome = match scenario.open() {
            Ok(mut session) => session.run(strategy, &self.monitors, &self.cancel).err(),
            Err(e) => {
                log::error!("{}", e);
                None
            }
        };
        self.monitors.scenario_finished(scenario);
        outcome
    }

    /// Run on a dedicated thread.
    pub fn spawn(mut self) -> std::io::Result<RunHandle> {
        let status = StatusMonitor::new();
        self.monitors.add(Arc::new(status.clone()));
        let cancel = self.cancel.clone();
        let join = std::thread::Builder::new()
            .name("sqlproof-run".to_string())
            .spawn(move || self.run())?;
        Ok(RunHandle {
            cancel,
            status,
            join,
        })
    }
}

fn scenario_error(id: &str, error: String) -> ScenarioReport {
    ScenarioReport {
        id: id.to_string(),
        counts: Counts::default(),
        error: Some(error),
        suites: Vec::new(),
    }
}

/// Report entry for a scenario the interrupted run never reached
fn not_run(id: &str) -> ScenarioReport {
    scenario_error(id, NOT_RUN.to_string())
}

/// A run executing on its own thread
pub struct RunHandle {
    cancel: CancellationToken,
    status: StatusMonitor,
    join: JoinHandle<EngineResult<RunReport>>,
}

impl RunHandle {
    /// Ask the run to stop after the query currently executing
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn status(&self) -> RunStatus {
        self.status.snapshot()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    pub fn join(self) -> EngineResult<RunReport> {
        self.join.join().map_err(|_| EngineError::WorkerPanicked)?
    }
}
