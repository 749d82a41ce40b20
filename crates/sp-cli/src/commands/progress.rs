//! Terminal progress bar fed by the engine's progress hooks

use indicatif::{ProgressBar, ProgressStyle};
use sp_engine::{ProgressMonitor, Query, Scenario, Suite};
use std::sync::atomic::{AtomicU64, Ordering};

pub(crate) struct ProgressReporter {
    bar: ProgressBar,
    /// Main queries of every finished scenario, executed or not
    settled: AtomicU64,
}

impl ProgressReporter {
    pub(crate) fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Self {
            bar,
            settled: AtomicU64::new(0),
        }
    }
}

impl ProgressMonitor for ProgressReporter {
    fn scenario_started(&self, scenario: &Scenario) {
        self.bar.inc_length(scenario.number_of_queries() as u64);
        self.bar.set_message(scenario.id().to_string());
    }

    fn scenario_finished(&self, scenario: &Scenario) {
        // skipped queries never report, so settle the whole scenario at once
        let settled = self
            .settled
            .fetch_add(scenario.number_of_queries() as u64, Ordering::SeqCst)
            + scenario.number_of_queries() as u64;
        self.bar.set_position(settled);
        let counts = scenario.counts();
        let mark = if counts.has_failures() || scenario.error().is_some() {
            "✗"
        } else {
            "✓"
        };
        self.bar.println(format!(
            "{} {} (pass {}, fail {}, skip {})",
            mark,
            scenario.id(),
            counts.pass,
            counts.fail,
            counts.skip
        ));
        if let Some(error) = scenario.error() {
            self.bar.println(format!("    stopped: {}", error));
        }
    }

    fn suite_started(&self, suite: &Suite) {
        self.bar.set_message(suite.id.clone());
    }

    fn query_finished(&self, query: &Query) {
        self.bar.inc(1);
        if query.is_failed() {
            self.bar
                .println(format!("    ✗ {}_{}", query.suite_id, query.id));
        }
    }

    fn run_finished(&self) {
        self.bar.finish_and_clear();
    }
}
