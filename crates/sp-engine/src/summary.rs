//! Plain-text run summaries
//!
//! Written next to `result.json` in the output root:
//!
//! * `Summary_totals.txt` and `Summary_errors.txt`, appended per scenario
//! * `Summary_<scenario>.txt` with the per-suite table
//! * `<scenario>/<suite>.txt` with the results of each executed query

use crate::error::{EngineError, EngineResult};
use crate::query::Query;
use crate::scenario::Scenario;
use crate::suite::Suite;
use chrono::{DateTime, Local, Utc};
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const TOTALS_FILE: &str = "Summary_totals.txt";
pub const ERRORS_FILE: &str = "Summary_errors.txt";

const NAME_WIDTH: usize = 50;
const COUNT_WIDTH: usize = 6;

pub struct SummaryWriter {
    output_root: PathBuf,
}

impl SummaryWriter {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
        }
    }

    /// Write every summary file for a finished scenario.
    pub fn write_scenario(&self, scenario: &Scenario) -> EngineResult<()> {
        self.append_totals(scenario)?;
        self.append_errors(scenario)?;
        write_file(
            &self
                .output_root
                .join(format!("Summary_{}.txt", scenario.id())),
            &scenario_summary(scenario),
            false,
        )?;
        let scenario_dir = self.output_root.join(scenario.id());
        for suite in scenario.suites() {
            write_file(
                &scenario_dir.join(format!("{}.txt", suite.id)),
                &suite_summary(suite),
                true,
            )?;
        }
        Ok(())
    }

    fn append_totals(&self, scenario: &Scenario) -> EngineResult<()> {
        let path = self.output_root.join(TOTALS_FILE);
        let mut out = String::new();
        if !path.exists() {
            let _ = writeln!(out, "==============");
            let _ = writeln!(out, "Summary totals");
            let _ = writeln!(out, "==============");
            let _ = writeln!(
                out,
                "{}{}{}{}{}",
                pad("Name", NAME_WIDTH),
                pad("Pass", COUNT_WIDTH),
                pad("Fail", COUNT_WIDTH),
                pad("Total", COUNT_WIDTH),
                pad("Skipped", COUNT_WIDTH)
            );
        }
        let counts = scenario.counts();
        let _ = writeln!(
            out,
            "{}{}{}{}{}",
            pad(scenario.id(), NAME_WIDTH),
            pad(&counts.pass.to_string(), COUNT_WIDTH),
            pad(&counts.fail.to_string(), COUNT_WIDTH),
            pad(&counts.all.to_string(), COUNT_WIDTH),
            pad(&counts.skip.to_string(), COUNT_WIDTH)
        );
        write_file(&path, &out, true)
    }

    fn append_errors(&self, scenario: &Scenario) -> EngineResult<()> {
        let path = self.output_root.join(ERRORS_FILE);
        let mut out = String::new();
        if !path.exists() {
            let _ = writeln!(out, "Summary errors");
        }
        let _ = writeln!(out, "----------------------");
        let _ = writeln!(out, "Failed queries [{}]", scenario.id());
        if let Some(error) = scenario.error() {
            let _ = writeln!(out, "    Scenario stopped - {}", error);
        }
        for query in scenario.failed_queries() {
            let _ = writeln!(out, "    {}", failure_line(query));
        }
        write_file(&path, &out, true)
    }
}

fn scenario_summary(scenario: &Scenario) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Scenario - {}", scenario.id());
    write_times(&mut out, scenario.started_at(), scenario.finished_at());
    let _ = writeln!(out, "Number of all suites: {}", scenario.suites().len());
    if let Some(error) = scenario.error() {
        let _ = writeln!(out, "Stopped: {}", error);
    }
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{}{}{}{}",
        pad("Name", NAME_WIDTH),
        pad("Pass", COUNT_WIDTH),
        pad("Fail", COUNT_WIDTH),
        pad("Total", COUNT_WIDTH)
    );
    for suite in scenario.suites() {
        let counts = suite.counts();
        let _ = writeln!(
            out,
            "{}{}{}{}",
            pad(&suite.id, NAME_WIDTH),
            pad(&counts.pass.to_string(), COUNT_WIDTH),
            pad(&counts.fail.to_string(), COUNT_WIDTH),
            pad(&counts.all.to_string(), COUNT_WIDTH)
        );
    }
    let totals = scenario.counts();
    let _ = writeln!(
        out,
        "{}{}{}{}",
        pad("Totals", NAME_WIDTH),
        pad(&totals.pass.to_string(), COUNT_WIDTH),
        pad(&totals.fail.to_string(), COUNT_WIDTH),
        pad(&totals.all.to_string(), COUNT_WIDTH)
    );

    let _ = writeln!(out);
    let _ = writeln!(out, "Failed queries:");
    for query in scenario.failed_queries() {
        let _ = writeln!(out, "    {}", failure_line(query));
    }
    out
}

fn suite_summary(suite: &Suite) -> String {
    let counts = suite.counts();
    let mut out = String::new();
    let _ = writeln!(out, "Suite - {}", suite.id);
    let _ = writeln!(out, "============================");
    write_times(&mut out, suite.started_at(), suite.finished_at());
    let _ = writeln!(out, "Number of all queries: {}", counts.all);
    let _ = writeln!(out, "Number of skipped queries: {}", counts.skip);
    let _ = writeln!(out, "Number of executed queries: {}", counts.executed);
    let _ = writeln!(out, "Number of passed queries: {}", counts.pass);
    let _ = writeln!(out, "Number of failed queries: {}", counts.fail);
    let _ = writeln!(out);
    for query in suite.executed_queries() {
        let Some(result) = query.result() else {
            continue;
        };
        let _ = writeln!(
            out,
            "{}_{} - {} [{}]",
            query.suite_id,
            query.id,
            if result.pass { "PASS" } else { "FAIL" },
            format_duration(result.duration)
        );
        for error in &result.errors {
            let _ = writeln!(out, "    {}", error);
        }
        if !result.pass {
            if let Some(exception) = &result.exception {
                let _ = writeln!(out, "    {}", exception.describe());
            }
        }
    }
    let _ = writeln!(out);
    out
}

fn write_times(out: &mut String, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) {
    let stamp = |t: Option<DateTime<Utc>>| {
        t.map(|t| {
            t.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|| "-".to_string())
    };
    let _ = writeln!(out, "Start: {}", stamp(start));
    let _ = writeln!(out, "End: {}", stamp(end));
    let elapsed = match (start, end) {
        (Some(s), Some(e)) => (e - s).to_std().unwrap_or_default(),
        _ => Duration::ZERO,
    };
    let _ = writeln!(out, "Elapsed: {}", format_duration(elapsed));
}

/// `<suite>_<query> - <first failure>`
fn failure_line(query: &Query) -> String {
    let detail = query
        .result()
        .and_then(|r| r.first_failure())
        .unwrap_or_default();
    format!("{}_{} - {}", query.suite_id, query.id, detail)
}

/// `HH:MM:SS.mmm`
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        millis / 3_600_000,
        millis / 60_000 % 60,
        millis / 1_000 % 60,
        millis % 1_000
    )
}

fn pad(text: &str, width: usize) -> String {
    format!("{:<width$}", text, width = width)
}

fn write_file(path: &Path, content: &str, append: bool) -> EngineResult<()> {
    let write = || -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)?;
        file.write_all(content.as_bytes())
    };
    write().map_err(|e| EngineError::WriteFailed {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
