//! List command implementation

use anyhow::{Context, Result};
use sp_core::{discover_suites, Project};
use sp_engine::load_suite;
use std::collections::BTreeMap;

use crate::cli::{GlobalArgs, LsArgs, LsOutput};
use crate::commands::common::load_project;

/// Execute the ls command
pub async fn execute(args: &LsArgs, global: &GlobalArgs) -> Result<()> {
    let mut project = load_project(global)?;
    project
        .retain_scenarios(&args.scenarios)
        .context("Invalid --scenario pattern")?;

    let rows = collect_rows(&project)?;
    match args.output {
        LsOutput::Table => print_table(&rows),
        LsOutput::Json => println!(
            "{}",
            serde_json::to_string_pretty(&rows).context("Failed to serialize listing")?
        ),
    }
    Ok(())
}

/// One suite of one scenario
#[derive(Debug, serde::Serialize)]
struct SuiteInfo {
    scenario: String,
    suite: String,
    query_sets: usize,
    queries: usize,
}

fn collect_rows(project: &Project) -> Result<Vec<SuiteInfo>> {
    let mut rows = Vec::new();
    for file in &project.scenarios {
        let config = project
            .scenario_config(file, &BTreeMap::new())
            .with_context(|| format!("Failed to resolve scenario: {}", file.id))?;
        for location in discover_suites(&config)? {
            let suite = load_suite(&location, config.fast_fail)
                .with_context(|| format!("Failed to load suite: {}", location.id))?;
            rows.push(SuiteInfo {
                scenario: config.id.clone(),
                suite: suite.id.clone(),
                query_sets: suite.query_sets().len(),
                queries: suite.number_of_queries(),
            });
        }
    }
    Ok(rows)
}

fn print_table(rows: &[SuiteInfo]) {
    let scenario_width = rows
        .iter()
        .map(|r| r.scenario.len())
        .max()
        .unwrap_or(8)
        .max(8);
    let suite_width = rows
        .iter()
        .map(|r| r.suite.len())
        .max()
        .unwrap_or(5)
        .max(5);

    println!(
        "{:<sw$}  {:<uw$}  {:>4}  {:>7}",
        "SCENARIO",
        "SUITE",
        "SETS",
        "QUERIES",
        sw = scenario_width,
        uw = suite_width
    );
    println!("{}", "-".repeat(scenario_width + suite_width + 17));
    for row in rows {
        println!(
            "{:<sw$}  {:<uw$}  {:>4}  {:>7}",
            row.scenario,
            row.suite,
            row.query_sets,
            row.queries,
            sw = scenario_width,
            uw = suite_width
        );
    }
    println!();
    println!(
        "{} suites, {} queries",
        rows.len(),
        rows.iter().map(|r| r.queries).sum::<usize>()
    );
}
