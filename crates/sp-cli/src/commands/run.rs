//! Run command implementation

use anyhow::{Context, Result};
use sp_core::RunReport;
use sp_engine::{Runner, REPORT_FILE};
use std::sync::Arc;

use crate::cli::{GlobalArgs, OutputFormat, RunArgs};
use crate::commands::common::{
    load_project, parse_overrides, ExitCode, EXIT_FAILURES, EXIT_INTERRUPTED,
};
use crate::commands::progress::ProgressReporter;

/// Execute the run command
pub async fn execute(args: &RunArgs, global: &GlobalArgs) -> Result<()> {
    let mut project = load_project(global)?;
    if let Some(dir) = &args.output_dir {
        project.config.output_dir = dir.clone();
    }
    project
        .retain_scenarios(&args.scenarios)
        .context("Invalid --scenario pattern")?;
    let overrides = parse_overrides(&args.define)?;
    let output_root = project.output_root();
    let show_progress = !args.quiet && args.output == OutputFormat::Text;

    if project.scenarios.is_empty() {
        log::warn!("No scenarios selected");
    }

    let mut runner = Runner::new(project)
        .with_result_mode(args.result_mode.clone())
        .with_overrides(overrides);
    if show_progress {
        runner = runner.with_monitor(Arc::new(ProgressReporter::new()));
    }
    log::debug!("Result mode: {}", runner.result_mode());

    let handle = runner.spawn().context("Failed to start run")?;
    let cancel = handle.cancellation_token();
    let signal = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupted, stopping after the current query...");
            cancel.cancel();
        }
    });

    let report = tokio::task::spawn_blocking(move || handle.join())
        .await
        .context("Run task failed")?
        .context("Run failed")?;
    signal.abort();

    match args.output {
        OutputFormat::Text => {
            if !args.quiet {
                print_summary(&report);
                println!("Report: {}", output_root.join(REPORT_FILE).display());
            }
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("Failed to serialize report")?
            );
        }
    }

    if report.interrupted {
        return Err(ExitCode(EXIT_INTERRUPTED).into());
    }
    if report.counts.has_failures() || report.scenarios.iter().any(|s| s.error.is_some()) {
        return Err(ExitCode(EXIT_FAILURES).into());
    }
    Ok(())
}

fn print_summary(report: &RunReport) {
    println!();
    for scenario in &report.scenarios {
        match &scenario.error {
            Some(error) => println!("  ✗ {} - {}", scenario.id, error),
            None => println!(
                "  {} {} ({}/{} passed)",
                if scenario.counts.has_failures() {
                    "✗"
                } else {
                    "✓"
                },
                scenario.id,
                scenario.counts.pass,
                scenario.counts.all
            ),
        }
    }
    println!();
    println!(
        "Passed: {}, Failed: {}, Skipped: {}",
        report.counts.pass, report.counts.fail, report.counts.skip
    );
    if report.interrupted {
        println!("Run interrupted.");
    }
}
