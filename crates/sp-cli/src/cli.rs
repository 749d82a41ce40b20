//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// sqlproof - regression tests for SQL query results
#[derive(Parser, Debug)]
#[command(name = "sqlproof")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run scenarios and judge every query result
    Run(RunArgs),

    /// List scenarios, suites and query counts
    Ls(LsArgs),
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Result strategy: compare, generate or none (default: project result_mode)
    #[arg(short, long, env = "SQLPROOF_RESULT_MODE")]
    pub result_mode: Option<String>,

    /// Scenarios to run, as full-match regexes (repeatable, default: all)
    #[arg(short, long = "scenario")]
    pub scenarios: Vec<String>,

    /// Override the output directory
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Override a placeholder variable (key=value, repeatable)
    #[arg(short = 'D', value_name = "KEY=VALUE")]
    pub define: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Suppress the progress bar and per-scenario lines
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the ls command
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: LsOutput,

    /// Scenarios to list, as full-match regexes (repeatable, default: all)
    #[arg(short, long = "scenario")]
    pub scenarios: Vec<String>,
}

/// Run output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable summary
    Text,
    /// The run report as JSON
    Json,
}

/// List output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LsOutput {
    /// Table format
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
