//! Shared utilities for CLI commands

use anyhow::{bail, Context, Result};
use sp_core::Project;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) u8);

/// At least one query failed or a scenario stopped early
pub(crate) const EXIT_FAILURES: u8 = 2;
/// The run was interrupted with Ctrl-C
pub(crate) const EXIT_INTERRUPTED: u8 = 130;

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; nothing to show on stderr.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Load the project from `--project-dir`, honouring `--config`.
pub(crate) fn load_project(global: &GlobalArgs) -> Result<Project> {
    let project_path = Path::new(&global.project_dir);
    Project::load_with_config(project_path, global.config.as_deref().map(Path::new))
        .context("Failed to load project")
}

/// Parse `-D key=value` definitions into placeholder overrides.
pub(crate) fn parse_overrides(defines: &[String]) -> Result<BTreeMap<String, String>> {
    let mut overrides = BTreeMap::new();
    for define in defines {
        let Some((key, value)) = define.split_once('=') else {
            bail!("Invalid variable override '{}': expected KEY=VALUE", define);
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("Invalid variable override '{}': empty key", define);
        }
        overrides.insert(key.to_string(), value.to_string());
    }
    Ok(overrides)
}
