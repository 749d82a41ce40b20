//! Project discovery: configuration, scenario files and suite files

use crate::config::{Config, ScenarioConfig, ScenarioSettings};
use crate::error::{CoreError, CoreResult};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A scenario definition file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioFile {
    /// File stem, used as the scenario id
    pub id: String,
    pub path: PathBuf,
}

/// A suite definition file found for a scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteLocation {
    /// File stem, used as the suite id
    pub id: String,
    pub path: PathBuf,
}

/// A loaded sqlproof project
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub config: Config,
    /// Selected scenarios, sorted by id
    pub scenarios: Vec<ScenarioFile>,
}

/// Compile `pattern` so that it must match the whole input.
pub fn full_match_regex(pattern: &str) -> CoreResult<Regex> {
    Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| CoreError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

fn compile_all(patterns: &[String]) -> CoreResult<Vec<Regex>> {
    patterns.iter().map(|p| full_match_regex(p)).collect()
}

/// Empty `include` selects everything; `exclude` always wins.
pub fn is_selected(name: &str, include: &[Regex], exclude: &[Regex]) -> bool {
    (include.is_empty() || include.iter().any(|r| r.is_match(name)))
        && !exclude.iter().any(|r| r.is_match(name))
}

/// YAML files directly inside `dir`, as `(stem, path)` sorted by stem.
fn yaml_files(dir: &Path) -> CoreResult<Vec<(String, PathBuf)>> {
    let mut found = Vec::new();
    for ext in ["yml", "yaml"] {
        let pattern = format!("{}/*.{}", dir.display(), ext);
        let entries = glob::glob(&pattern).map_err(|e| CoreError::InvalidPattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        for entry in entries {
            match entry {
                Ok(path) => {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        found.push((stem.to_string(), path.clone()));
                    }
                }
                Err(e) => log::warn!("Skipping unreadable entry in {}: {}", dir.display(), e),
            }
        }
    }
    found.sort();
    found.dedup_by(|a, b| a.0 == b.0);
    Ok(found)
}

impl Project {
    /// Load the project rooted at `root`, using sqlproof.yml from that directory.
    pub fn load(root: &Path) -> CoreResult<Self> {
        Self::load_with_config(root, None)
    }

    /// Load the project, optionally reading configuration from an explicit file.
    pub fn load_with_config(root: &Path, config_path: Option<&Path>) -> CoreResult<Self> {
        if !root.is_dir() {
            return Err(CoreError::ProjectNotFound {
                path: root.display().to_string(),
            });
        }
        let config = match config_path {
            Some(path) => Config::load(path)?,
            None => Config::load_from_dir(root)?,
        };
        let scenarios = discover_scenarios(&config, root)?;
        Ok(Self {
            root: root.to_path_buf(),
            config,
            scenarios,
        })
    }

    /// Keep only scenarios whose id fully matches one of `patterns`.
    pub fn retain_scenarios(&mut self, patterns: &[String]) -> CoreResult<()> {
        if patterns.is_empty() {
            return Ok(());
        }
        let include = compile_all(patterns)?;
        self.scenarios
            .retain(|s| is_selected(&s.id, &include, &[]));
        Ok(())
    }

    /// Resolve a scenario file against the project defaults.
    pub fn scenario_config(
        &self,
        scenario: &ScenarioFile,
        overrides: &BTreeMap<String, String>,
    ) -> CoreResult<ScenarioConfig> {
        let settings = ScenarioSettings::load(&scenario.path)?;
        self.config
            .defaults
            .clone()
            .merge(&settings)
            .resolve(&scenario.id, &self.config, &self.root, overrides)
    }

    /// Root directory for all run output
    pub fn output_root(&self) -> PathBuf {
        self.config.output_path(&self.root)
    }
}

/// Scenario files in the scenarios directory, filtered and sorted by id.
pub fn discover_scenarios(config: &Config, root: &Path) -> CoreResult<Vec<ScenarioFile>> {
    let dir = config.scenarios_path(root);
    if !dir.is_dir() {
        log::warn!("Scenario directory {} does not exist", dir.display());
        return Ok(Vec::new());
    }
    let include = compile_all(&config.include_scenarios)?;
    let exclude = compile_all(&config.exclude_scenarios)?;
    Ok(yaml_files(&dir)?
        .into_iter()
        .filter(|(id, _)| is_selected(id, &include, &exclude))
        .map(|(id, path)| ScenarioFile { id, path })
        .collect())
}

/// Suite files of a scenario, filtered by its include/exclude lists and sorted by id.
pub fn discover_suites(scenario: &ScenarioConfig) -> CoreResult<Vec<SuiteLocation>> {
    let dir = scenario.test_queries_path();
    if !dir.is_dir() {
        log::warn!(
            "Scenario '{}': suite directory {} does not exist",
            scenario.id,
            dir.display()
        );
        return Ok(Vec::new());
    }
    let include = compile_all(&scenario.include_suites)?;
    let exclude = compile_all(&scenario.exclude_suites)?;
    Ok(yaml_files(&dir)?
        .into_iter()
        .filter(|(id, _)| is_selected(id, &include, &exclude))
        .map(|(id, path)| SuiteLocation { id, path })
        .collect())
}

#[cfg(test)]
#[path = "project_test.rs"]
mod tests;
