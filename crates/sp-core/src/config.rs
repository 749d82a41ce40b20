//! Configuration types and parsing for sqlproof.yml and scenario files

use crate::error::{CoreError, CoreResult};
use crate::placeholder;
use crate::serde_helpers::default_true;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Project configuration file names, in lookup order
pub const CONFIG_FILE_NAMES: [&str; 2] = ["sqlproof.yml", "sqlproof.yaml"];

/// Main project configuration from sqlproof.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Project name
    pub name: String,

    /// Directory holding query-set directories (suites and fixtures)
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: String,

    /// Directory holding one `<id>.yml` file per scenario
    #[serde(default = "default_scenarios_dir")]
    pub scenarios_dir: String,

    /// Root directory for reports, error artifacts and generated fixtures
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Result strategy name (compare, generate, none)
    #[serde(default)]
    pub result_mode: Option<String>,

    /// Maximum numeric difference still considered equal
    #[serde(default)]
    pub allowed_divergence: Option<String>,

    /// Scenario file stems to run (regex, full match). Empty means all.
    #[serde(default)]
    pub include_scenarios: Vec<String>,

    /// Scenario file stems to skip (regex, full match)
    #[serde(default)]
    pub exclude_scenarios: Vec<String>,

    /// Write plain-text summary files next to result.json
    #[serde(default = "default_true")]
    pub write_summaries: bool,

    /// Variables available to `${..}` placeholders in every scenario
    #[serde(default)]
    pub vars: BTreeMap<String, serde_yaml::Value>,

    /// Settings every scenario starts from
    #[serde(default)]
    pub defaults: ScenarioSettings,
}

/// Per-scenario settings; every field is optional and overlays the project defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioSettings {
    /// Connection strategy and its parameters
    #[serde(default)]
    pub connection: Option<ConnectionSettings>,

    /// Query-set directory under the artifacts directory
    #[serde(default)]
    pub queryset_dir: Option<String>,

    /// Fixture directory under the query-set directory
    #[serde(default)]
    pub expected_results_dir: Option<String>,

    /// Suite directory under the query-set directory
    #[serde(default)]
    pub test_queries_dir: Option<String>,

    /// SQL executed right after connecting; failure skips the scenario
    #[serde(default)]
    pub ping_query: Option<String>,

    /// SQL executed before the connection is closed
    #[serde(default)]
    pub after_query: Option<String>,

    /// Time budget per query; the scenario deadline is this times the query count
    #[serde(default)]
    pub time_for_one_query_ms: Option<u64>,

    /// Stop a query-set at its first failing query
    #[serde(default)]
    pub fast_fail: Option<bool>,

    /// Numeric tolerance override for this scenario
    #[serde(default)]
    pub allowed_divergence: Option<String>,

    /// Suite file stems to run (regex, full match)
    #[serde(default)]
    pub include_suites: Option<Vec<String>>,

    /// Suite file stems to skip (regex, full match)
    #[serde(default)]
    pub exclude_suites: Option<Vec<String>>,

    /// Scenario-local placeholder variables
    #[serde(default)]
    pub vars: BTreeMap<String, serde_yaml::Value>,
}

/// Connection settings as written in YAML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionSettings {
    /// Connection strategy name (case-insensitive)
    #[serde(default)]
    pub strategy: Option<String>,

    /// Database location understood by the strategy
    #[serde(default)]
    pub path: Option<String>,

    /// SQL used to check whether a connection is still usable
    #[serde(default)]
    pub valid_connection_sql: Option<String>,

    /// Free-form strategy properties
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

/// Fully resolved connection configuration handed to a connection strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub strategy: String,
    pub path: String,
    pub valid_connection_sql: Option<String>,
    pub properties: BTreeMap<String, String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            path: default_db_path(),
            valid_connection_sql: None,
            properties: BTreeMap::new(),
        }
    }
}

/// Fully resolved scenario configuration
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    /// Scenario id (the scenario file stem)
    pub id: String,
    pub connection: ConnectionConfig,
    pub queryset_dir: String,
    pub expected_results_dir: String,
    pub test_queries_dir: String,
    pub ping_query: Option<String>,
    pub after_query: Option<String>,
    pub time_for_one_query: Option<Duration>,
    pub fast_fail: bool,
    pub allowed_divergence: Option<String>,
    pub include_suites: Vec<String>,
    pub exclude_suites: Vec<String>,
    /// Resolved placeholder variables
    pub vars: BTreeMap<String, String>,
    /// Absolute artifacts directory
    pub artifacts_root: PathBuf,
    /// Absolute output root shared by all scenarios
    pub output_root: PathBuf,
}

impl ScenarioConfig {
    /// Directory containing this scenario's query-set
    pub fn queryset_path(&self) -> PathBuf {
        self.artifacts_root.join(&self.queryset_dir)
    }

    /// Directory holding expected-result fixtures
    pub fn expected_path(&self) -> PathBuf {
        self.queryset_path().join(&self.expected_results_dir)
    }

    /// Directory holding suite definition files
    pub fn test_queries_path(&self) -> PathBuf {
        self.queryset_path().join(&self.test_queries_dir)
    }

    /// Per-scenario output directory
    pub fn output_path(&self) -> PathBuf {
        self.output_root.join(&self.id)
    }
}

fn default_artifacts_dir() -> String {
    "artifacts".to_string()
}

fn default_scenarios_dir() -> String {
    "scenarios".to_string()
}

fn default_output_dir() -> String {
    "target/sqlproof".to_string()
}

fn default_strategy() -> String {
    "duckdb".to_string()
}

fn default_db_path() -> String {
    ":memory:".to_string()
}

fn default_expected_results_dir() -> String {
    "expected".to_string()
}

fn default_test_queries_dir() -> String {
    "queries".to_string()
}

/// Render a YAML scalar as placeholder text.
fn yaml_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Null => String::new(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

fn absolute(root: &Path, dir: &str) -> PathBuf {
    let path = Path::new(dir);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content =
            std::fs::read_to_string(path).map_err(|e| CoreError::io_with_path(path, e))?;
        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for sqlproof.yml or sqlproof.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        for name in CONFIG_FILE_NAMES {
            let candidate = dir.join(name);
            if candidate.exists() {
                return Self::load(&candidate);
            }
        }
        Err(CoreError::ConfigNotFound {
            path: dir.join(CONFIG_FILE_NAMES[0]).display().to_string(),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "Project name cannot be empty".to_string(),
            });
        }
        for pattern in self
            .include_scenarios
            .iter()
            .chain(self.exclude_scenarios.iter())
        {
            crate::project::full_match_regex(pattern)?;
        }
        Ok(())
    }

    /// Absolute artifacts directory
    pub fn artifacts_path(&self, root: &Path) -> PathBuf {
        absolute(root, &self.artifacts_dir)
    }

    /// Absolute scenarios directory
    pub fn scenarios_path(&self, root: &Path) -> PathBuf {
        absolute(root, &self.scenarios_dir)
    }

    /// Absolute output root
    pub fn output_path(&self, root: &Path) -> PathBuf {
        absolute(root, &self.output_dir)
    }

    /// Project variables rendered as strings
    pub fn string_vars(&self) -> BTreeMap<String, String> {
        self.vars
            .iter()
            .map(|(k, v)| (k.clone(), yaml_to_string(v)))
            .collect()
    }
}

impl ScenarioSettings {
    /// Load a scenario settings file
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| CoreError::io_with_path(path, e))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Overlay `other` on top of `self`; fields set in `other` win.
    pub fn merge(mut self, other: &ScenarioSettings) -> Self {
        self.connection = match (self.connection.take(), other.connection.as_ref()) {
            (Some(base), Some(over)) => Some(base.merge(over)),
            (base, over) => over.cloned().or(base),
        };
        merge_opt(&mut self.queryset_dir, &other.queryset_dir);
        merge_opt(&mut self.expected_results_dir, &other.expected_results_dir);
        merge_opt(&mut self.test_queries_dir, &other.test_queries_dir);
        merge_opt(&mut self.ping_query, &other.ping_query);
        merge_opt(&mut self.after_query, &other.after_query);
        merge_opt(&mut self.time_for_one_query_ms, &other.time_for_one_query_ms);
        merge_opt(&mut self.fast_fail, &other.fast_fail);
        merge_opt(&mut self.allowed_divergence, &other.allowed_divergence);
        merge_opt(&mut self.include_suites, &other.include_suites);
        merge_opt(&mut self.exclude_suites, &other.exclude_suites);
        for (k, v) in &other.vars {
            self.vars.insert(k.clone(), v.clone());
        }
        self
    }

    /// Resolve these settings (already merged over the project defaults) into
    /// a `ScenarioConfig`.
    ///
    /// Variable precedence, lowest first: project vars, scenario vars,
    /// `overrides`. The built-in `scenario` and `project_dir` variables are
    /// always available.
    pub fn resolve(
        self,
        id: &str,
        config: &Config,
        root: &Path,
        overrides: &BTreeMap<String, String>,
    ) -> CoreResult<ScenarioConfig> {
        let mut vars = BTreeMap::new();
        vars.insert("scenario".to_string(), id.to_string());
        vars.insert("project_dir".to_string(), root.display().to_string());
        vars.extend(config.string_vars());
        vars.extend(self.vars.iter().map(|(k, v)| (k.clone(), yaml_to_string(v))));
        vars.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        let vars = placeholder::resolve_all(&vars)?;

        let sub = |value: Option<String>| value.map(|v| placeholder::substitute(&v, &vars));
        let sub_all = |values: Option<Vec<String>>| {
            values
                .unwrap_or_default()
                .iter()
                .map(|v| placeholder::substitute(v, &vars))
                .collect::<Vec<_>>()
        };

        let queryset_dir = sub(self.queryset_dir).ok_or_else(|| CoreError::ConfigInvalid {
            message: format!("Scenario '{}' does not define queryset_dir", id),
        })?;

        let connection = self.connection.unwrap_or_default();
        let connection = ConnectionConfig {
            strategy: sub(connection.strategy).unwrap_or_else(default_strategy),
            path: sub(connection.path).unwrap_or_else(default_db_path),
            valid_connection_sql: sub(connection.valid_connection_sql),
            properties: connection
                .properties
                .iter()
                .map(|(k, v)| (k.clone(), placeholder::substitute(v, &vars)))
                .collect(),
        };

        let include_suites = sub_all(self.include_suites);
        let exclude_suites = sub_all(self.exclude_suites);
        for pattern in include_suites.iter().chain(exclude_suites.iter()) {
            crate::project::full_match_regex(pattern)?;
        }

        Ok(ScenarioConfig {
            id: id.to_string(),
            connection,
            queryset_dir,
            expected_results_dir: sub(self.expected_results_dir)
                .unwrap_or_else(default_expected_results_dir),
            test_queries_dir: sub(self.test_queries_dir)
                .unwrap_or_else(default_test_queries_dir),
            ping_query: sub(self.ping_query),
            after_query: sub(self.after_query),
            time_for_one_query: self.time_for_one_query_ms.map(Duration::from_millis),
            fast_fail: self.fast_fail.unwrap_or(true),
            allowed_divergence: sub(self.allowed_divergence)
                .or_else(|| sub(config.allowed_divergence.clone())),
            include_suites,
            exclude_suites,
            vars,
            artifacts_root: config.artifacts_path(root),
            output_root: config.output_path(root),
        })
    }
}

impl ConnectionSettings {
    fn merge(mut self, other: &ConnectionSettings) -> Self {
        merge_opt(&mut self.strategy, &other.strategy);
        merge_opt(&mut self.path, &other.path);
        merge_opt(&mut self.valid_connection_sql, &other.valid_connection_sql);
        for (k, v) in &other.properties {
            self.properties.insert(k.clone(), v.clone());
        }
        self
    }
}

fn merge_opt<T: Clone>(base: &mut Option<T>, over: &Option<T>) {
    if let Some(v) = over {
        *base = Some(v.clone());
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
