//! JSON run report (`result.json`)
//!
//! A tree of scenarios, suites, query-sets and queries where every node
//! carries its all/executed/pass/fail/skip counters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use uuid::Uuid;

use crate::error::CoreResult;

/// Query counters of one hierarchy node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub all: usize,
    pub executed: usize,
    pub pass: usize,
    pub fail: usize,
    /// `all - pass - fail`
    pub skip: usize,
}

impl Counts {
    pub fn new(all: usize, executed: usize, pass: usize, fail: usize) -> Self {
        Self {
            all,
            executed,
            pass,
            fail,
            skip: all.saturating_sub(pass + fail),
        }
    }

    pub fn add(&mut self, other: &Counts) {
        self.all += other.all;
        self.executed += other.executed;
        self.pass += other.pass;
        self.fail += other.fail;
        self.skip += other.skip;
    }

    pub fn has_failures(&self) -> bool {
        self.fail > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    Pass,
    Fail,
    Skip,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryReport {
    pub id: String,
    pub status: QueryStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySetReport {
    pub id: String,
    #[serde(flatten)]
    pub counts: Counts,
    pub queries: Vec<QueryReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteReport {
    pub id: String,
    #[serde(flatten)]
    pub counts: Counts,
    #[serde(rename = "query-sets")]
    pub query_sets: Vec<QuerySetReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub id: String,
    #[serde(flatten)]
    pub counts: Counts,
    /// Reason the scenario stopped early, if it did
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub suites: Vec<SuiteReport>,
}

/// Report of one whole run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub interrupted: bool,
    #[serde(flatten)]
    pub counts: Counts,
    pub scenarios: Vec<ScenarioReport>,
}

impl RunReport {
    /// Start a new report with a fresh run id
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            finished_at: None,
            interrupted: false,
            counts: Counts::default(),
            scenarios: Vec::new(),
        }
    }

    pub fn push_scenario(&mut self, scenario: ScenarioReport) {
        self.counts.add(&scenario.counts);
        self.scenarios.push(scenario);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Load a report; `None` if the file does not exist
    pub fn load(path: &Path) -> CoreResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Save the report atomically (write to a temp file, then rename)
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let temp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, path)?;
        Ok(())
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}
