//! Suite definition files
//!
//! ```yaml
//! meta_queries:
//!   - name: create
//!     sql: CREATE TABLE t (id INTEGER)
//!   - name: seed
//!     sql:
//!       - { name: one, sql: "INSERT INTO t VALUES (1)" }
//!       - { name: two, sql: "INSERT INTO t VALUES (2)" }
//! before_suite: create
//! before_each: seed
//! queries:
//!   - name: count
//!     sql: SELECT count(*) FROM t
//!   - name: steps
//!     after: cleanup
//!     sql:
//!       - { name: first, sql: "SELECT 1" }
//!       - { name: second, sql: "SELECT 2" }
//! ```

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuiteFile {
    /// Named setup/teardown query-sets usable as hooks
    #[serde(default)]
    pub meta_queries: Vec<MetaQueryDef>,

    #[serde(default)]
    pub before_suite: Option<String>,

    #[serde(default)]
    pub after_suite: Option<String>,

    #[serde(default)]
    pub before_each: Option<String>,

    #[serde(default)]
    pub after_each: Option<String>,

    /// Query-sets in run order
    #[serde(default)]
    pub queries: Vec<QueryDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetaQueryDef {
    pub name: String,
    pub sql: SqlBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryDef {
    pub name: String,
    pub sql: SqlBody,

    /// Meta-query-set run before this set instead of `before_each`
    #[serde(default)]
    pub before: Option<String>,

    /// Meta-query-set run after this set instead of `after_each`
    #[serde(default)]
    pub after: Option<String>,
}

/// One statement, or an ordered list of named statements
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlBody {
    Single(String),
    Multi(Vec<SqlEntry>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqlEntry {
    pub name: String,
    pub sql: String,
}

impl SqlBody {
    /// `(query id, sql)` pairs; a single statement takes the owner's name.
    pub fn entries<'a>(&'a self, owner: &'a str) -> Vec<(&'a str, &'a str)> {
        match self {
            SqlBody::Single(sql) => vec![(owner, sql.as_str())],
            SqlBody::Multi(entries) => entries
                .iter()
                .map(|e| (e.name.as_str(), e.sql.as_str()))
                .collect(),
        }
    }
}

impl SuiteFile {
    /// Load a suite file and check its meta-query-set references.
    pub fn load(path: &Path, suite_id: &str) -> CoreResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| CoreError::io_with_path(path, e))?;
        let suite: SuiteFile =
            serde_yaml::from_str(&content).map_err(|e| CoreError::SuiteParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        suite.validate(suite_id).map_err(|e| match e {
            CoreError::SuiteParseError { message, .. } => CoreError::SuiteParseError {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })?;
        Ok(suite)
    }

    /// Check names are unique and every hook refers to a defined meta-query-set.
    pub fn validate(&self, suite_id: &str) -> CoreResult<()> {
        let mut meta_names = HashSet::new();
        for meta in &self.meta_queries {
            if !meta_names.insert(meta.name.as_str()) {
                return Err(duplicate("meta-query-set", &meta.name));
            }
            if matches!(&meta.sql, SqlBody::Multi(v) if v.is_empty()) {
                return Err(empty_set(&meta.name));
            }
        }

        let check = |name: &Option<String>| -> CoreResult<()> {
            match name {
                Some(n) if !meta_names.contains(n.as_str()) => {
                    Err(CoreError::UnknownMetaQuerySet {
                        suite: suite_id.to_string(),
                        name: n.clone(),
                    })
                }
                _ => Ok(()),
            }
        };
        check(&self.before_suite)?;
        check(&self.after_suite)?;
        check(&self.before_each)?;
        check(&self.after_each)?;

        let mut set_names = HashSet::new();
        for query in &self.queries {
            if !set_names.insert(query.name.as_str()) {
                return Err(duplicate("query", &query.name));
            }
            if matches!(&query.sql, SqlBody::Multi(v) if v.is_empty()) {
                return Err(empty_set(&query.name));
            }
            check(&query.before)?;
            check(&query.after)?;
        }
        Ok(())
    }

    /// Total number of main queries (meta queries excluded)
    pub fn query_count(&self) -> usize {
        self.queries
            .iter()
            .map(|q| q.sql.entries(&q.name).len())
            .sum()
    }
}

fn duplicate(kind: &str, name: &str) -> CoreError {
    CoreError::SuiteParseError {
        path: String::new(),
        message: format!("duplicate {} name '{}'", kind, name),
    }
}

fn empty_set(name: &str) -> CoreError {
    CoreError::SuiteParseError {
        path: String::new(),
        message: format!("'{}' has an empty sql list", name),
    }
}

#[cfg(test)]
#[path = "suite_file_test.rs"]
mod tests;
