//! Judging of meta-query-set queries
//!
//! Meta queries have no fixtures: they fail only when the database raised
//! an error.

use super::{query_file_stem, QueryView, ResultStrategy, Verdict};
use crate::actual::ActualResult;
use crate::artifact::{errors_dir, write_artifact};
use crate::codec::to_fixture;
use crate::query::Query;
use crate::query_set::QuerySet;
use sp_core::{ErrorArtifact, FixtureResult, ScenarioConfig};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct MetaQuerySetStrategy {
    /// Name of the strategy judging the main queries
    main_name: String,
    errors_dir: PathBuf,
}

impl MetaQuerySetStrategy {
    pub const NAME: &'static str = "META_QUERY_SET";

    pub fn new(main_name: impl Into<String>) -> Self {
        Self {
            main_name: main_name.into(),
            errors_dir: PathBuf::new(),
        }
    }

    pub fn main_name(&self) -> &str {
        &self.main_name
    }

    /// Write an error artifact for every query of `set`, which was skipped
    /// because its guard failed, at the location `main` uses for them.
    pub fn write_errors_for_main_query_set(&self, set: &QuerySet, main: &dyn ResultStrategy) {
        for query in set.queries() {
            let Some(path) = main.error_file(&query.suite_id, &query.id) else {
                continue;
            };
            if let Err(e) = write_artifact(&path, &skipped_artifact(query)) {
                log::warn!("{}", e);
            }
        }
    }
}

fn skipped_artifact(query: &Query) -> ErrorArtifact {
    let actual = query
        .actual()
        .map(|a| to_fixture(a, true))
        .unwrap_or_else(FixtureResult::no_result);
    let failures = query
        .result()
        .and_then(|r| r.first_failure())
        .into_iter()
        .collect();
    ErrorArtifact {
        query: query.sql.clone(),
        expected: None,
        actual,
        failures,
    }
}

impl ResultStrategy for MetaQuerySetStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn reset_configuration(&mut self, scenario: &ScenarioConfig) {
        self.errors_dir = errors_dir(&scenario.output_path(), &self.main_name);
    }

    fn handle_result(&self, query: &QueryView<'_>) -> Verdict {
        let ActualResult::Exception(exception) = query.actual else {
            return Verdict::Pass;
        };
        let failures = vec![format!("Before-set query failed - {}", exception.message)];

        let main_id = query.main_id.unwrap_or(query.query_id);
        let path = self.errors_dir.join(format!(
            "{}_{}_error.yml",
            query_file_stem(query.suite_id, query.query_id),
            main_id
        ));
        let artifact = ErrorArtifact {
            query: query.sql.to_string(),
            expected: Some(FixtureResult::no_result()),
            actual: to_fixture(query.actual, true),
            failures: failures.clone(),
        };
        if let Err(e) = write_artifact(&path, &artifact) {
            log::warn!("{}", e);
        }
        Verdict::Fail(failures)
    }

    fn error_file(&self, suite_id: &str, query_id: &str) -> Option<PathBuf> {
        Some(self.errors_dir.join(format!(
            "{}_{}_error.yml",
            query_file_stem(suite_id, query_id),
            query_id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actual::ActualException;
    use sp_db::DuckDbConnection;

    fn seed_view<'a>(actual: &'a ActualResult, conn: &'a DuckDbConnection) -> QueryView<'a> {
        QueryView {
            suite_id: "orders",
            query_id: "seed",
            sql: "INSERT INTO t VALUES (1)",
            main_id: Some("totals"),
            actual,
            conn,
        }
    }

    #[test]
    fn test_only_exceptions_fail() {
        let dir = tempfile::tempdir().unwrap();
        let strategy = MetaQuerySetStrategy {
            main_name: "COMPARE".into(),
            errors_dir: errors_dir(dir.path(), "COMPARE"),
        };
        let conn = DuckDbConnection::in_memory().unwrap();

        assert_eq!(
            strategy.handle_result(&seed_view(&ActualResult::Update(1), &conn)),
            Verdict::Pass
        );

        let failed = ActualResult::Exception(ActualException {
            class: "CatalogError".into(),
            message: "Table t does not exist".into(),
            root_cause_message: "Table t does not exist".into(),
            stack_trace: "CatalogError: Table t does not exist".into(),
        });
        assert_eq!(
            strategy.handle_result(&seed_view(&failed, &conn)),
            Verdict::Fail(vec![
                "Before-set query failed - Table t does not exist".to_string()
            ])
        );
        assert!(dir
            .path()
            .join("errors_for_COMPARE/orders_seed_totals_error.yml")
            .exists());
    }
}
