//! COMPARE: check each actual result against its stored fixture

use super::{parse_tolerance, query_file_stem, QueryView, ResultStrategy, Verdict};
use crate::artifact::{errors_dir, write_artifact_with_failures};
use crate::codec::to_fixture;
use crate::compare::compare;
use crate::expected::ExpectedResult;
use rust_decimal::Decimal;
use sp_core::{ErrorArtifact, FixtureDocument, ScenarioConfig};
use sp_sql::SqlParser;
use std::path::PathBuf;

pub struct CompareStrategy {
    expected_dir: PathBuf,
    errors_dir: PathBuf,
    tolerance: Decimal,
    /// Decides whether row order matters for a query
    parser: SqlParser,
}

impl CompareStrategy {
    pub const NAME: &'static str = "COMPARE";

    pub fn new() -> Self {
        Self {
            expected_dir: PathBuf::new(),
            errors_dir: PathBuf::new(),
            tolerance: Decimal::ZERO,
            parser: SqlParser::default(),
        }
    }

    /// `<expected>/<suite>/<suite>_<query>.yml`
    pub fn fixture_path(&self, suite_id: &str, query_id: &str) -> PathBuf {
        self.expected_dir
            .join(suite_id)
            .join(format!("{}.yml", query_file_stem(suite_id, query_id)))
    }

    pub fn tolerance(&self) -> Decimal {
        self.tolerance
    }
}

impl Default for CompareStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultStrategy for CompareStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn reset_configuration(&mut self, scenario: &ScenarioConfig) {
        self.expected_dir = scenario.expected_path();
        self.errors_dir = errors_dir(&scenario.output_path(), Self::NAME);
        self.tolerance = parse_tolerance(scenario.allowed_divergence.as_deref());
        self.parser = SqlParser::from_dialect_name(&scenario.connection.strategy)
            .unwrap_or_else(|_| SqlParser::generic());
    }

    fn handle_result(&self, query: &QueryView<'_>) -> Verdict {
        let path = self.fixture_path(query.suite_id, query.query_id);
        let document = match FixtureDocument::load(&path) {
            Ok(doc) => doc,
            Err(e) => return Verdict::Error(format!("Cannot read expected result: {}", e)),
        };
        let expected = match ExpectedResult::from_fixture(&document.result) {
            Ok(expected) => expected.resolve(query.conn),
            Err(e) => {
                return Verdict::Error(format!(
                    "Cannot build expected result from {}: {}",
                    path.display(),
                    e
                ))
            }
        };

        let sortable = self.parser.classify(query.sql).sortable();
        let failures = compare(&expected, query.actual, sortable, self.tolerance);
        if failures.is_empty() {
            return Verdict::Pass;
        }

        if let Some(error_path) = self.error_file(query.suite_id, query.query_id) {
            let artifact = ErrorArtifact {
                query: query.sql.to_string(),
                expected: Some(document.result),
                actual: to_fixture(query.actual, true),
                failures: failures.clone(),
            };
            if let Err(e) = write_artifact_with_failures(&error_path, &artifact) {
                log::warn!("{}", e);
            }
        }
        Verdict::Fail(failures)
    }

    fn error_file(&self, suite_id: &str, query_id: &str) -> Option<PathBuf> {
        Some(
            self.errors_dir
                .join(format!("{}_error.yml", query_file_stem(suite_id, query_id))),
        )
    }
}

#[cfg(test)]
#[path = "compare_test.rs"]
mod tests;
