//! GENERATE: write each actual result as a new fixture

use super::{query_file_stem, QueryView, ResultStrategy, Verdict};
use crate::codec::to_fixture;
use sp_core::{FixtureDocument, ScenarioConfig};
use std::path::PathBuf;

#[derive(Debug, Default)]
pub struct GenerateStrategy {
    /// `<output>/GENERATE/<queryset_dir>/<expected_results_dir>`
    target_dir: PathBuf,
}

impl GenerateStrategy {
    pub const NAME: &'static str = "GENERATE";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn fixture_path(&self, suite_id: &str, query_id: &str) -> PathBuf {
        self.target_dir
            .join(suite_id)
            .join(format!("{}.yml", query_file_stem(suite_id, query_id)))
    }
}

impl ResultStrategy for GenerateStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn reset_configuration(&mut self, scenario: &ScenarioConfig) {
        self.target_dir = scenario
            .output_root
            .join(Self::NAME)
            .join(&scenario.queryset_dir)
            .join(&scenario.expected_results_dir);
        log::debug!("Generating fixtures into {}", self.target_dir.display());
    }

    fn handle_result(&self, query: &QueryView<'_>) -> Verdict {
        let path = self.fixture_path(query.suite_id, query.query_id);
        let document = FixtureDocument {
            query: query.sql.to_string(),
            result: to_fixture(query.actual, false),
        };
        match document.save(&path) {
            Ok(()) => Verdict::Pass,
            Err(e) => Verdict::Error(format!(
                "Cannot write generated result {}: {}",
                path.display(),
                e
            )),
        }
    }

    fn error_file(&self, _suite_id: &str, _query_id: &str) -> Option<PathBuf> {
        None
    }
}
