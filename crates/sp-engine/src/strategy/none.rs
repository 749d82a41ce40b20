//! NONE: every executed query passes

use super::{QueryView, ResultStrategy, Verdict};
use sp_core::ScenarioConfig;
use std::path::PathBuf;

#[derive(Debug, Default, Clone, Copy)]
pub struct NoneStrategy;

impl NoneStrategy {
    pub const NAME: &'static str = "NONE";
}

impl ResultStrategy for NoneStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn reset_configuration(&mut self, _scenario: &ScenarioConfig) {}

    fn handle_result(&self, _query: &QueryView<'_>) -> Verdict {
        Verdict::Pass
    }

    fn error_file(&self, _suite_id: &str, _query_id: &str) -> Option<PathBuf> {
        None
    }
}
