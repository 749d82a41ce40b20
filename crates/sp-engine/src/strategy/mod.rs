//! Result strategies
//!
//! A result strategy decides whether a query passed. Strategies are looked
//! up by name in a [`ResultStrategyRegistry`]; an unknown name falls back to
//! `NONE`.

pub mod compare;
pub mod generate;
pub mod meta;
pub mod none;

pub use compare::CompareStrategy;
pub use generate::GenerateStrategy;
pub use meta::MetaQuerySetStrategy;
pub use none::NoneStrategy;

use crate::actual::ActualResult;
use rust_decimal::Decimal;
use sp_core::ScenarioConfig;
use sp_db::DbConnection;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

/// A finished query as seen by a strategy
pub struct QueryView<'a> {
    pub suite_id: &'a str,
    pub query_id: &'a str,
    pub sql: &'a str,
    /// Entity a meta-query-set is guarding; `None` for main queries
    pub main_id: Option<&'a str>,
    pub actual: &'a ActualResult,
    /// Scenario connection, for expectations computed from SQL
    pub conn: &'a dyn DbConnection,
}

/// A strategy's judgement of one query
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Pass,
    /// Comparison failed; one entry per difference
    Fail(Vec<String>),
    /// The strategy itself could not do its job (I/O, bad fixture, ...)
    Error(String),
}

/// Decides pass/fail for completed queries
pub trait ResultStrategy: Send {
    fn name(&self) -> &str;

    /// Point the strategy at a scenario's directories and settings.
    /// Called once per scenario before any query runs.
    fn reset_configuration(&mut self, scenario: &ScenarioConfig);

    fn handle_result(&self, query: &QueryView<'_>) -> Verdict;

    /// Where the error artifact for a query would be written, if this
    /// strategy writes any
    fn error_file(&self, suite_id: &str, query_id: &str) -> Option<PathBuf>;

    /// Called once at the end of the run
    fn destroy(&mut self) {}
}

type StrategyFactory = Box<dyn Fn() -> Box<dyn ResultStrategy> + Send + Sync>;

/// Maps upper-cased strategy names to constructors
pub struct ResultStrategyRegistry {
    factories: BTreeMap<String, StrategyFactory>,
}

impl ResultStrategyRegistry {
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registry with `COMPARE`, `GENERATE` and `NONE`
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(CompareStrategy::NAME, || Box::new(CompareStrategy::new()));
        registry.register(GenerateStrategy::NAME, || Box::new(GenerateStrategy::new()));
        registry.register(NoneStrategy::NAME, || Box::new(NoneStrategy));
        registry
    }

    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn ResultStrategy> + Send + Sync + 'static,
    {
        self.factories
            .insert(name.to_uppercase(), Box::new(factory));
    }

    /// Create the strategy registered under `name` (case-insensitive),
    /// or `NONE` when there is no such strategy.
    pub fn create(&self, name: &str) -> Box<dyn ResultStrategy> {
        match self.factories.get(&name.to_uppercase()) {
            Some(factory) => factory(),
            None => {
                log::warn!(
                    "Unknown result mode '{}', using {}. Available: {}",
                    name,
                    NoneStrategy::NAME,
                    self.names().join(", ")
                );
                Box::new(NoneStrategy)
            }
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

impl Default for ResultStrategyRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Parse the allowed divergence; missing or unreadable values mean 0.
pub fn parse_tolerance(value: Option<&str>) -> Decimal {
    let Some(text) = value.map(str::trim).filter(|t| !t.is_empty()) else {
        return Decimal::ZERO;
    };
    match Decimal::from_str(text).or_else(|_| Decimal::from_scientific(text)) {
        Ok(d) => d.abs(),
        Err(e) => {
            log::warn!("Invalid allowed divergence '{}' ({}), using 0", text, e);
            Decimal::ZERO
        }
    }
}

/// `<suite>_<query>`, the file stem used for fixtures and artifacts
pub(crate) fn query_file_stem(suite_id: &str, query_id: &str) -> String {
    format!("{}_{}", suite_id, query_id)
}
