//! sp-engine - Execution engine for sqlproof
//!
//! This crate runs the scenario → suite → query-set → query hierarchy
//! against a database connection, judges each query with a result strategy
//! and compares actual results with stored fixtures.

pub mod actual;
pub mod artifact;
pub mod cancel;
pub mod cell;
pub mod codec;
pub mod compare;
pub mod context;
pub mod error;
pub mod expected;
pub mod loader;
pub mod progress;
pub mod query;
pub mod query_set;
pub mod runner;
pub mod scenario;
pub mod strategy;
pub mod suite;
pub mod summary;

#[cfg(test)]
pub(crate) mod testing;

pub use actual::{ActualException, ActualResult, ResultTable};
pub use cancel::CancellationToken;
pub use compare::compare;
pub use context::ExecutionContext;
pub use error::{EngineError, EngineResult, ExecutionError, ExecutionResult};
pub use expected::ExpectedResult;
pub use loader::{build_suite, load_scenario, load_suite};
pub use progress::{ProgressMonitor, ProgressMonitors, RunStatus, StatusMonitor};
pub use query::{Query, QueryError, QueryResult};
pub use query_set::QuerySet;
pub use runner::{RunHandle, Runner, NOT_RUN, REPORT_FILE};
pub use scenario::{Scenario, ScenarioSession};
pub use strategy::{
    CompareStrategy, GenerateStrategy, MetaQuerySetStrategy, NoneStrategy, QueryView,
    ResultStrategy, ResultStrategyRegistry, Verdict,
};
pub use suite::{Suite, SuiteHooks};
pub use summary::SummaryWriter;
