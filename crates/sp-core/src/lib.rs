//! sp-core - Core library for sqlproof
//!
//! This crate provides configuration parsing, scenario settings resolution,
//! the fixture and suite document formats, project discovery and the JSON
//! run report shared by all sqlproof components.

pub mod config;
pub mod error;
pub mod fixture;
pub mod placeholder;
pub mod project;
pub mod report;
pub(crate) mod serde_helpers;
pub mod suite_file;

pub use config::{Config, ConnectionConfig, ScenarioConfig, ScenarioSettings};
pub use error::{CoreError, CoreResult};
pub use fixture::{
    ErrorArtifact, FixtureCell, FixtureColumn, FixtureDocument, FixtureException, FixtureOutcome,
    FixtureResult, FixtureTable,
};
pub use project::{discover_scenarios, discover_suites, Project, ScenarioFile, SuiteLocation};
pub use report::{
    Counts, QueryReport, QuerySetReport, QueryStatus, RunReport, ScenarioReport, SuiteReport,
};
pub use suite_file::{MetaQueryDef, QueryDef, SqlBody, SqlEntry, SuiteFile};
