//! Build the execution hierarchy from suite files

use crate::error::{EngineError, EngineResult};
use crate::query::Query;
use crate::query_set::QuerySet;
use crate::scenario::Scenario;
use crate::suite::{Suite, SuiteHooks};
use sp_core::{discover_suites, ScenarioConfig, SuiteFile, SuiteLocation};
use sp_db::ConnectionRegistry;

/// Load every selected suite of a scenario and attach its connection strategy.
pub fn load_scenario(
    config: ScenarioConfig,
    registry: &ConnectionRegistry,
) -> EngineResult<Scenario> {
    let connection_strategy = registry.create(&config.connection.strategy)?;
    let suites = discover_suites(&config)?
        .iter()
        .map(|location| load_suite(location, config.fast_fail))
        .collect::<EngineResult<Vec<_>>>()?;
    log::debug!(
        "Scenario {}: {} suites loaded from {}",
        config.id,
        suites.len(),
        config.test_queries_path().display()
    );
    Ok(Scenario::new(config, suites, connection_strategy))
}

pub fn load_suite(location: &SuiteLocation, fast_fail: bool) -> EngineResult<Suite> {
    let file = SuiteFile::load(&location.path, &location.id).map_err(|source| {
        EngineError::SuiteLoad {
            suite: location.id.clone(),
            source,
        }
    })?;
    Ok(build_suite(&location.id, &file, fast_fail))
}

/// Turn a validated suite file into a suite.
///
/// Main query-sets take the scenario's fast-fail flag; meta sets always
/// fast-fail.
pub fn build_suite(suite_id: &str, file: &SuiteFile, fast_fail: bool) -> Suite {
    let mut suite = Suite::new(
        suite_id,
        SuiteHooks {
            before_suite: file.before_suite.clone(),
            after_suite: file.after_suite.clone(),
            before_each: file.before_each.clone(),
            after_each: file.after_each.clone(),
        },
    );

    for def in &file.meta_queries {
        let mut set = QuerySet::meta(&def.name, suite_id);
        for (id, sql) in def.sql.entries(&def.name) {
            set.push(Query::new(id, suite_id, sql));
        }
        suite.add_meta_query_set(set);
    }

    for def in &file.queries {
        let mut set = QuerySet::new(&def.name, suite_id, fast_fail)
            .with_before(def.before.clone())
            .with_after(def.after.clone());
        for (id, sql) in def.sql.entries(&def.name) {
            set.push(Query::new(id, suite_id, sql));
        }
        suite.add_query_set(set);
    }
    suite
}
