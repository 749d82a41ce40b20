use super::*;
use crate::loader::load_scenario;
use crate::strategy::NoneStrategy;
use crate::testing::scenario_config;
use sp_db::ConnectionRegistry;
use std::path::Path;
use std::time::Duration;

const SUITE: &str = r#"
meta_queries:
  - name: create
    sql: CREATE TABLE t AS SELECT * FROM range(3) r(id)
before_suite: create
queries:
  - name: count
    sql: SELECT count(*) FROM t
  - name: total
    sql: SELECT sum(id) FROM t
"#;

fn write_suite(root: &Path, name: &str, content: &str) {
    let dir = root.join("artifacts/set/queries");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(format!("{}.yml", name)), content).unwrap();
}

fn scenario(root: &Path, adjust: impl FnOnce(&mut ScenarioConfig)) -> Scenario {
    write_suite(root, "orders", SUITE);
    let mut config = scenario_config(root);
    adjust(&mut config);
    load_scenario(config, &ConnectionRegistry::with_defaults()).unwrap()
}

fn run(scenario: &mut Scenario) -> ExecutionResult<()> {
    let mut session = scenario.open().unwrap();
    session.run(&NoneStrategy, &ProgressMonitors::new(), &CancellationToken::new())
}

#[test]
fn test_session_runs_and_releases_connection() {
    let dir = tempfile::tempdir().unwrap();
    let mut scenario = scenario(dir.path(), |_| {});
    assert_eq!(scenario.number_of_queries(), 2);

    run(&mut scenario).unwrap();

    assert!(!scenario.is_connected());
    assert_eq!(scenario.counts().pass, 2);
    assert!(scenario.error().is_none());
    assert!(scenario.started_at().is_some());
    let report = scenario.to_report();
    assert_eq!(report.suites[0].query_sets.len(), 2);
}

#[test]
fn test_ping_failure_writes_setup_summary() {
    let dir = tempfile::tempdir().unwrap();
    let mut scenario = scenario(dir.path(), |c| {
        c.ping_query = Some("SELECT * FROM nowhere".into());
    });

    let err = scenario.before().unwrap_err();
    assert!(matches!(err, EngineError::ScenarioSetup { .. }));
    assert!(!scenario.is_connected());
    assert!(scenario.error().unwrap().contains("Ping query failed"));

    let text = std::fs::read_to_string(dir.path().join("out").join(SETUP_FAIL_FILE)).unwrap();
    assert!(text.starts_with("------------------------------\nscenario - "));
    assert!(text.contains("CatalogError"));

    // a second failure is appended
    scenario.before().unwrap_err();
    let text = std::fs::read_to_string(dir.path().join("out").join(SETUP_FAIL_FILE)).unwrap();
    assert_eq!(text.matches("------------------------------").count(), 2);
}

#[test]
fn test_teardown_failure_is_recorded_and_connection_closed() {
    let dir = tempfile::tempdir().unwrap();
    let mut scenario = scenario(dir.path(), |c| {
        c.after_query = Some("DROP TABLE nowhere".into());
    });

    run(&mut scenario).unwrap();

    assert!(!scenario.is_connected());
    let text =
        std::fs::read_to_string(dir.path().join("out").join(TEARDOWN_FAIL_FILE)).unwrap();
    assert!(text.contains("After query failed"));
}

#[test]
fn test_time_budget_stops_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let mut scenario = scenario(dir.path(), |c| {
        c.time_for_one_query = Some(Duration::ZERO);
    });

    let err = run(&mut scenario).unwrap_err();

    assert_eq!(err, ExecutionError::MaxTimeExceeded);
    assert_eq!(scenario.error(), Some("Max time exceeded."));
    assert_eq!(scenario.counts().executed, 1);
    assert!(!scenario.is_connected());
}

#[test]
fn test_run_without_connection_is_server_not_available() {
    let dir = tempfile::tempdir().unwrap();
    let mut scenario = scenario(dir.path(), |_| {});
    let err = scenario
        .run(&NoneStrategy, &ProgressMonitors::new(), &CancellationToken::new())
        .unwrap_err();
    assert!(matches!(err, ExecutionError::ServerNotAvailable(_)));
}

#[test]
fn test_suites_sorted_by_id() {
    let dir = tempfile::tempdir().unwrap();
    write_suite(dir.path(), "zeta", "queries:\n  - name: q\n    sql: SELECT 1\n");
    write_suite(dir.path(), "alpha", "queries:\n  - name: q\n    sql: SELECT 1\n");
    let scenario = scenario(dir.path(), |_| {});
    let ids: Vec<_> = scenario.suites().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["alpha", "orders", "zeta"]);
}
