use super::*;

#[test]
fn test_parse_minimal_config() {
    let config: Config = serde_yaml::from_str("name: regression").unwrap();
    assert_eq!(config.name, "regression");
    let root = PathBuf::from("/tmp/project");
    assert_eq!(config.artifacts_path(&root), root.join("artifacts"));
    assert_eq!(config.scenarios_path(&root), root.join("scenarios"));
    assert_eq!(config.output_path(&root), root.join("target/sqlproof"));
    assert!(config.result_mode.is_none());
    assert!(config.write_summaries);
}

#[test]
fn test_unknown_field_rejected() {
    let result: Result<Config, _> = serde_yaml::from_str("name: x\nmodel_paths: [a]");
    assert!(result.is_err());
}

#[test]
fn test_load_from_dir_missing() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load_from_dir(dir.path()).unwrap_err();
    assert!(matches!(err, CoreError::ConfigNotFound { .. }));
}

#[test]
fn test_load_rejects_empty_name() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("sqlproof.yml"), "name: \"  \"\n").unwrap();
    let err = Config::load_from_dir(dir.path()).unwrap_err();
    assert!(matches!(err, CoreError::ConfigInvalid { .. }));
}

#[test]
fn test_load_yaml_extension() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("sqlproof.yaml"),
        "name: alt\nresult_mode: compare\n",
    )
    .unwrap();
    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.result_mode.as_deref(), Some("compare"));
}

#[test]
fn test_merge_scenario_over_defaults() {
    let defaults: ScenarioSettings = serde_yaml::from_str(
        r#"
queryset_dir: base
fast_fail: true
connection:
  strategy: duckdb
  path: base.duckdb
  properties:
    threads: "4"
"#,
    )
    .unwrap();
    let scenario: ScenarioSettings = serde_yaml::from_str(
        r#"
fast_fail: false
connection:
  path: other.duckdb
  properties:
    memory_limit: 1GB
"#,
    )
    .unwrap();

    let merged = defaults.merge(&scenario);
    assert_eq!(merged.queryset_dir.as_deref(), Some("base"));
    assert_eq!(merged.fast_fail, Some(false));
    let conn = merged.connection.unwrap();
    assert_eq!(conn.strategy.as_deref(), Some("duckdb"));
    assert_eq!(conn.path.as_deref(), Some("other.duckdb"));
    assert_eq!(conn.properties.len(), 2);
}

#[test]
fn test_resolve_substitutes_placeholders() {
    let config: Config = serde_yaml::from_str(
        r#"
name: p
allowed_divergence: "0.01"
vars:
  env: ci
  suite_dir: "queries_${env}"
"#,
    )
    .unwrap();
    let settings: ScenarioSettings = serde_yaml::from_str(
        r#"
queryset_dir: "${scenario}_set"
test_queries_dir: "${suite_dir}"
ping_query: "SELECT '${env}'"
connection:
  path: "${project_dir}/db_${env}.duckdb"
"#,
    )
    .unwrap();

    let root = PathBuf::from("/work");
    let resolved = config
        .defaults
        .clone()
        .merge(&settings)
        .resolve("nightly", &config, &root, &BTreeMap::new())
        .unwrap();

    assert_eq!(resolved.queryset_dir, "nightly_set");
    assert_eq!(resolved.test_queries_dir, "queries_ci");
    assert_eq!(resolved.expected_results_dir, "expected");
    assert_eq!(resolved.ping_query.as_deref(), Some("SELECT 'ci'"));
    assert_eq!(resolved.connection.path, "/work/db_ci.duckdb");
    assert_eq!(resolved.connection.strategy, "duckdb");
    assert_eq!(resolved.allowed_divergence.as_deref(), Some("0.01"));
    assert!(resolved.fast_fail);
    assert!(resolved.time_for_one_query.is_none());
    assert_eq!(
        resolved.expected_path(),
        PathBuf::from("/work/artifacts/nightly_set/expected")
    );
    assert_eq!(
        resolved.output_path(),
        PathBuf::from("/work/target/sqlproof/nightly")
    );
}

#[test]
fn test_resolve_overrides_win() {
    let config: Config = serde_yaml::from_str("name: p\nvars:\n  env: dev\n").unwrap();
    let settings: ScenarioSettings =
        serde_yaml::from_str("queryset_dir: \"${env}\"\nvars:\n  env: test\n").unwrap();
    let mut overrides = BTreeMap::new();
    overrides.insert("env".to_string(), "prod".to_string());

    let resolved = settings
        .resolve("s", &config, Path::new("/p"), &overrides)
        .unwrap();
    assert_eq!(resolved.queryset_dir, "prod");
}

#[test]
fn test_resolve_requires_queryset_dir() {
    let config: Config = serde_yaml::from_str("name: p").unwrap();
    let err = ScenarioSettings::default()
        .resolve("s", &config, Path::new("/p"), &BTreeMap::new())
        .unwrap_err();
    assert!(matches!(err, CoreError::ConfigInvalid { .. }));
}

#[test]
fn test_resolve_time_budget() {
    let config: Config = serde_yaml::from_str("name: p").unwrap();
    let settings: ScenarioSettings =
        serde_yaml::from_str("queryset_dir: q\ntime_for_one_query_ms: 250\n").unwrap();
    let resolved = settings
        .resolve("s", &config, Path::new("/p"), &BTreeMap::new())
        .unwrap();
    assert_eq!(resolved.time_for_one_query, Some(Duration::from_millis(250)));
}
