//! Error artifacts for failed queries

use crate::error::{EngineError, EngineResult};
use sp_core::ErrorArtifact;
use std::fmt::Write;
use std::path::{Path, PathBuf};

/// Directory holding the error artifacts of one strategy
pub fn errors_dir(scenario_output: &Path, strategy_name: &str) -> PathBuf {
    scenario_output.join(format!("errors_for_{}", strategy_name))
}

/// Write `artifact` to `path`.
pub fn write_artifact(path: &Path, artifact: &ErrorArtifact) -> EngineResult<()> {
    artifact.save(path).map_err(|e| EngineError::WriteFailed {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Write `artifact` plus a plain-text `<stem>_failures.txt` next to it.
pub fn write_artifact_with_failures(path: &Path, artifact: &ErrorArtifact) -> EngineResult<()> {
    write_artifact(path, artifact)?;

    let failures_path = failures_path(path);
    let mut out = String::new();
    let _ = writeln!(out, "Query:");
    let _ = writeln!(out, "  {}", artifact.query.trim());
    let _ = writeln!(out);
    let _ = writeln!(out, "Failures ({}):", artifact.failures.len());
    for failure in &artifact.failures {
        let _ = writeln!(out, "  - {}", failure);
    }
    if let Some(trace) = artifact
        .actual
        .exception
        .as_ref()
        .and_then(|e| e.stack_trace.as_deref())
    {
        let _ = writeln!(out);
        let _ = writeln!(out, "Stack trace:");
        for line in trace.lines() {
            let _ = writeln!(out, "  {}", line);
        }
    }
    std::fs::write(&failures_path, out).map_err(|e| EngineError::WriteFailed {
        path: failures_path.display().to_string(),
        message: e.to_string(),
    })
}

/// `x/suite_q_error.yml` -> `x/suite_q_failures.txt`
fn failures_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("query");
    let stem = stem.strip_suffix("_error").unwrap_or(stem);
    path.with_file_name(format!("{}_failures.txt", stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sp_core::{FixtureException, FixtureResult};

    #[test]
    fn test_failures_path() {
        assert_eq!(
            failures_path(Path::new("/out/errors_for_COMPARE/s_q_error.yml")),
            PathBuf::from("/out/errors_for_COMPARE/s_q_failures.txt")
        );
    }

    #[test]
    fn test_write_artifact_with_failures() {
        let dir = tempfile::tempdir().unwrap();
        let path = errors_dir(dir.path(), "COMPARE").join("suite_q1_error.yml");
        let artifact = ErrorArtifact {
            query: "SELECT 1".into(),
            expected: Some(FixtureResult::update(1)),
            actual: FixtureResult::exception(FixtureException {
                class: "CatalogError".into(),
                message: Some("missing".into()),
                message_regex: None,
                stack_trace: Some("CatalogError: missing".into()),
            }),
            failures: vec!["Expected update but found exception[CatalogError].".into()],
        };
        write_artifact_with_failures(&path, &artifact).unwrap();

        assert!(path.exists());
        let text =
            std::fs::read_to_string(path.with_file_name("suite_q1_failures.txt")).unwrap();
        assert!(text.contains("Failures (1):"));
        assert!(text.contains("  - Expected update but found exception[CatalogError]."));
        assert!(text.contains("  CatalogError: missing"));
    }
}
