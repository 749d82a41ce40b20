//! Error types for sp-core

use thiserror::Error;

/// Core error type for sqlproof
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Failed to parse configuration file
    #[error("[E002] Failed to parse config {path}: {message}")]
    ConfigParseError { path: String, message: String },

    /// E003: Invalid configuration value
    #[error("[E003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E004: Project directory not found
    #[error("[E004] Project directory not found: {path}")]
    ProjectNotFound { path: String },

    /// E005: Placeholder references itself, directly or through a cycle
    #[error("[E005] Circular placeholder reference in '{key}'")]
    CircularPlaceholder { key: String },

    /// E006: Invalid include/exclude pattern
    #[error("[E006] Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// F001: Fixture file could not be parsed
    #[error("[F001] Failed to parse fixture {path}: {message}")]
    FixtureParseError { path: String, message: String },

    /// F002: Fixture content violates the document rules
    #[error("[F002] Invalid fixture: {message}")]
    FixtureInvalid { message: String },

    /// F003: Suite file could not be parsed
    #[error("[F003] Failed to parse suite {path}: {message}")]
    SuiteParseError { path: String, message: String },

    /// F004: Suite references an undefined meta-query-set
    #[error("[F004] Meta-query-set '{name}' does not exist in suite '{suite}'")]
    UnknownMetaQuerySet { suite: String, name: String },

    /// E007: IO error
    #[error("[E007] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// E008: IO error with file path context
    #[error("[E008] Failed to access '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Wrap an IO error with the path it occurred on.
    pub fn io_with_path(path: &std::path::Path, source: std::io::Error) -> Self {
        CoreError::IoWithPath {
            path: path.display().to_string(),
            source,
        }
    }
}
