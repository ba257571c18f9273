//! Error types for the migration.
//!
//! Only [`MigrateError`] is fatal. [`ReadError`] abandons a single entity
//! pass; per-record problems are [`crate::transform::SkipReason`]s and never
//! surface as errors.

use std::path::PathBuf;

use miette::Diagnostic;
use storefront_db::DbError;
use thiserror::Error;

/// Result type alias for fatal migration failures.
pub type Result<T> = std::result::Result<T, MigrateError>;

/// Errors that abort the whole run.
#[derive(Debug, Error, Diagnostic)]
pub enum MigrateError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("Legacy source unreachable: {source_name}")]
    #[diagnostic(
        code(storefront_migrate::source_unreachable),
        help("Check the LEGACY_DB_* variables, or LEGACY_JSON_DIR for JSON exports")
    )]
    SourceUnavailable {
        source_name: String,
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Document store unreachable")]
    #[diagnostic(
        code(storefront_migrate::target_unreachable),
        help("Check TARGET_DB_URL and the TARGET_DB_* credentials")
    )]
    TargetUnavailable(#[source] DbError),

    #[error("Failed to write migration report to {}", path.display())]
    #[diagnostic(code(storefront_migrate::report_write))]
    ReportWrite {
        path: PathBuf,
        #[source]
        cause: std::io::Error,
    },
}

impl MigrateError {
    pub fn source_unavailable(
        source_name: impl Into<String>,
        cause: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::SourceUnavailable {
            source_name: source_name.into(),
            cause: cause.into(),
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("Missing required setting: {key}")]
    #[diagnostic(
        code(storefront_migrate::config_missing),
        help("Set {key} in the environment or in .env")
    )]
    Missing { key: &'static str },

    #[error("Invalid value for {key}: {value:?} ({reason})")]
    #[diagnostic(code(storefront_migrate::config_invalid))]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Failed to read config file {}", path.display())]
    #[diagnostic(code(storefront_migrate::config_file))]
    File {
        path: PathBuf,
        #[source]
        cause: std::io::Error,
    },

    #[error("Failed to parse config file {}", path.display())]
    #[diagnostic(
        code(storefront_migrate::config_parse),
        help("MIGRATE_CONFIG must point at a TOML file")
    )]
    Parse {
        path: PathBuf,
        #[source]
        cause: toml::de::Error,
    },
}

/// Failure reading one legacy table.
#[derive(Debug, Error, Diagnostic)]
pub enum ReadError {
    #[error("Export file not found: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("Failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        cause: std::io::Error,
    },

    #[error("Malformed JSON in {}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        cause: serde_json::Error,
    },

    #[error("Element {index} of {} is not an object", path.display())]
    NotAnObject { path: PathBuf, index: usize },

    #[error("Query against table {table} failed")]
    Query {
        table: &'static str,
        #[source]
        cause: sqlx::Error,
    },
}
