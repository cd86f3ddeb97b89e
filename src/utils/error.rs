//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors raised while deriving facts from a single captured query
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Captured query has an empty stack trace")]
    EmptyTrace,

    #[error("Template info for '{template}' has no highlighted context line")]
    MalformedTemplateInfo { template: String },

    #[error("Unknown query field: {0}")]
    UnknownField(String),
}

/// Errors that can occur while loading a persisted query log
#[derive(Error, Debug)]
pub enum LogError {
    #[error("Failed to read query log: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt query log: {0}")]
    CorruptLog(String),
}

/// Errors that can occur while dumping a captured unit of work
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("No data directory configured (set QUERYLOG_DATA_DIRECTORY)")]
    NoDataDirectory,

    #[error("Data directory unavailable: {0}")]
    DirectoryUnavailable(String),

    #[error("Failed to write query log: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize query log: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors that can occur during flamegraph generation
#[derive(Error, Debug)]
pub enum FlamegraphError {
    #[error("Empty stack data")]
    EmptyStacks,
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
