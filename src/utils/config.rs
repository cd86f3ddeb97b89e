//! Configuration and constants for the library and CLI.

/// Current analysis report schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Default number of groups kept by frequency reports
pub const DEFAULT_TOP_N: usize = 10;

/// Upper bound accepted for `--top`
pub const MAX_TOP_N: usize = 1000;

/// Replacement for a SELECT column list in display SQL
pub const SQL_PLACEHOLDER: &str = "..";

/// Environment variable naming the directory captured logs are written to
pub const DATA_DIRECTORY_ENV: &str = "QUERYLOG_DATA_DIRECTORY";

/// Extension of persisted query logs
pub const LOG_FILE_EXTENSION: &str = "json";

/// Prefix used when neither the caller nor request metadata provide one
pub const UNKNOWN_PREFIX: &str = "unknown";

// Query durations are stored in seconds; stacks and keys use whole microseconds
pub const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// Keys reported by `analyze` when no `--by` flag is given
pub const DEFAULT_REPORT_KEYS: &[&str] = &["rawsql_display", "codeline", "template"];
