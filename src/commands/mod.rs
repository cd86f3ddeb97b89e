//! CLI command implementations.
//!
//! Commands orchestrate the various library components to perform user tasks.

pub mod analyze;
pub mod models;
pub mod utils;

// Re-export main command functions
pub use analyze::{execute_analyze, parse_keys, validate_args};
pub use models::AnalyzeArgs;
pub use utils::{display_schema, display_version, list_log_files, validate_log_file};
