//! Persisted query log container.
//!
//! Loads captured units of work back from disk and materializes them into
//! normalized queries ready for aggregation.

pub mod debug_log;
pub mod listing;

pub use debug_log::DebugLog;
pub use listing::{list_logs, log_filename, parse_log_filename, LogFileEntry};
