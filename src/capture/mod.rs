//! Capture-side glue.
//!
//! The recorder collects statements for one unit of work; the dump routine
//! persists them as a log blob in the configured data directory.

pub mod dump;
pub mod recorder;

pub use dump::{dump_queries, log_queries, CaptureConfig};
pub use recorder::{Execution, QueryRecorder};
