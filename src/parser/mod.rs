//! Captured query parsing and normalization.
//!
//! This module handles:
//! - The on-disk schema of captured queries and log blobs
//! - The normalized, read-only `Query` view
//! - SQL display cleanup

pub mod query;
pub mod sanitize;
pub mod schema;

// Re-export main types
pub use query::{Codeline, FunctionInfo, Query, TemplateLine};
pub use sanitize::sanitize;
pub use schema::{CapturedQuery, ContextLine, LogBlob, QueryRecord, RequestInfo, StackFrame, TemplateInfo};
