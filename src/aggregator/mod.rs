//! Aggregation of captured queries into reports.
//!
//! This module transforms normalized queries into:
//! - Grouping keys (field, derived function or the record itself)
//! - Frequency, duplicate and summary reports
//! - Collapsed stacks (for flamegraph generation)

pub mod key;
pub mod metrics;
pub mod stack_builder;

// Re-export main types and functions
pub use key::{resolve_key, KeyFn, KeySpec, QueryField, QueryKey, Seconds};
pub use metrics::{
    count_excess_duplicates, filter_by, slowest, summarize, top_by_frequency, FrequencyEntry, Summary,
};
pub use stack_builder::{build_collapsed_stacks, duration_to_micros, total_weight, CollapsedStack};
