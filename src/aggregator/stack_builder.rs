//! Build collapsed stack format from captured queries.
//!
//! Collapsed stacks are the input format for flamegraph generation.
//! Format: "parent;child;grandchild weight"
//!
//! Example: "index (views.py);render (loader.py);SELECT .. FROM book 1200"
//! This means: index called render which issued the SELECT, taking 1200µs.

use crate::parser::query::Query;
use crate::parser::schema::StackFrame;
use crate::utils::config::MICROS_PER_SECOND;
use crate::utils::error::QueryError;
use log::debug;
use std::collections::HashMap;

/// A single collapsed stack entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapsedStack {
    /// Stack trace as semicolon-separated string
    pub stack: String,

    /// Weight (query time in microseconds spent under this stack)
    pub weight: u64,
}

impl CollapsedStack {
    pub fn new(stack: String, weight: u64) -> Self {
        Self { stack, weight }
    }

    /// Innermost element of the stack (the SQL leaf)
    pub fn leaf(&self) -> &str {
        self.stack.rsplit(';').next().unwrap_or(&self.stack)
    }
}

/// Build collapsed stacks from captured queries
///
/// # Algorithm
/// 1. Render each frame of the query's stack trace as a label
/// 2. Insert the template line, when the query came from a template
/// 3. Append the display SQL as the leaf
/// 4. Aggregate by unique stack (sum weights)
///
/// Every query weighs at least one microsecond so that instant queries still
/// show up.
///
/// # Errors
/// * `QueryError::EmptyTrace` - a query has no call site to attribute it to
/// * `QueryError::MalformedTemplateInfo` - template info without a highlighted line
pub fn build_collapsed_stacks(queries: &[Query]) -> Result<Vec<CollapsedStack>, QueryError> {
    debug!("Building collapsed stacks from {} queries", queries.len());

    let mut stack_map: HashMap<String, u64> = HashMap::new();

    for query in queries {
        if query.stacktrace().is_empty() {
            return Err(QueryError::EmptyTrace);
        }

        let mut parts: Vec<String> = query.stacktrace().iter().map(frame_label).collect();

        if let Some(line) = query.template()? {
            parts.push(sanitize_part(&format!("{{{}:{}}}", line.template, line.lineno)));
        }

        parts.push(sanitize_part(&query.rawsql_display()));

        let weight = duration_to_micros(query.duration()).max(1);
        *stack_map.entry(parts.join(";")).or_insert(0) += weight;
    }

    let mut stacks: Vec<CollapsedStack> = stack_map
        .into_iter()
        .map(|(stack, weight)| CollapsedStack::new(stack, weight))
        .collect();

    // Heaviest first, name order among equals for stable output
    stacks.sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| a.stack.cmp(&b.stack)));

    debug!("Built {} unique collapsed stacks", stacks.len());

    Ok(stacks)
}

/// Total weight of a set of stacks
pub fn total_weight(stacks: &[CollapsedStack]) -> u64 {
    stacks.iter().map(|stack| stack.weight).sum()
}

/// Convert seconds to whole microseconds
pub fn duration_to_micros(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds * MICROS_PER_SECOND).round() as u64
    } else {
        0
    }
}

fn frame_label(frame: &StackFrame) -> String {
    let file = frame.file().rsplit('/').next().unwrap_or(frame.file());
    sanitize_part(&format!("{} ({}:{})", frame.function(), file, frame.lineno()))
}

// ';' separates frames and newlines break the line format
fn sanitize_part(part: &str) -> String {
    part.replace(';', ",").replace(['\n', '\r'], " ")
}
