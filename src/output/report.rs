//! Analysis report schema.
//!
//! This module defines the structure of report JSON files we write to disk.
//! Keys are rendered to strings so reports stay readable by any consumer.
//! Schema is versioned to allow future evolution.

use crate::aggregator::key::KeySpec;
use crate::aggregator::metrics::{slowest, summarize, top_by_frequency, Summary};
use crate::aggregator::stack_builder::duration_to_micros;
use crate::logfile::DebugLog;
use crate::utils::config::SCHEMA_VERSION;
use crate::utils::error::QueryError;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Top-level analysis report written to JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Schema version for compatibility checking
    pub version: String,

    /// Log file the report was computed from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Capture metadata copied from the log
    pub info: Map<String, Value>,

    pub summary: Summary,

    /// Frequency reports, one per grouping key
    pub top: Vec<GroupReport>,

    /// Slowest individual queries
    pub slowest: Vec<SlowQuery>,

    /// Timestamp when report was generated
    pub generated_at: String,
}

/// Frequency report for one grouping key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupReport {
    pub key: String,
    pub entries: Vec<ReportEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub key: String,
    pub count: usize,
    /// Seconds
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlowQuery {
    pub sql: String,
    pub duration_us: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codeline: Option<String>,
}

/// Compute a full report for a loaded log
///
/// # Errors
/// Propagates key errors from the frequency reports (`EmptyTrace`,
/// `MalformedTemplateInfo`).
pub fn to_report(
    log: &DebugLog,
    keys: &[KeySpec<'_>],
    top_n: usize,
) -> Result<AnalysisReport, QueryError> {
    let mut top = Vec::with_capacity(keys.len());
    for key in keys {
        let entries = top_by_frequency(&log.queries, key, top_n)?
            .into_iter()
            .map(|entry| ReportEntry {
                key: entry.key.to_string(),
                count: entry.count,
                duration: entry.duration,
            })
            .collect();
        top.push(GroupReport {
            key: key.label(),
            entries,
        });
    }

    let slowest = slowest(&log.queries, top_n)
        .into_iter()
        .map(|query| SlowQuery {
            sql: query.sql().to_string(),
            duration_us: duration_to_micros(query.duration()),
            codeline: query.codeline().ok().map(|line| line.to_string()),
        })
        .collect();

    Ok(AnalysisReport {
        version: SCHEMA_VERSION.to_string(),
        source: log.source().map(|path| path.display().to_string()),
        info: log.info.clone(),
        summary: summarize(&log.queries),
        top,
        slowest,
        generated_at: Utc::now().to_rfc3339(),
    })
}
