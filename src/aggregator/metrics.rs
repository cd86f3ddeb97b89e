//! Query list aggregation: filtering, frequency, duplicates and summaries.
//!
//! All functions take the captured queries as an immutable slice and return
//! fresh results. Given the same input order they return the same output.

use super::key::{KeySpec, QueryKey};
use crate::parser::query::Query;
use crate::utils::error::QueryError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;

/// One group of a frequency report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyEntry {
    pub key: QueryKey,
    pub count: usize,
    /// Summed duration of the group, in seconds
    pub duration: f64,
}

/// Overall report for one captured unit of work
///
/// Serializes as an ordered mapping with the fixed keys `queries`,
/// `duration`, `template queries`, `duplicate exact-sql` and
/// `duplicate param-sql`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub queries: usize,

    pub duration: f64,

    #[serde(rename = "template queries")]
    pub template_queries: usize,

    #[serde(rename = "duplicate exact-sql")]
    pub duplicate_exact_sql: usize,

    #[serde(rename = "duplicate param-sql")]
    pub duplicate_param_sql: usize,
}

impl Summary {
    /// Labelled rows in report order
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("queries", self.queries.to_string()),
            ("duration", format!("{:.6}", self.duration)),
            ("template queries", self.template_queries.to_string()),
            ("duplicate exact-sql", self.duplicate_exact_sql.to_string()),
            ("duplicate param-sql", self.duplicate_param_sql.to_string()),
        ]
    }

    /// Get human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "Queries: {} | Duration: {:.3}s | Template: {} | Duplicate exact: {} | Duplicate param: {}",
            self.queries,
            self.duration,
            self.template_queries,
            self.duplicate_exact_sql,
            self.duplicate_param_sql
        )
    }
}

/// Keep the queries whose key equals `value`
pub fn filter_by<'q>(
    queries: &'q [Query],
    key: &KeySpec<'_>,
    value: &QueryKey,
) -> Result<Vec<&'q Query>, QueryError> {
    let key = key.resolve();
    let mut matched = Vec::new();

    for query in queries {
        if key(query)? == *value {
            matched.push(query);
        }
    }

    Ok(matched)
}

/// Most frequent keys with their counts and summed durations
///
/// Groups are ordered by count, descending. Groups with equal counts keep the
/// order in which their key was first seen.
pub fn top_by_frequency(
    queries: &[Query],
    key: &KeySpec<'_>,
    limit: usize,
) -> Result<Vec<FrequencyEntry>, QueryError> {
    let key_fn = key.resolve();
    let keys = queries.iter().map(|query| key_fn(query)).collect::<Result<Vec<_>, _>>()?;

    let mut groups = count_groups(keys);
    debug!("Grouped {} queries by {} into {} groups", queries.len(), key.label(), groups.len());

    groups.sort_by(|a, b| b.1.cmp(&a.1));
    groups.truncate(limit);

    groups
        .into_iter()
        .map(|(value, count)| {
            let duration = filter_by(queries, key, &value)?
                .iter()
                .map(|query| query.duration())
                .sum::<f64>();
            Ok(FrequencyEntry { key: value, count, duration })
        })
        .collect()
}

/// Number of queries that deduplication would have avoided
///
/// Every group contributes `count - 1`; singleton groups contribute nothing.
pub fn count_excess_duplicates(queries: &[Query], key: &KeySpec<'_>) -> Result<usize, QueryError> {
    let key = key.resolve();
    let keys = queries.iter().map(|query| key(query)).collect::<Result<Vec<_>, _>>()?;
    Ok(excess_duplicates(keys))
}

/// Fixed five-entry summary of a query list
///
/// Each entry is computed by its own pass over the queries.
pub fn summarize(queries: &[Query]) -> Summary {
    Summary {
        queries: queries.len(),
        duration: queries.iter().map(|query| query.duration()).sum(),
        template_queries: queries.iter().filter(|query| query.is_from_template()).count(),
        duplicate_exact_sql: excess_duplicates(queries.iter().map(|query| query.sql())),
        duplicate_param_sql: excess_duplicates(queries.iter().map(|query| query.rawsql())),
    }
}

/// Slowest queries, longest first
///
/// Queries with equal durations keep their capture order.
pub fn slowest(queries: &[Query], limit: usize) -> Vec<&Query> {
    let mut ranked: Vec<&Query> = queries.iter().collect();
    ranked.sort_by(|a, b| b.duration().total_cmp(&a.duration()));
    ranked.truncate(limit);
    ranked
}

/// Count occurrences per key, in first-seen order
fn count_groups<K: Hash + Eq + Clone>(keys: impl IntoIterator<Item = K>) -> Vec<(K, usize)> {
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, usize)> = Vec::new();

    for key in keys {
        match index.get(&key) {
            Some(&position) => groups[position].1 += 1,
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, 1));
            }
        }
    }

    groups
}

fn excess_duplicates<K: Hash + Eq>(keys: impl IntoIterator<Item = K>) -> usize {
    let mut counts: HashMap<K, usize> = HashMap::new();
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }

    counts.values().filter(|&&count| count > 1).map(|count| count - 1).sum()
}
