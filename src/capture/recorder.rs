//! Per-unit-of-work query recorder.
//!
//! One recorder is created for each traced unit of work (a request, a
//! command run) and passed explicitly to whatever executes the queries. There
//! is no global registry.

use crate::parser::schema::{CapturedQuery, LogBlob, QueryRecord, RequestInfo, StackFrame, TemplateInfo};
use log::debug;
use serde_json::{Map, Value};
use std::time::Instant;

/// Call-site metadata for one statement about to be executed
#[derive(Debug, Clone, Default)]
pub struct Execution {
    pub alias: String,
    pub sql: String,
    pub raw_sql: String,
    pub stacktrace: Vec<StackFrame>,
    pub template_info: Option<TemplateInfo>,
}

impl Execution {
    pub fn new(alias: impl Into<String>, sql: impl Into<String>, raw_sql: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            sql: sql.into(),
            raw_sql: raw_sql.into(),
            ..Default::default()
        }
    }

    pub fn with_stacktrace(mut self, stacktrace: Vec<StackFrame>) -> Self {
        self.stacktrace = stacktrace;
        self
    }

    pub fn with_template(mut self, template_info: TemplateInfo) -> Self {
        self.template_info = Some(template_info);
        self
    }
}

/// Capture buffer for a single unit of work
#[derive(Debug, Default)]
pub struct QueryRecorder {
    queries: Vec<CapturedQuery>,
}

impl QueryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an already-measured statement
    pub fn record(&mut self, alias: impl Into<String>, record: QueryRecord) {
        self.queries.push(CapturedQuery::new(alias, record));
    }

    /// Run `execute`, timing it and recording the statement
    pub fn track<T>(&mut self, execution: Execution, execute: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = execute();
        let duration = start.elapsed().as_secs_f64();

        debug!("Recorded query on '{}' ({:.6}s)", execution.alias, duration);

        self.record(
            execution.alias,
            QueryRecord {
                sql: execution.sql,
                raw_sql: execution.raw_sql,
                duration,
                stacktrace: execution.stacktrace,
                template_info: execution.template_info,
            },
        );

        result
    }

    pub fn queries(&self) -> &[CapturedQuery] {
        &self.queries
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Finish the unit of work with arbitrary metadata
    pub fn into_blob(self, info: Map<String, Value>) -> LogBlob {
        LogBlob::new(info, self.queries)
    }

    /// Finish a web request capture
    pub fn into_request_blob(self, request: &RequestInfo) -> LogBlob {
        self.into_blob(request.to_info())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_records_in_order() {
        let mut recorder = QueryRecorder::new();

        let rows = recorder.track(
            Execution::new("default", "SELECT 1", "SELECT 1")
                .with_stacktrace(vec![StackFrame::new("jobs.py", 4, "run")]),
            || 1,
        );
        recorder.track(Execution::new("replica", "SELECT 2", "SELECT %s"), || ());

        assert_eq!(rows, 1);
        assert_eq!(recorder.len(), 2);
        assert_eq!(recorder.queries()[0].alias(), "default");
        assert_eq!(recorder.queries()[1].record().raw_sql, "SELECT %s");
        assert!(recorder.queries()[0].record().duration >= 0.0);
    }

    #[test]
    fn test_into_request_blob() {
        let mut recorder = QueryRecorder::new();
        recorder.track(Execution::new("default", "SELECT 1", "SELECT 1"), || ());

        let request = RequestInfo {
            sessionid: "abc".to_string(),
            view_name: "shop:index".to_string(),
            func_name: "index".to_string(),
            ..Default::default()
        };
        let blob = recorder.into_request_blob(&request);

        assert_eq!(blob.queries.len(), 1);
        assert_eq!(blob.info["sessionid"], "abc");
        assert_eq!(blob.info["func_name"], "index");
    }
}
