//! Loading persisted query logs.
//!
//! A log file holds one captured unit of work. Loading is all-or-nothing: a
//! blob that does not match the schema is rejected before any analysis runs.

use crate::aggregator::metrics::{summarize, Summary};
use crate::parser::query::Query;
use crate::parser::schema::{LogBlob, RequestInfo};
use crate::utils::error::LogError;
use log::{debug, warn};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// A loaded query log: capture metadata plus normalized queries
#[derive(Debug, Clone)]
pub struct DebugLog {
    /// Request/view metadata (empty for function captures)
    pub info: Map<String, Value>,

    /// Queries in capture order
    pub queries: Vec<Query>,

    source: Option<PathBuf>,
}

impl DebugLog {
    /// Load a log file from disk
    ///
    /// # Errors
    /// * `LogError::Io` - the file cannot be read
    /// * `LogError::CorruptLog` - the content does not match the log schema
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LogError> {
        let path = path.as_ref();
        debug!("Loading query log from: {}", path.display());

        let file = File::open(path)?;
        let mut log = Self::from_reader(BufReader::new(file))?;
        log.source = Some(path.to_path_buf());

        Ok(log)
    }

    /// Load a log from any reader
    pub fn from_reader(reader: impl Read) -> Result<Self, LogError> {
        let blob: LogBlob = serde_json::from_reader(reader).map_err(|e| {
            if e.is_io() {
                LogError::Io(e.into())
            } else {
                LogError::CorruptLog(e.to_string())
            }
        })?;

        Ok(Self::from_blob(blob))
    }

    /// Load a log from a JSON string
    pub fn from_json(content: &str) -> Result<Self, LogError> {
        Self::from_reader(content.as_bytes())
    }

    /// Wrap every captured query, keeping capture order
    pub fn from_blob(blob: LogBlob) -> Self {
        let queries: Vec<Query> = blob.queries.into_iter().map(Query::new).collect();

        let traceless = queries.iter().filter(|q| q.stacktrace().is_empty()).count();
        if traceless > 0 {
            warn!("{} captured queries have no stack trace", traceless);
        }
        debug!("Loaded {} queries", queries.len());

        Self {
            info: blob.info,
            queries,
            source: None,
        }
    }

    /// File the log was loaded from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Typed request metadata, when the log was captured from a web request
    pub fn request_info(&self) -> Option<RequestInfo> {
        if self.info.is_empty() {
            return None;
        }
        serde_json::from_value(Value::Object(self.info.clone())).ok()
    }

    pub fn summary(&self) -> Summary {
        summarize(&self.queries)
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}
