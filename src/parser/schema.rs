//! Persisted query log schema definitions.
//!
//! This module defines the structure of the JSON blobs the capture layer
//! writes to disk and the log container reads back. Field names follow the
//! on-disk format, not Rust conventions, where the two differ.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Top-level persisted unit: metadata plus the raw captured queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogBlob {
    /// Request/view metadata, empty for plain function captures
    pub info: Map<String, Value>,

    /// Captured queries in execution order
    pub queries: Vec<CapturedQuery>,
}

impl LogBlob {
    pub fn new(info: Map<String, Value>, queries: Vec<CapturedQuery>) -> Self {
        Self { info, queries }
    }
}

/// One captured statement: `[alias, record]` on disk
///
/// The alias names the database connection the statement ran on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedQuery(pub String, pub QueryRecord);

impl CapturedQuery {
    pub fn new(alias: impl Into<String>, record: QueryRecord) -> Self {
        Self(alias.into(), record)
    }

    pub fn alias(&self) -> &str {
        &self.0
    }

    pub fn record(&self) -> &QueryRecord {
        &self.1
    }
}

/// Execution metadata recorded for a single statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRecord {
    /// Executed statement with parameters substituted
    pub sql: String,

    /// Parametrized statement as sent to the driver
    pub raw_sql: String,

    /// Execution time in seconds
    pub duration: f64,

    /// Call stack at execution time, innermost frame last
    pub stacktrace: Vec<StackFrame>,

    /// Template line that triggered the query, if any
    ///
    /// The key is always written; `null` means no template was involved.
    #[serde(deserialize_with = "deserialize_template_info")]
    pub template_info: Option<TemplateInfo>,
}

// `{}` stands for "no template info"; any other object must be complete
fn deserialize_template_info<'de, D>(deserializer: D) -> Result<Option<TemplateInfo>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(map) = Option::<Map<String, Value>>::deserialize(deserializer)? else {
        return Ok(None);
    };

    if map.is_empty() {
        return Ok(Some(TemplateInfo::default()));
    }

    serde_json::from_value(Value::Object(map))
        .map(Some)
        .map_err(de::Error::custom)
}

/// A stack frame: `[file, lineno, function]` on disk
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StackFrame(pub String, pub u32, pub String);

impl StackFrame {
    pub fn new(file: impl Into<String>, lineno: u32, function: impl Into<String>) -> Self {
        Self(file.into(), lineno, function.into())
    }

    pub fn file(&self) -> &str {
        &self.0
    }

    pub fn lineno(&self) -> u32 {
        self.1
    }

    pub fn function(&self) -> &str {
        &self.2
    }
}

/// Template rendering context attached to a query
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateInfo {
    pub name: String,
    pub context: Vec<ContextLine>,
}

impl TemplateInfo {
    /// An empty mapping carries no template information at all
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.context.is_empty()
    }
}

/// One line of template source around the triggering line
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextLine {
    pub num: u32,
    pub content: String,
    pub highlight: bool,
}

/// Request metadata stored in `info` for web request captures
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestInfo {
    pub sessionid: String,
    pub url_name: Option<String>,
    pub app_name: Option<String>,
    pub view_name: String,
    pub func_name: String,
    #[serde(default)]
    pub func_args: Vec<Value>,
    #[serde(default)]
    pub func_kwargs: Map<String, Value>,
}

impl RequestInfo {
    /// Filename prefix derived from the view name (`app:view` -> `app__view`)
    pub fn filename_prefix(&self) -> String {
        self.view_name.replace(':', "__")
    }

    /// Convert into the untyped `info` mapping stored in a blob
    pub fn to_info(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}
