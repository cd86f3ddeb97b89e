//! Normalized, read-only view over one captured query.
//!
//! Every accessor is derived on demand from the raw record; nothing is cached
//! and nothing is ever mutated after construction.

use super::sanitize::sanitize;
use super::schema::{CapturedQuery, QueryRecord, StackFrame};
use crate::utils::error::QueryError;
use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Source file and function of the innermost call site
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FunctionInfo {
    pub file: String,
    pub function: String,
}

impl fmt::Display for FunctionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.function, self.file)
    }
}

/// Exact line of the innermost call site
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Codeline {
    pub file: String,
    pub function: String,
    pub lineno: u32,
}

impl fmt::Display for Codeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} in {}", self.file, self.lineno, self.function)
    }
}

/// Highlighted template line that triggered a query
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TemplateLine {
    pub template: String,
    pub lineno: u32,
    pub text: String,
}

impl fmt::Display for TemplateLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} {}", self.template, self.lineno, self.text)
    }
}

/// A captured query with typed, derived accessors
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct Query {
    captured: CapturedQuery,
}

impl Query {
    pub fn new(captured: CapturedQuery) -> Self {
        Self { captured }
    }

    pub fn alias(&self) -> &str {
        self.captured.alias()
    }

    pub fn record(&self) -> &QueryRecord {
        self.captured.record()
    }

    pub fn captured(&self) -> &CapturedQuery {
        &self.captured
    }

    pub fn stacktrace(&self) -> &[StackFrame] {
        &self.record().stacktrace
    }

    // file, function and lineno must all come from this one frame
    fn innermost_frame(&self) -> Result<&StackFrame, QueryError> {
        self.stacktrace().last().ok_or(QueryError::EmptyTrace)
    }

    pub fn file(&self) -> Result<&str, QueryError> {
        Ok(self.innermost_frame()?.file())
    }

    pub fn function(&self) -> Result<FunctionInfo, QueryError> {
        let frame = self.innermost_frame()?;
        Ok(FunctionInfo {
            file: frame.file().to_string(),
            function: frame.function().to_string(),
        })
    }

    pub fn codeline(&self) -> Result<Codeline, QueryError> {
        let frame = self.innermost_frame()?;
        Ok(Codeline {
            file: frame.file().to_string(),
            function: frame.function().to_string(),
            lineno: frame.lineno(),
        })
    }

    /// Template line responsible for this query
    ///
    /// `Ok(None)` when the query was not issued from a template. Template info
    /// without a highlighted context line is rejected rather than guessed.
    pub fn template(&self) -> Result<Option<TemplateLine>, QueryError> {
        let info = match &self.record().template_info {
            Some(info) if !info.is_empty() => info,
            _ => return Ok(None),
        };

        let line = info
            .context
            .iter()
            .find(|line| line.highlight)
            .ok_or_else(|| QueryError::MalformedTemplateInfo {
                template: info.name.clone(),
            })?;

        Ok(Some(TemplateLine {
            template: info.name.clone(),
            lineno: line.num,
            text: line.content.trim_start_matches([' ', '\t']).to_string(),
        }))
    }

    pub fn is_from_template(&self) -> bool {
        self.record()
            .template_info
            .as_ref()
            .is_some_and(|info| !info.is_empty())
    }

    pub fn sql(&self) -> &str {
        &self.record().sql
    }

    pub fn rawsql(&self) -> &str {
        &self.record().raw_sql
    }

    pub fn sql_display(&self) -> String {
        sanitize(self.sql())
    }

    pub fn rawsql_display(&self) -> String {
        sanitize(self.rawsql())
    }

    /// Execution time in seconds
    pub fn duration(&self) -> f64 {
        self.record().duration
    }
}

impl From<CapturedQuery> for Query {
    fn from(captured: CapturedQuery) -> Self {
        Self::new(captured)
    }
}

// Durations compare by bit pattern so that Eq and Hash stay consistent
impl PartialEq for Query {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (self.record(), other.record());
        self.alias() == other.alias()
            && a.sql == b.sql
            && a.raw_sql == b.raw_sql
            && a.duration.to_bits() == b.duration.to_bits()
            && a.stacktrace == b.stacktrace
            && a.template_info == b.template_info
    }
}

impl Eq for Query {}

impl Hash for Query {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let record = self.record();
        self.alias().hash(state);
        record.sql.hash(state);
        record.raw_sql.hash(state);
        record.duration.to_bits().hash(state);
        record.stacktrace.hash(state);
        record.template_info.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::schema::{ContextLine, TemplateInfo};

    fn query_with(stacktrace: Vec<StackFrame>, template_info: Option<TemplateInfo>) -> Query {
        Query::new(CapturedQuery::new(
            "default",
            QueryRecord {
                sql: "SELECT id, title FROM book WHERE id = 7".to_string(),
                raw_sql: "SELECT id, title FROM book WHERE id = %s".to_string(),
                duration: 0.004,
                stacktrace,
                template_info,
            },
        ))
    }

    fn frames() -> Vec<StackFrame> {
        vec![
            StackFrame::new("app/urls.py", 3, "dispatch"),
            StackFrame::new("app/views.py", 42, "book_detail"),
        ]
    }

    #[test]
    fn test_call_site_uses_innermost_frame() {
        let query = query_with(frames(), None);

        assert_eq!(query.file().unwrap(), "app/views.py");

        let function = query.function().unwrap();
        let codeline = query.codeline().unwrap();
        assert_eq!(function.function, "book_detail");
        assert_eq!(codeline.file, function.file);
        assert_eq!(codeline.function, function.function);
        assert_eq!(codeline.lineno, 42);
    }

    #[test]
    fn test_empty_trace_is_an_error() {
        let query = query_with(Vec::new(), None);

        assert_eq!(query.file(), Err(QueryError::EmptyTrace));
        assert_eq!(query.function(), Err(QueryError::EmptyTrace));
        assert_eq!(query.codeline(), Err(QueryError::EmptyTrace));
        // The rest of the record stays usable
        assert_eq!(query.duration(), 0.004);
        assert_eq!(query.template(), Ok(None));
    }

    #[test]
    fn test_template_picks_first_highlighted_line() {
        let info = TemplateInfo {
            name: "books/detail.html".to_string(),
            context: vec![
                ContextLine { num: 9, content: "<ul>".to_string(), highlight: false },
                ContextLine { num: 10, content: "\t  {% for a in book.authors.all %}".to_string(), highlight: true },
                ContextLine { num: 11, content: "{{ a }}".to_string(), highlight: true },
            ],
        };
        let query = query_with(frames(), Some(info));

        assert!(query.is_from_template());
        let line = query.template().unwrap().unwrap();
        assert_eq!(line.template, "books/detail.html");
        assert_eq!(line.lineno, 10);
        assert_eq!(line.text, "{% for a in book.authors.all %}");
    }

    #[test]
    fn test_template_without_highlight_is_malformed() {
        let info = TemplateInfo {
            name: "base.html".to_string(),
            context: vec![ContextLine { num: 1, content: "x".to_string(), highlight: false }],
        };
        let query = query_with(frames(), Some(info));

        assert!(query.is_from_template());
        assert_eq!(
            query.template(),
            Err(QueryError::MalformedTemplateInfo { template: "base.html".to_string() })
        );
        assert!(query.codeline().is_ok());
    }

    #[test]
    fn test_empty_template_info_is_not_from_template() {
        let query = query_with(frames(), Some(TemplateInfo::default()));
        assert!(!query.is_from_template());
        assert_eq!(query.template(), Ok(None));
    }

    #[test]
    fn test_display_sql() {
        let query = query_with(frames(), None);
        assert_eq!(query.sql_display(), "SELECT .. FROM book WHERE id = 7");
        assert_eq!(query.rawsql_display(), "SELECT .. FROM book WHERE id = %s");
    }
}
