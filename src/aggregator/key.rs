//! Grouping key resolution.
//!
//! Every aggregation entry point takes a [`KeySpec`] and resolves it once into
//! a key function, so callers can group by a stored field, a derived property,
//! or the record itself through one interface.

use crate::parser::query::{Codeline, FunctionInfo, Query, TemplateLine};
use crate::utils::error::QueryError;
use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// A duration in seconds, usable as a key
///
/// Compares and hashes on the exact bit pattern, like [`Query`] does.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(transparent)]
pub struct Seconds(pub f64);

impl PartialEq for Seconds {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Seconds {}

impl Hash for Seconds {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl fmt::Display for Seconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// A grouping key produced from a query
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum QueryKey {
    Text(String),
    Function(FunctionInfo),
    Codeline(Codeline),
    Template(Option<TemplateLine>),
    Flag(bool),
    Seconds(Seconds),
    Record(Box<Query>),
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::Text(text) => f.write_str(text),
            QueryKey::Function(function) => write!(f, "{}", function),
            QueryKey::Codeline(codeline) => write!(f, "{}", codeline),
            QueryKey::Template(Some(line)) => write!(f, "{}", line),
            QueryKey::Template(None) => f.write_str("(no template)"),
            QueryKey::Flag(flag) => write!(f, "{}", flag),
            QueryKey::Seconds(seconds) => write!(f, "{}", seconds),
            QueryKey::Record(query) => match query.codeline() {
                Ok(codeline) => write!(f, "{} [{}, {}s]", query.sql(), codeline, query.duration()),
                Err(_) => write!(f, "{} [no call site, {}s]", query.sql(), query.duration()),
            },
        }
    }
}

impl From<&str> for QueryKey {
    fn from(text: &str) -> Self {
        QueryKey::Text(text.to_string())
    }
}

impl From<String> for QueryKey {
    fn from(text: String) -> Self {
        QueryKey::Text(text)
    }
}

/// Named accessors of [`Query`] usable as grouping keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryField {
    File,
    Function,
    Codeline,
    Template,
    IsFromTemplate,
    Sql,
    RawSql,
    SqlDisplay,
    RawSqlDisplay,
    Duration,
}

impl QueryField {
    pub const ALL: [QueryField; 10] = [
        QueryField::File,
        QueryField::Function,
        QueryField::Codeline,
        QueryField::Template,
        QueryField::IsFromTemplate,
        QueryField::Sql,
        QueryField::RawSql,
        QueryField::SqlDisplay,
        QueryField::RawSqlDisplay,
        QueryField::Duration,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            QueryField::File => "file",
            QueryField::Function => "function",
            QueryField::Codeline => "codeline",
            QueryField::Template => "template",
            QueryField::IsFromTemplate => "is_from_template",
            QueryField::Sql => "sql",
            QueryField::RawSql => "rawsql",
            QueryField::SqlDisplay => "sql_display",
            QueryField::RawSqlDisplay => "rawsql_display",
            QueryField::Duration => "duration",
        }
    }

    /// Read this field off a query
    pub fn read(&self, query: &Query) -> Result<QueryKey, QueryError> {
        let key = match self {
            QueryField::File => QueryKey::Text(query.file()?.to_string()),
            QueryField::Function => QueryKey::Function(query.function()?),
            QueryField::Codeline => QueryKey::Codeline(query.codeline()?),
            QueryField::Template => QueryKey::Template(query.template()?),
            QueryField::IsFromTemplate => QueryKey::Flag(query.is_from_template()),
            QueryField::Sql => QueryKey::Text(query.sql().to_string()),
            QueryField::RawSql => QueryKey::Text(query.rawsql().to_string()),
            QueryField::SqlDisplay => QueryKey::Text(query.sql_display()),
            QueryField::RawSqlDisplay => QueryKey::Text(query.rawsql_display()),
            QueryField::Duration => QueryKey::Seconds(Seconds(query.duration())),
        };
        Ok(key)
    }
}

impl FromStr for QueryField {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QueryField::ALL
            .iter()
            .copied()
            .find(|field| field.name() == s)
            .ok_or_else(|| QueryError::UnknownField(s.to_string()))
    }
}

impl fmt::Display for QueryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A resolved key function
pub type KeyFn<'a> = Box<dyn Fn(&Query) -> Result<QueryKey, QueryError> + 'a>;

/// How to derive a grouping key from a query
pub enum KeySpec<'a> {
    /// The record itself is the key
    Identity,
    /// A named accessor
    Field(QueryField),
    /// An arbitrary derived property
    Function(KeyFn<'a>),
}

impl<'a> KeySpec<'a> {
    pub fn field(field: QueryField) -> Self {
        KeySpec::Field(field)
    }

    pub fn function<F>(func: F) -> Self
    where
        F: Fn(&Query) -> Result<QueryKey, QueryError> + 'a,
    {
        KeySpec::Function(Box::new(func))
    }

    /// Turn the spec into a key function
    pub fn resolve(&self) -> KeyFn<'_> {
        match self {
            KeySpec::Identity => Box::new(|query: &Query| Ok(QueryKey::Record(Box::new(query.clone())))),
            KeySpec::Field(field) => {
                let field = *field;
                Box::new(move |query: &Query| field.read(query))
            }
            KeySpec::Function(func) => Box::new(move |query: &Query| func(query)),
        }
    }

    /// Short label used in reports
    pub fn label(&self) -> String {
        match self {
            KeySpec::Identity => "query".to_string(),
            KeySpec::Field(field) => field.name().to_string(),
            KeySpec::Function(_) => "custom".to_string(),
        }
    }
}

/// Free-function form of [`KeySpec::resolve`]
pub fn resolve_key<'s>(spec: &'s KeySpec<'_>) -> KeyFn<'s> {
    spec.resolve()
}

impl From<QueryField> for KeySpec<'_> {
    fn from(field: QueryField) -> Self {
        KeySpec::Field(field)
    }
}

impl FromStr for KeySpec<'static> {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "query" | "identity" => Ok(KeySpec::Identity),
            other => other.parse::<QueryField>().map(KeySpec::Field),
        }
    }
}

impl fmt::Debug for KeySpec<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySpec::Identity => f.write_str("Identity"),
            KeySpec::Field(field) => f.debug_tuple("Field").field(field).finish(),
            KeySpec::Function(_) => f.write_str("Function(..)"),
        }
    }
}
