//! Writing captured units of work to the data directory.

use super::recorder::QueryRecorder;
use crate::logfile::listing::log_filename;
use crate::parser::schema::{LogBlob, RequestInfo};
use crate::utils::config::{DATA_DIRECTORY_ENV, UNKNOWN_PREFIX};
use crate::utils::error::CaptureError;
use chrono::Utc;
use log::{debug, info};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Where captured logs go
#[derive(Debug, Clone, Default)]
pub struct CaptureConfig {
    pub data_dir: Option<PathBuf>,
}

impl CaptureConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(data_dir.into()),
        }
    }

    /// Read the data directory from `QUERYLOG_DATA_DIRECTORY`
    pub fn from_env() -> Self {
        let data_dir = std::env::var_os(DATA_DIRECTORY_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        Self { data_dir }
    }
}

/// Write a captured unit of work to the data directory
///
/// The file is named `<prefix>.<timestamp>.json`. Without an explicit prefix
/// the request's view name is used, then `unknown`.
///
/// # Errors
/// * `CaptureError::NoDataDirectory` - no data directory configured
/// * `CaptureError::DirectoryUnavailable` - the directory cannot be created
/// * `CaptureError::Io` / `CaptureError::Serialization` - write failures
pub fn dump_queries(
    config: &CaptureConfig,
    blob: &LogBlob,
    prefix: Option<&str>,
) -> Result<PathBuf, CaptureError> {
    let data_dir = config.data_dir.as_deref().ok_or(CaptureError::NoDataDirectory)?;
    ensure_directory(data_dir)?;

    let prefix = resolve_prefix(prefix, &blob.info);
    let path = data_dir.join(log_filename(&prefix, Utc::now()));

    let file = File::create(&path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, blob)?;
    writer.flush()?;

    info!("Dumped {} queries to: {}", blob.queries.len(), path.display());

    Ok(path)
}

/// Run `work` with a fresh recorder and dump everything it recorded
///
/// Returns the result of `work` and the path of the written log.
pub fn log_queries<T>(
    config: &CaptureConfig,
    prefix: &str,
    work: impl FnOnce(&mut QueryRecorder) -> T,
) -> Result<(T, PathBuf), CaptureError> {
    let mut recorder = QueryRecorder::new();
    let result = work(&mut recorder);

    let blob = recorder.into_blob(Map::new());
    let path = dump_queries(config, &blob, Some(prefix))?;

    Ok((result, path))
}

fn resolve_prefix(prefix: Option<&str>, info: &Map<String, Value>) -> String {
    if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
        return prefix.to_string();
    }

    if !info.is_empty() {
        if let Ok(request) = serde_json::from_value::<RequestInfo>(Value::Object(info.clone())) {
            return request.filename_prefix();
        }
    }

    UNKNOWN_PREFIX.to_string()
}

fn ensure_directory(dir: &Path) -> Result<(), CaptureError> {
    if dir.is_dir() {
        return Ok(());
    }
    if dir.exists() {
        return Err(CaptureError::DirectoryUnavailable(format!(
            "Not a directory: {}",
            dir.display()
        )));
    }

    debug!("Creating data directory: {}", dir.display());
    std::fs::create_dir_all(dir).map_err(|e| {
        CaptureError::DirectoryUnavailable(format!("Cannot create directory {}: {}", dir.display(), e))
    })
}
