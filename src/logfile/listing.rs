//! Discovery of captured logs in a data directory.
//!
//! Captured logs are named `<prefix>.<timestamp>.json`, where the timestamp is
//! the capture time in microseconds since the epoch written without a dot.

use crate::utils::config::LOG_FILE_EXTENSION;
use crate::utils::error::LogError;
use chrono::{DateTime, Utc};
use log::debug;
use std::path::{Path, PathBuf};

const STAMP_SECONDS_DIGITS: usize = 10;
const STAMP_MICROS_DIGITS: usize = 6;

/// A captured log found on disk
#[derive(Debug, Clone, PartialEq)]
pub struct LogFileEntry {
    pub path: PathBuf,
    pub prefix: String,
    pub captured_at: Option<DateTime<Utc>>,
}

/// Build the file name for a capture taken at `at`
pub fn log_filename(prefix: &str, at: DateTime<Utc>) -> String {
    format!(
        "{}.{}{:06}.{}",
        prefix,
        at.timestamp(),
        at.timestamp_subsec_micros(),
        LOG_FILE_EXTENSION
    )
}

/// Split a log file name into its prefix and capture time
///
/// Returns `None` for names that do not follow the capture convention.
pub fn parse_log_filename(name: &str) -> Option<(String, Option<DateTime<Utc>>)> {
    let stem = name.strip_suffix(LOG_FILE_EXTENSION)?.strip_suffix('.')?;
    let (prefix, stamp) = stem.rsplit_once('.')?;

    if prefix.is_empty() || stamp.is_empty() || !stamp.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    Some((prefix.to_string(), parse_stamp(stamp)))
}

// Only stamps written by `log_filename` are decoded: ten digits of seconds
// followed by six of microseconds. Other digit counts cannot be split back
// into seconds and fraction, so they get no capture time.
fn parse_stamp(stamp: &str) -> Option<DateTime<Utc>> {
    if stamp.len() != STAMP_SECONDS_DIGITS + STAMP_MICROS_DIGITS {
        return None;
    }
    let (secs, micros) = stamp.split_at(STAMP_SECONDS_DIGITS);
    let secs: i64 = secs.parse().ok()?;
    let micros: u32 = micros.parse().ok()?;
    DateTime::<Utc>::from_timestamp(secs, micros * 1_000)
}

/// List captured logs in `dir`, oldest first
///
/// Files that do not follow the naming convention are skipped.
pub fn list_logs(dir: impl AsRef<Path>) -> Result<Vec<LogFileEntry>, LogError> {
    let dir = dir.as_ref();
    debug!("Listing query logs in: {}", dir.display());

    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }

        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        if let Some((prefix, captured_at)) = parse_log_filename(name) {
            entries.push(LogFileEntry {
                path: path.clone(),
                prefix,
                captured_at,
            });
        }
    }

    entries.sort_by(|a, b| a.captured_at.cmp(&b.captured_at).then_with(|| a.path.cmp(&b.path)));

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_log_filename() {
        let at = Utc.timestamp_opt(1_700_000_000, 123_456_000).unwrap();
        assert_eq!(log_filename("shop__index", at), "shop__index.1700000000123456.json");
    }

    #[test]
    fn test_parse_log_filename() {
        let (prefix, at) = parse_log_filename("shop__index.1700000000123456.json").unwrap();
        assert_eq!(prefix, "shop__index");
        assert_eq!(at, Some(Utc.timestamp_opt(1_700_000_000, 123_456_000).unwrap()));
    }

    #[test]
    fn test_parse_log_filename_rejects_other_files() {
        assert!(parse_log_filename("notes.txt").is_none());
        assert!(parse_log_filename("report.json").is_none());
        assert!(parse_log_filename("x.12ab.json").is_none());
    }

    #[test]
    fn test_prefix_may_contain_dots() {
        let (prefix, _) = parse_log_filename("my.command.1700000000000001.json").unwrap();
        assert_eq!(prefix, "my.command");
    }

    #[test]
    fn test_unsupported_stamp_length_has_no_capture_time() {
        // five fractional digits
        let (prefix, at) = parse_log_filename("job.170000000012345.json").unwrap();
        assert_eq!(prefix, "job");
        assert_eq!(at, None);

        let (_, at) = parse_log_filename("job.17000000001234567.json").unwrap();
        assert_eq!(at, None);
    }
}
