//! Output writers for analysis reports and flamegraphs.
//!
//! This module handles writing data to disk in various formats:
//! - JSON analysis reports (pretty)
//! - SVG flamegraphs

pub mod json;
pub mod report;
pub mod svg;

// Re-export main functions
pub use json::{read_report, report_to_string, write_report};
pub use report::{to_report, AnalysisReport, GroupReport, ReportEntry, SlowQuery};
pub use svg::write_svg;

use crate::utils::error::OutputError;
use log::debug;
use std::path::Path;

/// Validate an output path and create its parent directories
fn prepare_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!("Cannot create directory {}: {}", parent.display(), e))
            })?;
        }
    }

    Ok(())
}
