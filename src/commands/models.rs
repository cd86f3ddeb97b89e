use crate::flamegraph::FlamegraphConfig;
use crate::utils::config::{DEFAULT_REPORT_KEYS, DEFAULT_TOP_N};
use std::path::PathBuf;

/// Arguments for the analyze command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct AnalyzeArgs {
    /// Captured query log to analyze
    pub input: PathBuf,

    /// Grouping keys for frequency reports (field names or "query")
    pub keys: Vec<String>,

    /// Number of groups (and slow queries) per report
    pub top: usize,

    /// Output path for JSON report (optional)
    pub output_json: Option<PathBuf>,

    /// Output path for SVG flamegraph (optional)
    pub output_svg: Option<PathBuf>,

    /// Flamegraph configuration
    pub flamegraph_config: Option<FlamegraphConfig>,

    /// Print call stack table to stdout
    pub print_summary: bool,
}

impl Default for AnalyzeArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            keys: DEFAULT_REPORT_KEYS.iter().map(|key| key.to_string()).collect(),
            top: DEFAULT_TOP_N,
            output_json: None,
            output_svg: None,
            flamegraph_config: None,
            print_summary: false,
        }
    }
}
