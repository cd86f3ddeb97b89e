//! Analyze command implementation.
//!
//! The analyze command:
//! 1. Loads the captured query log
//! 2. Computes the summary and frequency reports
//! 3. Builds collapsed stacks and the flamegraph (if requested)
//! 4. Writes output files and prints the report

use super::models::AnalyzeArgs;
use crate::aggregator::{build_collapsed_stacks, total_weight, KeySpec};
use crate::flamegraph::{generate_flamegraph, generate_text_summary};
use crate::logfile::DebugLog;
use crate::output::{to_report, write_report, write_svg, AnalysisReport};
use crate::utils::config::MAX_TOP_N;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::time::Instant;

/// Execute the analyze command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Unreadable or corrupt log file
/// * Queries whose keys cannot be derived (empty stack trace, malformed template info)
/// * File write errors
pub fn execute_analyze(args: AnalyzeArgs) -> Result<AnalysisReport> {
    let start_time = Instant::now();

    info!("Analyzing query log: {}", args.input.display());

    // Step 1: Load log
    info!("Step 1/4: Loading query log...");
    let log = DebugLog::load(&args.input)
        .with_context(|| format!("Failed to load query log {}", args.input.display()))?;

    debug!("Loaded {} queries", log.len());

    // Step 2: Reports
    info!("Step 2/4: Computing reports...");
    let keys = parse_keys(&args.keys)?;
    let report = to_report(&log, &keys, args.top).context("Failed to compute query reports")?;
    info!("Summary: {}", report.summary.summary());

    // Step 3: Flamegraph (if requested)
    let needs_stacks = args.output_svg.is_some() || args.print_summary;
    let stacks = if needs_stacks && !log.is_empty() {
        info!("Step 3/4: Building call stacks...");
        Some(build_collapsed_stacks(&log.queries).context("Failed to build call stacks")?)
    } else {
        if needs_stacks {
            warn!("Query log is empty, no call stacks to draw");
        }
        info!("Step 3/4: Skipping call stacks");
        None
    };

    // Step 4: Write outputs
    info!("Step 4/4: Writing output files...");

    if let Some(path) = &args.output_json {
        write_report(&report, path).context("Failed to write report JSON")?;
        info!("✓ Report written to: {}", path.display());
    }

    if let (Some(svg_path), Some(stacks)) = (&args.output_svg, &stacks) {
        let svg = generate_flamegraph(stacks, args.flamegraph_config.as_ref())
            .context("Failed to generate flamegraph")?;
        write_svg(&svg, svg_path).context("Failed to write flamegraph SVG")?;
        info!("✓ Flamegraph written to: {}", svg_path.display());
    }

    print_report(&report);

    if let (true, Some(stacks)) = (args.print_summary, &stacks) {
        println!();
        println!("{}", generate_text_summary(stacks, args.top, total_weight(stacks)));
    }

    let elapsed = start_time.elapsed();
    info!("Analysis completed in {:.2}s", elapsed.as_secs_f64());

    Ok(report)
}

/// Validate analyze arguments
///
/// **Public** - can be called before execute_analyze for early validation
pub fn validate_args(args: &AnalyzeArgs) -> Result<()> {
    if args.input.as_os_str().is_empty() {
        anyhow::bail!("Input log path cannot be empty");
    }

    if !args.input.is_file() {
        anyhow::bail!("Input log not found: {}", args.input.display());
    }

    if args.top == 0 {
        anyhow::bail!("top must be greater than 0");
    }

    if args.top > MAX_TOP_N {
        anyhow::bail!("top is too large (max {})", MAX_TOP_N);
    }

    parse_keys(&args.keys)?;

    Ok(())
}

/// Parse grouping key names
pub fn parse_keys(names: &[String]) -> Result<Vec<KeySpec<'static>>> {
    names
        .iter()
        .map(|name| {
            name.parse::<KeySpec>()
                .with_context(|| format!("Invalid grouping key '{}'", name))
        })
        .collect()
}

fn print_report(report: &AnalysisReport) {
    println!("\n{}", "=".repeat(80));
    println!("QUERY LOG SUMMARY");
    println!("{}", "=".repeat(80));
    if let Some(source) = &report.source {
        println!("Log: {}", source);
    }
    for (label, value) in report.summary.entries() {
        println!("  {:<22} {}", label, value);
    }

    for group in &report.top {
        println!("\nMost frequent by {}:", group.key);
        for entry in &group.entries {
            println!(
                "  {:>5}x {:>10.3} ms  {}",
                entry.count,
                entry.duration * 1000.0,
                entry.key
            );
        }
    }

    if !report.slowest.is_empty() {
        println!("\nSlowest queries:");
        for query in &report.slowest {
            println!(
                "  {:>10.3} ms  {}  [{}]",
                query.duration_us as f64 / 1000.0,
                query.sql,
                query.codeline.as_deref().unwrap_or("unknown call site")
            );
        }
    }
    println!("{}", "=".repeat(80));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args_for(input: PathBuf) -> AnalyzeArgs {
        AnalyzeArgs {
            input,
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_args_valid() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(validate_args(&args_for(file.path().to_path_buf())).is_ok());
    }

    #[test]
    fn test_validate_args_empty_input() {
        assert!(validate_args(&args_for(PathBuf::new())).is_err());
    }

    #[test]
    fn test_validate_args_missing_input() {
        assert!(validate_args(&args_for(PathBuf::from("/nonexistent/log.json"))).is_err());
    }

    #[test]
    fn test_validate_args_top_zero() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let args = AnalyzeArgs {
            top: 0,
            ..args_for(file.path().to_path_buf())
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_top_too_large() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let args = AnalyzeArgs {
            top: 2000,
            ..args_for(file.path().to_path_buf())
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_unknown_key() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let args = AnalyzeArgs {
            keys: vec!["sql".to_string(), "colour".to_string()],
            ..args_for(file.path().to_path_buf())
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_parse_keys() {
        let keys = parse_keys(&["query".to_string(), "codeline".to_string()]).unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].label(), "query");
        assert_eq!(keys[1].label(), "codeline");
    }
}
