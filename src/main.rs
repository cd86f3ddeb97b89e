//! Querylog Studio CLI
//!
//! Analyzes captured database query logs.
//! Prints summaries and writes JSON reports and query-time flamegraphs.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use querylog_studio::commands::{
    display_schema, display_version, execute_analyze, list_log_files, validate_args,
    validate_log_file, AnalyzeArgs,
};
use querylog_studio::flamegraph::FlamegraphConfig;
use querylog_studio::utils::config::{DATA_DIRECTORY_ENV, DEFAULT_REPORT_KEYS, DEFAULT_TOP_N};

/// Querylog Studio - database query log analysis
#[derive(Parser, Debug)]
#[command(name = "querylog")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze a captured query log
    Analyze {
        /// Path to the captured query log
        #[arg(short, long)]
        file: PathBuf,

        /// Grouping key for frequency reports (repeatable): file, function,
        /// codeline, template, is_from_template, sql, rawsql, sql_display,
        /// rawsql_display, duration or query
        #[arg(short, long = "by")]
        by: Vec<String>,

        /// Number of groups and slow queries to report
        #[arg(long, default_value_t = DEFAULT_TOP_N)]
        top: usize,

        /// Output path for JSON report (optional)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output path for SVG flamegraph (optional)
        #[arg(long)]
        flamegraph: Option<PathBuf>,

        /// Flamegraph title
        #[arg(long)]
        title: Option<String>,

        /// Flamegraph width in pixels
        #[arg(long, default_value = "1200")]
        width: usize,

        /// Print call stack table to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Validate a captured query log
    Validate {
        /// Path to the captured query log
        #[arg(short, long)]
        file: PathBuf,
    },

    /// List captured query logs in the data directory
    List {
        /// Data directory holding captured logs
        #[arg(short, long, env = DATA_DIRECTORY_ENV)]
        dir: Option<PathBuf>,
    },

    /// Display log schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Analyze {
            file,
            by,
            top,
            output,
            flamegraph,
            title,
            width,
            summary,
        } => {
            let fg_config = flamegraph.as_ref().map(|_| {
                let config = FlamegraphConfig::new().with_width(width);
                match title {
                    Some(title) => config.with_title(title),
                    None => config,
                }
            });

            let keys = if by.is_empty() {
                DEFAULT_REPORT_KEYS.iter().map(|key| key.to_string()).collect()
            } else {
                by
            };

            let args = AnalyzeArgs {
                input: file,
                keys,
                top,
                output_json: output,
                output_svg: flamegraph,
                flamegraph_config: fg_config,
                print_summary: summary,
            };

            validate_args(&args)?;
            execute_analyze(args)?;
        }

        Commands::Validate { file } => {
            validate_log_file(file)?;
        }

        Commands::List { dir } => {
            list_log_files(dir)?;
        }

        Commands::Schema { show } => {
            display_schema(show);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
