use crate::logfile::{list_logs, DebugLog};
use crate::utils::config::{DATA_DIRECTORY_ENV, SCHEMA_VERSION};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Validate a captured query log file
pub fn validate_log_file(file_path: PathBuf) -> Result<()> {
    println!("Validating query log: {}", file_path.display());

    let log = DebugLog::load(&file_path)
        .with_context(|| format!("Invalid query log {}", file_path.display()))?;

    let traceless = log.queries.iter().filter(|q| q.stacktrace().is_empty()).count();
    let malformed_templates = log.queries.iter().filter(|q| q.template().is_err()).count();

    println!("✓ Valid query log JSON");
    match log.request_info() {
        Some(request) => println!("  Request view: {}", request.view_name),
        None => println!("  Function capture (no request info)"),
    }
    println!("  Queries: {}", log.len());
    println!("  Without stack trace: {}", traceless);
    println!("  Malformed template info: {}", malformed_templates);

    Ok(())
}

/// List captured logs in a data directory
pub fn list_log_files(dir: Option<PathBuf>) -> Result<()> {
    let dir = dir.with_context(|| {
        format!("No data directory given (use --dir or set {})", DATA_DIRECTORY_ENV)
    })?;

    let entries = list_logs(&dir).with_context(|| format!("Cannot list {}", dir.display()))?;

    println!("Query logs in {}:", dir.display());
    if entries.is_empty() {
        println!("  (none)");
    }

    for entry in entries {
        let captured = entry
            .captured_at
            .map(|at| at.to_rfc3339())
            .unwrap_or_else(|| "unknown time".to_string());
        println!("  {:<32} {:<34} {}", entry.prefix, captured, file_name(&entry.path));
    }

    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Display schema information
pub fn display_schema(show_details: bool) {
    println!("Querylog Studio Log Schema");
    println!("Current Report Version: {}", SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Log Structure:");
        println!("  info: object             - Capture metadata (empty for function captures)");
        println!("    sessionid, url_name, app_name, view_name,");
        println!("    func_name, func_args, func_kwargs");
        println!("  queries: array           - Captured queries in execution order");
        println!("    [alias, record]        - Connection alias and execution record");
        println!("      sql: string          - Executed statement");
        println!("      raw_sql: string      - Parametrized statement");
        println!("      duration: number     - Execution time in seconds");
        println!("      stacktrace: array    - [file, lineno, function] frames, innermost last");
        println!("      template_info: object|null - {{name, context: [{{num, content, highlight}}]}}, {{}} or null");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
pub fn display_version() {
    println!("Querylog Studio v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Capture and analyze database query logs for duplicate, slow and template queries.");
}
