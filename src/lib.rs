//! Querylog Studio
//!
//! Capture the database queries executed during a unit of work, persist
//! them, and analyze the captured log for duplicate, slow and
//! template-triggered queries.
//!
//! This crate provides the core implementation for the
//! `querylog` CLI tool.
//!
//! ## Getting Started
//!
//! ```bash
//! querylog analyze -f logs/shop__index.1700000000123456.json --by rawsql_display
//! querylog --help
//! ```
//!
//! As a library, load a log and aggregate it:
//!
//! ```ignore
//! use querylog_studio::aggregator::{top_by_frequency, KeySpec, QueryField};
//! use querylog_studio::logfile::DebugLog;
//!
//! let log = DebugLog::load("shop__index.1700000000123456.json")?;
//! let summary = log.summary();
//! let hot = top_by_frequency(&log.queries, &KeySpec::field(QueryField::Codeline), 10)?;
//! ```

pub mod aggregator;
pub mod capture;
pub mod commands;
pub mod flamegraph;
pub mod logfile;
pub mod output;
pub mod parser;
pub mod utils;
