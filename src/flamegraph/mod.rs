//! Flamegraph generation.
//!
//! This module converts collapsed query stacks into SVG flamegraphs and text
//! summaries showing where query time is spent.

pub mod generator;

// Re-export main types
pub use generator::{generate_flamegraph, generate_text_summary, FlamegraphConfig};
