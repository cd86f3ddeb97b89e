//! SVG flamegraph generation for query time.
//!
//! A small hand-written renderer instead of a flamegraph crate, so that:
//! - SQL leaves are coloured by statement kind (reads vs writes)
//! - Template frames stand out from application frames
//! - The layout is inverted (root at the bottom)

use crate::aggregator::stack_builder::CollapsedStack;
use crate::utils::error::FlamegraphError;
use log::info;
use std::collections::HashMap;

/// Flamegraph configuration
#[derive(Debug, Clone)]
pub struct FlamegraphConfig {
    pub title: String,
    pub width: usize,
}

impl Default for FlamegraphConfig {
    fn default() -> Self {
        Self {
            title: "Query Time Profile".to_string(),
            width: 1200,
        }
    }
}

impl FlamegraphConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }
}

/// Internal Node structure for building the tree
struct Node {
    name: String,
    value: u64,
    children: HashMap<String, Node>,
}

impl Node {
    fn new(name: String) -> Self {
        Self {
            name,
            value: 0,
            children: HashMap::new(),
        }
    }

    fn insert(&mut self, stack: &[&str], value: u64) {
        self.value += value;
        if let Some((head, tail)) = stack.split_first() {
            let child = self
                .children
                .entry(head.to_string())
                .or_insert_with(|| Node::new(head.to_string()));
            child.insert(tail, value);
        }
    }
}

/// Generate SVG flamegraph from collapsed stacks
///
/// # Errors
/// * `FlamegraphError::EmptyStacks` - nothing to draw
pub fn generate_flamegraph(
    stacks: &[CollapsedStack],
    config: Option<&FlamegraphConfig>,
) -> Result<String, FlamegraphError> {
    if stacks.is_empty() {
        return Err(FlamegraphError::EmptyStacks);
    }

    let config = config.cloned().unwrap_or_default();
    info!("Generating flamegraph with {} stacks", stacks.len());

    // 1. Build Tree
    let mut root = Node::new("all queries".to_string());
    for stack in stacks {
        let stack_parts: Vec<&str> = stack.stack.split(';').collect();
        root.insert(&stack_parts, stack.weight);
    }

    let max_depth = calculate_max_depth(&root);

    // 2. Render SVG
    let mut svg_content = String::new();
    let width = config.width;
    let height_per_level = 20;
    let graph_height = (max_depth + 1) * height_per_level;
    let legend_height = 80;
    let total_height = graph_height + legend_height;

    svg_content.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
        width, total_height, width, total_height
    ));

    svg_content.push_str(
        r#"<style>.func { font: 12px sans-serif; } .func:hover { stroke: black; stroke-width: 1; cursor: pointer; opacity: 0.9; }</style>"#
    );

    svg_content.push_str(&format!(
        r#"<text x="{}" y="20" font-size="16" text-anchor="middle" font-weight="bold">{}</text>"#,
        width / 2,
        escape_xml(&config.title)
    ));

    // Inverted: root at bottom
    render_node(
        &root,
        0,
        0.0,
        width as f64,
        &mut svg_content,
        height_per_level,
        graph_height,
    );

    render_legend(&mut svg_content, graph_height);

    svg_content.push_str("</svg>");

    info!("Flamegraph generated successfully ({} bytes)", svg_content.len());
    Ok(svg_content)
}

fn calculate_max_depth(node: &Node) -> usize {
    if node.children.is_empty() {
        return 0;
    }
    let max_child_depth = node
        .children
        .values()
        .map(calculate_max_depth)
        .max()
        .unwrap_or(0);
    max_child_depth + 1
}

/// Kind of flamegraph frame, derived from its label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Root,
    Read,
    Write,
    Template,
    Code,
}

fn classify(name: &str) -> FrameKind {
    let upper = name.trim_start().to_ascii_uppercase();
    if name == "all queries" {
        FrameKind::Root
    } else if name.starts_with('{') && name.ends_with('}') {
        FrameKind::Template
    } else if upper.starts_with("SELECT") || upper.starts_with("WITH") {
        FrameKind::Read
    } else if ["INSERT", "UPDATE", "DELETE", "REPLACE", "CREATE", "DROP", "ALTER", "TRUNCATE"]
        .iter()
        .any(|kw| upper.starts_with(kw))
    {
        FrameKind::Write
    } else {
        FrameKind::Code
    }
}

fn get_node_color(name: &str) -> &'static str {
    match classify(name) {
        FrameKind::Write => "rgb(220, 20, 60)",    // Crimson
        FrameKind::Read => "rgb(255, 140, 0)",     // Dark Orange
        FrameKind::Template => "rgb(138, 43, 226)", // Blue Violet
        FrameKind::Root => "rgb(100, 149, 237)",   // Cornflower Blue
        FrameKind::Code => "rgb(70, 130, 180)",    // Steel Blue
    }
}

fn get_ansi_color(name: &str) -> &'static str {
    match classify(name) {
        FrameKind::Write => "\x1b[31;1m",
        FrameKind::Read => "\x1b[33m",
        FrameKind::Template => "\x1b[35m",
        FrameKind::Root => "\x1b[36m",
        FrameKind::Code => "\x1b[34m",
    }
}

fn render_node(
    node: &Node,
    level: usize,
    x: f64,
    w: f64,
    out: &mut String,
    h: usize,
    graph_height: usize,
) {
    if w < 0.5 || node.value == 0 {
        return;
    }

    let color = get_node_color(&node.name);

    // Graph bottom minus level height, plus 30px title margin
    let y = graph_height - ((level + 1) * h) + 30;

    let name = escape_xml(&node.name);
    out.push_str(&format!(
        r#"<rect x="{:.2}" y="{}" width="{:.2}" height="{}" fill="{}" class="func"><title>{} ({:.3} ms)</title></rect>"#,
        x,
        y,
        w,
        h,
        color,
        name,
        node.value as f64 / 1000.0
    ));

    if w > 35.0 {
        let char_width = 7.0;
        let max_chars = (w / char_width) as usize;
        let display_name = truncate_end(&node.name, max_chars);

        if !display_name.is_empty() {
            out.push_str(&format!(
                r#"<text x="{:.2}" y="{}" dx="4" dy="14" font-size="12" fill="white" pointer-events="none">{}</text>"#,
                x,
                y,
                escape_xml(&display_name)
            ));
        }
    }

    let mut current_x = x;
    let mut children_vec: Vec<&Node> = node.children.values().collect();
    // Widest first, then by name so output is deterministic
    children_vec.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.name.cmp(&b.name)));

    for child in children_vec {
        let child_w = (child.value as f64 / node.value as f64) * w;
        render_node(child, level + 1, current_x, child_w, out, h, graph_height);
        current_x += child_w;
    }
}

fn render_legend(out: &mut String, graph_height: usize) {
    let legend_y = graph_height + 50;

    out.push_str(&format!(
        r#"<text x="10" y="{}" font-size="14" font-weight="bold">Legend:</text>"#,
        legend_y
    ));

    let items = [
        ("Write", "rgb(220, 20, 60)"),
        ("Read", "rgb(255, 140, 0)"),
        ("Template", "rgb(138, 43, 226)"),
        ("Code", "rgb(70, 130, 180)"),
    ];

    for (i, (label, color)) in items.iter().enumerate() {
        let x = 80 + (i * 120);
        out.push_str(&format!(
            r#"<rect x="{}" y="{}" width="15" height="15" fill="{}" rx="2"/>"#,
            x,
            legend_y - 12,
            color
        ));
        out.push_str(&format!(
            r#"<text x="{}" y="{}" font-size="12">{}</text>"#,
            x + 20,
            legend_y,
            label
        ));
    }
}

/// Create a text summary table of the heaviest stacks
///
/// `total_micros` is the query time the percentages are relative to.
pub fn generate_text_summary(stacks: &[CollapsedStack], max_lines: usize, total_micros: u64) -> String {
    let mut lines = Vec::new();

    lines.push("  QUERY HOT PATHS".to_string());
    lines.push("  ┏━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┳━━━━━━━━━━━━━━┳━━━━━━━━━┓".to_string());
    lines.push(format!("  ┃ {:<58} ┃ {:^12} ┃ {:^7} ┃", "Call Stack (Slowest First)", "ms", "%"));
    lines.push("  ┣━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━╋━━━━━━━━━━━━━━╋━━━━━━━━━┫".to_string());

    let total = total_micros.max(1);
    let reset = "\x1b[0m";

    for stack in stacks.iter().take(max_lines) {
        let millis = stack.weight as f64 / 1000.0;
        let percentage = (stack.weight as f64 / total as f64) * 100.0;
        let color = get_ansi_color(stack.leaf());

        lines.push(format!(
            "  ┃ {}{:<58}{} ┃ {:>12.3} ┃ {:>6.1}% ┃",
            color,
            truncate_start(&stack.stack, 58),
            reset,
            millis,
            percentage
        ));
    }

    lines.push("  ┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┻━━━━━━━━━━━━━━┻━━━━━━━━━┛".to_string());

    if stacks.len() > max_lines {
        lines.push(String::new());
        lines.push(format!("   (Showing top {} of {} unique paths)", max_lines, stacks.len()));
    }

    lines.join("\n")
}

// Keep the tail: the innermost frames matter most
fn truncate_start(text: &str, max_chars: usize) -> String {
    let count = text.chars().count();
    if count <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let tail: String = text.chars().skip(count - keep).collect();
    format!("...{}", tail)
}

fn truncate_end(text: &str, max_chars: usize) -> String {
    let count = text.chars().count();
    if count <= max_chars {
        text.to_string()
    } else if max_chars > 3 {
        let head: String = text.chars().take(max_chars - 3).collect();
        format!("{}...", head)
    } else {
        String::new()
    }
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stacks() -> Vec<CollapsedStack> {
        vec![
            CollapsedStack::new("index (views.py:3);SELECT .. FROM book WHERE id < %s".to_string(), 3000),
            CollapsedStack::new("index (views.py:3);{list.html:7};UPDATE book SET seen = 1".to_string(), 1000),
        ]
    }

    #[test]
    fn test_generate_flamegraph_empty() {
        let result = generate_flamegraph(&[], None);
        assert!(matches!(result, Err(FlamegraphError::EmptyStacks)));
    }

    #[test]
    fn test_generate_flamegraph_escapes_sql() {
        let svg = generate_flamegraph(&stacks(), None).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("id &lt; %s"));
        assert!(!svg.contains("id < %s"));
        assert!(svg.contains("Query Time Profile"));
    }

    #[test]
    fn test_custom_title() {
        let config = FlamegraphConfig::new().with_title("GET /books").with_width(800);
        let svg = generate_flamegraph(&stacks(), Some(&config)).unwrap();
        assert!(svg.contains("GET /books"));
        assert!(svg.contains(r#"width="800""#));
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("SELECT .. FROM t"), FrameKind::Read);
        assert_eq!(classify("delete from t"), FrameKind::Write);
        assert_eq!(classify("{base.html:1}"), FrameKind::Template);
        assert_eq!(classify("index (views.py:3)"), FrameKind::Code);
    }

    #[test]
    fn test_text_summary() {
        let summary = generate_text_summary(&stacks(), 1, 4000);
        assert!(summary.contains("QUERY HOT PATHS"));
        assert!(summary.contains("75.0%"));
        assert!(summary.contains("Showing top 1 of 2"));
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate_start("ééééé", 4), "...é");
        assert_eq!(truncate_end("ééééé", 4), "é...");
    }
}
