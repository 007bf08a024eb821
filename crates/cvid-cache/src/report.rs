//! Instability reports.
//!
//! A report lists the nodes whose walk no longer matches the record taken on
//! first visit, each with both renderings and their side-by-side diff.

use std::fmt;

use cvid_diff::{side_by_side, SideBySide, DEFAULT_COLUMN_WIDTH};
use serde::Serialize;

/// One node whose walk changed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UnstableNode {
    /// Diagnostic label of the node.
    pub label: String,
    /// Rendering of the record stored on first visit.
    pub previous: Vec<String>,
    /// Rendering of the record produced now.
    pub current: Vec<String>,
    pub diff: SideBySide,
}

impl UnstableNode {
    pub fn new(label: impl Into<String>, previous: Vec<String>, current: Vec<String>) -> Self {
        let diff = side_by_side(&previous, &current);
        Self {
            label: label.into(),
            previous,
            current,
            diff,
        }
    }
}

/// Every unstable node found by one instability scan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InstabilityReport {
    /// Detailed entries, at most the configured cap.
    pub nodes: Vec<UnstableNode>,
    /// Number of unstable nodes found, including those left out of `nodes`.
    pub total: usize,
    #[serde(skip)]
    pub column_width: usize,
}

impl InstabilityReport {
    pub fn new(nodes: Vec<UnstableNode>, total: usize) -> Self {
        Self {
            nodes,
            total,
            column_width: DEFAULT_COLUMN_WIDTH,
        }
    }

    pub fn with_column_width(mut self, width: usize) -> Self {
        self.column_width = width;
        self
    }

    /// Returns `true` if some unstable nodes were counted but not detailed.
    pub fn is_truncated(&self) -> bool {
        self.total > self.nodes.len()
    }

    /// Labels of the detailed nodes, in scan order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.label.as_str())
    }

    /// Multi-line human-readable form with each diff column fitted to `width`.
    pub fn render(&self, width: usize) -> String {
        let mut out = format!("Found {} unstable objects\n", self.total);
        for (k, node) in self.nodes.iter().enumerate() {
            out.push_str(&format!("{k} -> {}\n", node.label));
            out.push_str(&node.diff.render(width));
        }
        if self.is_truncated() {
            out.push_str(&format!(
                "... and {} more\n",
                self.total - self.nodes.len()
            ));
        }
        out
    }
}

impl fmt::Display for InstabilityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(self.column_width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> UnstableNode {
        UnstableNode::new(
            "<function app.handler>",
            lines(&["Hash(05000000)", "NamedNode(limit=3)"]),
            lines(&["Hash(05000000)", "NamedNode(limit=4)"]),
        )
    }

    #[test]
    fn node_diff_is_computed() {
        let node = sample();
        assert_eq!(node.diff.changes(), 1);
        assert_eq!(node.diff.rows.len(), 2);
    }

    #[test]
    fn render_names_each_node() {
        let report = InstabilityReport::new(vec![sample()], 1);
        let text = report.render(24);
        let mut it = text.lines();
        assert_eq!(it.next(), Some("Found 1 unstable objects"));
        assert_eq!(it.next(), Some("0 -> <function app.handler>"));
        assert!(it.next().is_some_and(|l| l.contains('|')));
        assert!(it.next().is_some_and(|l| l.contains('*')));
        assert!(!report.is_truncated());
    }

    #[test]
    fn truncation_is_reported() {
        let report = InstabilityReport::new(vec![sample()], 3);
        assert!(report.is_truncated());
        assert!(report.to_string().ends_with("... and 2 more\n"));
    }

    #[test]
    fn display_uses_configured_width() {
        let report = InstabilityReport::new(vec![sample()], 1).with_column_width(10);
        assert_eq!(report.to_string(), report.render(10));
        assert!(report.to_string().contains("NamedNo..."));
    }

    #[test]
    fn serializes_to_json() {
        let report = InstabilityReport::new(vec![sample()], 1);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["total"], 1);
        assert_eq!(json["nodes"][0]["label"], "<function app.handler>");
        assert_eq!(json["nodes"][0]["diff"]["rows"][1]["kind"], "changed");
        assert!(json.get("column_width").is_none());
    }
}
