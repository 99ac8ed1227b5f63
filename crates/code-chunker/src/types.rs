use serde::{Deserialize, Serialize};
use structgraph_graph::Node;

/// Bounded-size unit of raw text or of a node list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Source file path
    pub file: String,

    /// 1-based, monotonic per file
    pub section: usize,

    /// Raw text, or the rendered node blocks
    pub content: String,

    /// Global line range (1-indexed, inclusive); absent only for node
    /// chunks made entirely of synthetic nodes
    pub start_line: Option<usize>,
    pub end_line: Option<usize>,

    /// Constituent nodes (node-list mode only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<Node>,
}

impl Chunk {
    /// Number of lines spanned
    #[must_use]
    pub fn line_count(&self) -> usize {
        match (self.start_line, self.end_line) {
            (Some(start), Some(end)) => end.saturating_sub(start) + 1,
            _ => 0,
        }
    }

    /// Check if chunk covers a specific line
    #[must_use]
    pub fn contains_line(&self, line: usize) -> bool {
        matches!((self.start_line, self.end_line), (Some(s), Some(e)) if line >= s && line <= e)
    }
}
