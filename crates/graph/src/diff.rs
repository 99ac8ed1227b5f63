use crate::graph::CodeGraph;
use crate::types::{Node, NodeKind};
use serde::Serialize;
use std::collections::HashMap;

/// Node seen on one or both sides of a diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeChange {
    pub sid: String,
    pub kind: NodeKind,
    pub qualified_name: String,
    pub path: Option<String>,
    pub start_line: Option<usize>,
    pub end_line: Option<usize>,
}

impl NodeChange {
    fn from_node(node: &Node) -> Self {
        Self {
            sid: node.sid.clone(),
            kind: node.kind,
            qualified_name: node.display_name().to_string(),
            path: node.path.clone(),
            start_line: node.start_line,
            end_line: node.end_line,
        }
    }
}

/// Node-level comparison of two independent builds joined on `sid`
///
/// Only nodes whose sid comes from a name take part: sids that fall back to
/// the raw id (control-flow blocks, assignments) shift whenever an earlier
/// node is added, so they cannot be joined across builds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphDiff {
    pub added: Vec<NodeChange>,
    pub removed: Vec<NodeChange>,
    /// Same sid, different `code_sha`; positions are from the new build
    pub modified: Vec<NodeChange>,
}

impl GraphDiff {
    pub fn between(old: &CodeGraph, new: &CodeGraph) -> Self {
        let old_index = index_by_sid(old);
        let new_index = index_by_sid(new);

        let mut diff = GraphDiff::default();
        for (sid, node) in &new_index {
            match old_index.get(sid) {
                None => diff.added.push(NodeChange::from_node(node)),
                Some(previous) if previous.code_sha != node.code_sha => {
                    diff.modified.push(NodeChange::from_node(node));
                }
                Some(_) => {}
            }
        }
        for (sid, node) in &old_index {
            if !new_index.contains_key(sid) {
                diff.removed.push(NodeChange::from_node(node));
            }
        }

        for changes in [&mut diff.added, &mut diff.removed, &mut diff.modified] {
            changes.sort_by(|a, b| {
                (a.path.as_deref(), a.start_line, a.sid.as_str())
                    .cmp(&(b.path.as_deref(), b.start_line, b.sid.as_str()))
            });
        }
        diff
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }
}

/// First node per name-derived sid
fn index_by_sid(graph: &CodeGraph) -> HashMap<&str, &Node> {
    let mut index = HashMap::new();
    for node in graph.nodes().filter(|n| has_named_identity(n)) {
        index.entry(node.sid.as_str()).or_insert(node);
    }
    index
}

fn has_named_identity(node: &Node) -> bool {
    !node.display_name().is_empty()
}
