use serde::{Deserialize, Serialize};
use std::fmt;

/// Node identifier, allocated in creation order within one build
pub type NodeId = usize;

/// Kind of syntactic construct a node stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Module,
    Class,
    Function,
    Method,
    If,
    For,
    While,
    Try,
    With,
    Assignment,
    Decorator,
    Docstring,
    Import,
    ExternalFunction,
}

impl NodeKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            NodeKind::Module => "Module",
            NodeKind::Class => "Class",
            NodeKind::Function => "Function",
            NodeKind::Method => "Method",
            NodeKind::If => "If",
            NodeKind::For => "For",
            NodeKind::While => "While",
            NodeKind::Try => "Try",
            NodeKind::With => "With",
            NodeKind::Assignment => "Assignment",
            NodeKind::Decorator => "Decorator",
            NodeKind::Docstring => "Docstring",
            NodeKind::Import => "Import",
            NodeKind::ExternalFunction => "ExternalFunction",
        }
    }

    /// Kinds that open a new naming level (qualified names nest under them)
    pub const fn is_named_scope(self) -> bool {
        matches!(
            self,
            NodeKind::Module | NodeKind::Class | NodeKind::Function | NodeKind::Method
        )
    }

    /// Control-flow blocks own children but inherit the enclosing name
    pub const fn is_control_flow(self) -> bool {
        matches!(
            self,
            NodeKind::If | NodeKind::For | NodeKind::While | NodeKind::Try | NodeKind::With
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type of relationship between two nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeType {
    /// A owns B in the lexical tree
    Contains,

    /// A records import statement B
    Imports,

    /// A calls B (resolved definition or external stand-in)
    Calls,
}

impl EdgeType {
    pub const fn as_str(self) -> &'static str {
        match self {
            EdgeType::Contains => "CONTAINS",
            EdgeType::Imports => "IMPORTS",
            EdgeType::Calls => "CALLS",
        }
    }
}

/// Node in the structural graph
///
/// Every optional field deserializes to `None` when missing so that partially
/// written documents still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,

    pub kind: NodeKind,

    #[serde(default)]
    pub name: Option<String>,

    /// Dot-joined enclosing scope path (e.g. "service.Auth.login")
    #[serde(default)]
    pub qualified_name: Option<String>,

    /// Exact source snippet
    #[serde(default)]
    pub code: Option<String>,

    #[serde(default)]
    pub signature: Option<String>,

    #[serde(default)]
    pub docstring: Option<String>,

    /// Line range (1-indexed, inclusive); absent for synthetic nodes
    #[serde(default)]
    pub start_line: Option<usize>,
    #[serde(default)]
    pub end_line: Option<usize>,

    /// File-relative path of the owning module
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub path: Option<String>,

    /// Derived from the incoming CONTAINS edge
    #[serde(default)]
    pub parent_id: Option<NodeId>,

    /// Stable identity hash of the qualified name
    #[serde(default)]
    pub sid: String,

    /// Content hash of `code`
    #[serde(default)]
    pub code_sha: Option<String>,

    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default)]
    pub sloc: usize,
}

impl Node {
    /// Qualified name, falling back to the bare name
    pub fn display_name(&self) -> &str {
        self.qualified_name
            .as_deref()
            .filter(|q| !q.is_empty())
            .or(self.name.as_deref())
            .unwrap_or("")
    }

    /// File key used to group nodes per source file
    pub fn file_key(&self) -> Option<&str> {
        self.module
            .as_deref()
            .or(self.path.as_deref())
            .filter(|p| !p.is_empty())
    }
}

/// Everything the registrar and resolver know about a node before it is
/// stamped with an id and identity metadata.
#[derive(Debug, Clone, Default)]
pub struct NodeDraft {
    pub name: Option<String>,
    pub qualified_name: Option<String>,
    pub code: Option<String>,
    pub signature: Option<String>,
    pub docstring: Option<String>,
    pub start_line: Option<usize>,
    pub end_line: Option<usize>,
    pub path: Option<String>,
}

impl NodeDraft {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn qualified_name(mut self, qualified_name: impl Into<String>) -> Self {
        self.qualified_name = Some(qualified_name.into());
        self
    }

    #[must_use]
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    #[must_use]
    pub fn signature(mut self, signature: Option<String>) -> Self {
        self.signature = signature;
        self
    }

    #[must_use]
    pub fn docstring(mut self, docstring: Option<String>) -> Self {
        self.docstring = docstring;
        self
    }

    #[must_use]
    pub const fn lines(mut self, start_line: usize, end_line: usize) -> Self {
        self.start_line = Some(start_line);
        self.end_line = Some(end_line);
        self
    }

    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Directed, typed relation between two nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,

    #[serde(rename = "type")]
    pub edge_type: EdgeType,

    /// Identity-based endpoints for joins across builds
    #[serde(default)]
    pub source_sid: String,
    #[serde(default)]
    pub target_sid: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_type_serializes_upper_case() {
        let json = serde_json::to_string(&EdgeType::Contains).unwrap();
        assert_eq!(json, "\"CONTAINS\"");
        let back: EdgeType = serde_json::from_str("\"CALLS\"").unwrap();
        assert_eq!(back, EdgeType::Calls);
    }

    #[test]
    fn node_tolerates_missing_fields() {
        let node: Node = serde_json::from_str(r#"{"id": 3, "kind": "If"}"#).unwrap();
        assert_eq!(node.id, 3);
        assert_eq!(node.kind, NodeKind::If);
        assert!(node.name.is_none());
        assert!(node.start_line.is_none());
        assert_eq!(node.sloc, 0);
        assert_eq!(node.display_name(), "");
    }

    #[test]
    fn control_flow_kinds_do_not_open_named_scope() {
        for kind in [NodeKind::If, NodeKind::For, NodeKind::While, NodeKind::Try, NodeKind::With] {
            assert!(kind.is_control_flow());
            assert!(!kind.is_named_scope());
        }
        assert!(NodeKind::Class.is_named_scope());
    }
}
