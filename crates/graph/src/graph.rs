use crate::identity;
use crate::types::{Edge, EdgeType, Node, NodeDraft, NodeId, NodeKind};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

/// Append-only structural graph
///
/// Node ids equal petgraph node indices: nodes are never removed, so the
/// creation order and the index stay in lockstep.
#[derive(Debug, Clone, Default)]
pub struct CodeGraph {
    graph: DiGraph<Node, Edge>,
}

impl CodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node, stamping id, sid, code hash, summary and sloc
    pub fn add_node(&mut self, kind: NodeKind, draft: NodeDraft) -> NodeId {
        let id = self.graph.node_count();
        let node = identity::materialize(id, kind, draft);
        self.graph.add_node(node).index()
    }

    /// Insert an already materialized node (used when loading documents)
    pub(crate) fn push_loaded_node(&mut self, mut node: Node) -> NodeId {
        node.parent_id = None;
        self.graph.add_node(node).index()
    }

    /// Add an edge; `false` if either endpoint does not exist
    ///
    /// CONTAINS edges are the only writer of `parent_id`.
    pub fn add_edge(&mut self, source: NodeId, target: NodeId, edge_type: EdgeType) -> bool {
        let (Some(src), Some(dst)) = (self.node(source), self.node(target)) else {
            log::warn!("Dropping {} edge {source} -> {target}: unknown node", edge_type.as_str());
            return false;
        };
        let edge = Edge {
            source,
            target,
            edge_type,
            source_sid: src.sid.clone(),
            target_sid: dst.sid.clone(),
        };
        self.push_edge(edge);
        true
    }

    pub(crate) fn push_edge(&mut self, edge: Edge) {
        if edge.edge_type == EdgeType::Contains {
            self.graph[NodeIndex::new(edge.target)].parent_id = Some(edge.source);
        }
        self.graph
            .add_edge(NodeIndex::new(edge.source), NodeIndex::new(edge.target), edge);
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.graph.node_weight(NodeIndex::new(id))
    }

    /// Nodes in creation order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    /// Edges in insertion order
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.graph.edge_weights()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Lexical owner of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.related(id, EdgeType::Contains, Direction::Incoming)
            .into_iter()
            .next()
    }

    /// Nodes owned by `id`, in creation order
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.related(id, EdgeType::Contains, Direction::Outgoing)
    }

    /// Call targets of `id` (outgoing CALLS edges)
    pub fn callees(&self, id: NodeId) -> Vec<NodeId> {
        self.related(id, EdgeType::Calls, Direction::Outgoing)
    }

    /// Nodes calling `id` (incoming CALLS edges)
    pub fn callers(&self, id: NodeId) -> Vec<NodeId> {
        self.related(id, EdgeType::Calls, Direction::Incoming)
    }

    /// Import records attached to `id`
    pub fn imports(&self, id: NodeId) -> Vec<NodeId> {
        self.related(id, EdgeType::Imports, Direction::Outgoing)
    }

    fn related(&self, id: NodeId, edge_type: EdgeType, direction: Direction) -> Vec<NodeId> {
        if self.node(id).is_none() {
            return Vec::new();
        }
        let mut out: Vec<NodeId> = self
            .graph
            .edges_directed(NodeIndex::new(id), direction)
            .filter(|e| e.weight().edge_type == edge_type)
            .map(|e| match direction {
                Direction::Outgoing => e.target().index(),
                Direction::Incoming => e.source().index(),
            })
            .collect();
        out.sort_unstable();
        out
    }

    /// All nodes belonging to one source file
    pub fn nodes_in_file<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.nodes().filter(move |n| n.file_key() == Some(path))
    }

    /// Nodes sharing a stable id (several when qualified names collide)
    pub fn find_by_sid(&self, sid: &str) -> Vec<&Node> {
        self.nodes().filter(|n| n.sid == sid).collect()
    }

    /// Nodes with the given qualified name
    pub fn find_by_qualified_name(&self, qualified_name: &str) -> Vec<&Node> {
        self.nodes()
            .filter(|n| n.qualified_name.as_deref() == Some(qualified_name))
            .collect()
    }

    /// Module nodes in creation order
    pub fn modules(&self) -> impl Iterator<Item = &Node> {
        self.nodes().filter(|n| n.kind == NodeKind::Module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (CodeGraph, NodeId, NodeId, NodeId) {
        let mut graph = CodeGraph::new();
        let module = graph.add_node(
            NodeKind::Module,
            NodeDraft::default().name("app").qualified_name("app").path("app.py"),
        );
        let main = graph.add_node(
            NodeKind::Function,
            NodeDraft::default()
                .name("main")
                .qualified_name("app.main")
                .code("def main():\n    run()")
                .lines(1, 2)
                .path("app.py"),
        );
        let ext = graph.add_node(
            NodeKind::ExternalFunction,
            NodeDraft::default().name("run").qualified_name("run").path("app.py"),
        );
        graph.add_edge(module, main, EdgeType::Contains);
        graph.add_edge(module, ext, EdgeType::Contains);
        graph.add_edge(main, ext, EdgeType::Calls);
        (graph, module, main, ext)
    }

    #[test]
    fn ids_follow_creation_order() {
        let (graph, module, main, ext) = sample();
        assert_eq!((module, main, ext), (0, 1, 2));
        let ids: Vec<_> = graph.nodes().map(|n| n.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn contains_edges_derive_parent() {
        let (graph, module, main, ext) = sample();
        assert_eq!(graph.node(main).unwrap().parent_id, Some(module));
        assert_eq!(graph.parent(ext), Some(module));
        assert_eq!(graph.children(module), vec![main, ext]);
        assert!(graph.node(module).unwrap().parent_id.is_none());
    }

    #[test]
    fn call_queries_follow_direction() {
        let (graph, _, main, ext) = sample();
        assert_eq!(graph.callees(main), vec![ext]);
        assert_eq!(graph.callers(ext), vec![main]);
        assert!(graph.callers(main).is_empty());
    }

    #[test]
    fn edges_carry_endpoint_sids() {
        let (graph, _, main, ext) = sample();
        let call = graph
            .edges()
            .find(|e| e.edge_type == EdgeType::Calls)
            .unwrap();
        assert_eq!(call.source_sid, graph.node(main).unwrap().sid);
        assert_eq!(call.target_sid, graph.node(ext).unwrap().sid);
    }

    #[test]
    fn unknown_endpoints_are_rejected() {
        let (mut graph, module, _, _) = sample();
        assert!(!graph.add_edge(module, 42, EdgeType::Calls));
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn file_and_name_lookups() {
        let (graph, _, main, _) = sample();
        assert_eq!(graph.nodes_in_file("app.py").count(), 3);
        assert_eq!(graph.find_by_qualified_name("app.main")[0].id, main);
        let sid = graph.node(main).unwrap().sid.clone();
        assert_eq!(graph.find_by_sid(&sid).len(), 1);
    }
}
