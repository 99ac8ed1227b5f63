//! JSON document and NDJSON stream forms of a graph.

use crate::error::{GraphError, Result};
use crate::graph::CodeGraph;
use crate::types::{Edge, EdgeType, Node, NodeId};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// `{"nodes": [...], "edges": [...]}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

#[derive(Serialize)]
struct DocumentRef<'a> {
    nodes: Vec<&'a Node>,
    edges: Vec<&'a Edge>,
}

/// One NDJSON line when writing
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum StreamRecordRef<'a> {
    Node(&'a Node),
    Edge(StreamEdgeRef<'a>),
}

/// Edges already use `type` for the relation, so the stream carries it as
/// `edge_type`.
#[derive(Serialize)]
struct StreamEdgeRef<'a> {
    source: NodeId,
    target: NodeId,
    edge_type: EdgeType,
    source_sid: &'a str,
    target_sid: &'a str,
}

/// One NDJSON line when reading
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum StreamRecord {
    Node(Node),
    Edge(StreamEdge),
}

#[derive(Deserialize)]
struct StreamEdge {
    source: NodeId,
    target: NodeId,
    edge_type: EdgeType,
    #[serde(default)]
    source_sid: String,
    #[serde(default)]
    target_sid: String,
}

impl CodeGraph {
    /// Owned copy of the node and edge collections
    pub fn to_document(&self) -> GraphDocument {
        GraphDocument {
            nodes: self.nodes().cloned().collect(),
            edges: self.edges().cloned().collect(),
        }
    }

    /// Rebuild a graph; ids must be contiguous and in order
    pub fn from_document(document: GraphDocument) -> Result<Self> {
        let node_count = document.nodes.len();
        let mut graph = CodeGraph::new();

        for (position, node) in document.nodes.into_iter().enumerate() {
            if node.id != position {
                return Err(GraphError::Corrupt(format!(
                    "node id {} at position {position}",
                    node.id
                )));
            }
            graph.push_loaded_node(node);
        }

        for edge in document.edges {
            if edge.source >= node_count || edge.target >= node_count {
                return Err(GraphError::Corrupt(format!(
                    "edge {} -> {} references a missing node",
                    edge.source, edge.target
                )));
            }
            graph.push_edge(edge);
        }

        Ok(graph)
    }

    /// Write the single-document form
    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        let document = DocumentRef {
            nodes: self.nodes().collect(),
            edges: self.edges().collect(),
        };
        serde_json::to_writer_pretty(writer, &document)?;
        Ok(())
    }

    /// Write one record per line, nodes first
    pub fn write_ndjson<W: Write>(&self, mut writer: W) -> Result<()> {
        for node in self.nodes() {
            serde_json::to_writer(&mut writer, &StreamRecordRef::Node(node))?;
            writer.write_all(b"\n")?;
        }
        for edge in self.edges() {
            let record = StreamRecordRef::Edge(StreamEdgeRef {
                source: edge.source,
                target: edge.target,
                edge_type: edge.edge_type,
                source_sid: &edge.source_sid,
                target_sid: &edge.target_sid,
            });
            serde_json::to_writer(&mut writer, &record)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn read_json<R: Read>(reader: R) -> Result<Self> {
        let document: GraphDocument = serde_json::from_reader(reader)?;
        Self::from_document(document)
    }

    /// Read a stream; blank lines are ignored
    pub fn read_ndjson<R: BufRead>(reader: R) -> Result<Self> {
        let mut document = GraphDocument::default();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: StreamRecord = serde_json::from_str(&line).map_err(|e| {
                GraphError::Corrupt(format!("line {}: {e}", line_no + 1))
            })?;
            match record {
                StreamRecord::Node(node) => document.nodes.push(node),
                StreamRecord::Edge(edge) => document.edges.push(Edge {
                    source: edge.source,
                    target: edge.target,
                    edge_type: edge.edge_type,
                    source_sid: edge.source_sid,
                    target_sid: edge.target_sid,
                }),
            }
        }
        Self::from_document(document)
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = create_file(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        self.write_json(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn save_ndjson(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = create_file(path.as_ref())?;
        self.write_ndjson(BufWriter::new(file))
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        Self::read_json(BufReader::new(File::open(path)?))
    }

    pub fn load_ndjson(path: impl AsRef<Path>) -> Result<Self> {
        Self::read_ndjson(BufReader::new(File::open(path)?))
    }
}

fn create_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NodeDraft, NodeKind};

    fn sample() -> CodeGraph {
        let mut graph = CodeGraph::new();
        let module = graph.add_node(
            NodeKind::Module,
            NodeDraft::default().name("m").qualified_name("m").code("x = 1\n").lines(1, 1).path("m.py"),
        );
        let assign = graph.add_node(
            NodeKind::Assignment,
            NodeDraft::default().code("x = 1").lines(1, 1).path("m.py"),
        );
        graph.add_edge(module, assign, EdgeType::Contains);
        graph
    }

    #[test]
    fn ndjson_tags_records() {
        let mut buf = Vec::new();
        sample().write_ndjson(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["type"], "node");
        assert_eq!(lines[0]["kind"], "Module");
        assert_eq!(lines[2]["type"], "edge");
        assert_eq!(lines[2]["edge_type"], "CONTAINS");
    }

    #[test]
    fn json_document_uses_type_for_edges() {
        let mut buf = Vec::new();
        sample().write_json(&mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["edges"][0]["type"], "CONTAINS");
        assert_eq!(value["nodes"][1]["parent_id"], 0);
        assert!(value["nodes"][0]["parent_id"].is_null());
    }

    #[test]
    fn loading_rederives_parent_ids() {
        let mut document = sample().to_document();
        document.nodes[1].parent_id = Some(99);
        let graph = CodeGraph::from_document(document).unwrap();
        assert_eq!(graph.node(1).unwrap().parent_id, Some(0));
    }

    #[test]
    fn rejects_dangling_edges() {
        let mut document = sample().to_document();
        document.edges[0].target = 7;
        assert!(matches!(
            CodeGraph::from_document(document),
            Err(GraphError::Corrupt(_))
        ));
    }

    #[test]
    fn rejects_out_of_order_ids() {
        let mut document = sample().to_document();
        document.nodes.swap(0, 1);
        assert!(CodeGraph::from_document(document).is_err());
    }
}
