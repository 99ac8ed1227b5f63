//! Node-list mode: render nodes as text blocks and pack them greedily.
//! A node's block is never split across chunks.

use crate::chunker::Chunker;
use crate::token::TokenCounter;
use crate::types::Chunk;
use std::collections::BTreeMap;
use structgraph_graph::{CodeGraph, Node};

const ELISION: &str = "\n...\n";

/// Render one node as `[kind] name Ls-e`, its body and a `---` rule.
/// The body is the code (else the summary), trimmed; bodies longer than
/// `code_max_chars` keep only their head and tail.
pub fn render_node(node: &Node, code_max_chars: usize) -> String {
    let line = |l: Option<usize>| l.map_or_else(|| "?".to_string(), |l| l.to_string());

    let body = node
        .code
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .or(node.summary.as_deref())
        .unwrap_or("")
        .trim();

    format!(
        "[{}] {} L{}-{}\n{}\n---\n",
        node.kind,
        node.display_name(),
        line(node.start_line),
        line(node.end_line),
        elide(body, code_max_chars)
    )
}

fn elide(body: &str, max_chars: usize) -> String {
    let count = body.chars().count();
    if max_chars == 0 || count <= max_chars {
        return body.to_string();
    }

    let half = max_chars / 2;
    let head: String = body.chars().take(half).collect();
    let tail: String = body.chars().skip(count - half).collect();
    format!("{head}{ELISION}{tail}")
}

fn line_key(node: &Node) -> (usize, usize) {
    (
        node.start_line.unwrap_or(usize::MAX),
        node.end_line.unwrap_or(usize::MAX),
    )
}

#[derive(Default)]
struct Pending {
    content: String,
    nodes: Vec<Node>,
}

impl<T: TokenCounter> Chunker<T> {
    /// Pack one file's nodes, in line order, into budget-sized chunks
    pub fn chunk_nodes(&self, file: &str, nodes: &[Node]) -> Vec<Chunk> {
        let mut ordered: Vec<&Node> = nodes.iter().collect();
        ordered.sort_by_key(|n| line_key(n));

        let budget = self.config.token_budget;
        let mut chunks = Vec::new();
        let mut pending = Pending::default();

        for node in ordered {
            let block = render_node(node, self.config.code_max_chars);
            let tokens = self.tokens(&block);

            if tokens >= budget {
                log::debug!(
                    "{file}: {} ({tokens} tokens) exceeds budget, emitted alone",
                    node.display_name()
                );
                flush(file, &mut pending, &mut chunks);
                pending = Pending {
                    content: block,
                    nodes: vec![node.clone()],
                };
                flush(file, &mut pending, &mut chunks);
                continue;
            }

            if !pending.nodes.is_empty()
                && self.tokens(&format!("{}{block}", pending.content)) > budget
            {
                flush(file, &mut pending, &mut chunks);
            }
            pending.content.push_str(&block);
            pending.nodes.push(node.clone());
        }
        flush(file, &mut pending, &mut chunks);

        log::debug!("{file}: {} node chunk(s) from {} node(s)", chunks.len(), nodes.len());
        chunks
    }

    /// Node-chunk every file of a graph, files in sorted order.
    /// Nodes without a file are skipped.
    pub fn chunk_graph(&self, graph: &CodeGraph) -> Vec<Chunk> {
        let mut by_file: BTreeMap<&str, Vec<Node>> = BTreeMap::new();
        let mut orphans = 0usize;
        for node in graph.nodes() {
            match node.file_key() {
                Some(file) => by_file.entry(file).or_default().push(node.clone()),
                None => orphans += 1,
            }
        }
        if orphans > 0 {
            log::warn!("Skipped {orphans} node(s) without a file");
        }

        by_file
            .iter()
            .flat_map(|(file, nodes)| self.chunk_nodes(file, nodes))
            .collect()
    }
}

fn flush(file: &str, pending: &mut Pending, chunks: &mut Vec<Chunk>) {
    if pending.nodes.is_empty() {
        return;
    }
    let Pending { content, nodes, .. } = std::mem::take(pending);

    let start_line = nodes.iter().filter_map(|n| n.start_line).min();
    let end_line = nodes.iter().filter_map(|n| n.end_line).max();
    chunks.push(Chunk {
        file: file.to_string(),
        section: chunks.len() + 1,
        content,
        start_line,
        end_line,
        nodes,
    });
}
