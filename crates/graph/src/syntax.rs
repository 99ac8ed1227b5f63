use crate::error::{GraphError, Result};
use tree_sitter::Parser;

/// Row/column position (0-based, as reported by the parser)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

/// One positioned node of a parsed file
#[derive(Debug, Clone)]
pub struct SyntaxNode {
    /// Grammar kind (e.g. "function_definition")
    pub kind: &'static str,

    /// Field name under which the parent holds this node
    pub field: Option<&'static str>,

    /// Anonymous tokens (punctuation, keywords) are not named
    pub is_named: bool,

    pub start_byte: usize,
    pub end_byte: usize,
    pub start: Point,
    pub end: Point,

    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

impl SyntaxNode {
    pub fn new(kind: &'static str, start_byte: usize, end_byte: usize, start: Point, end: Point) -> Self {
        Self {
            kind,
            field: None,
            is_named: true,
            start_byte,
            end_byte,
            start,
            end,
            parent: None,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub const fn field(mut self, field: &'static str) -> Self {
        self.field = Some(field);
        self
    }

    #[must_use]
    pub const fn anonymous(mut self) -> Self {
        self.is_named = false;
        self
    }

    /// 1-based inclusive line span
    pub const fn lines(&self) -> (usize, usize) {
        (self.start.row + 1, self.end.row + 1)
    }
}

/// Owned snapshot of one file's syntax tree
///
/// Nodes live in an arena in pre-order; index 0 is the root. The graph
/// builder keeps snapshots alive between pass 1 and pass 2, which a borrowed
/// parser tree would make awkward.
#[derive(Debug, Clone, Default)]
pub struct SyntaxTree {
    nodes: Vec<SyntaxNode>,
}

impl SyntaxTree {
    /// Append a node under `parent` (or as the root) and return its index
    pub fn push(&mut self, mut node: SyntaxNode, parent: Option<usize>) -> usize {
        let idx = self.nodes.len();
        node.parent = parent;
        node.children.clear();
        self.nodes.push(node);
        if let Some(parent) = parent {
            self.nodes[parent].children.push(idx);
        }
        idx
    }

    pub const fn root(&self) -> usize {
        0
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, idx: usize) -> &SyntaxNode {
        &self.nodes[idx]
    }

    pub fn get(&self, idx: usize) -> Option<&SyntaxNode> {
        self.nodes.get(idx)
    }

    pub fn kind(&self, idx: usize) -> &'static str {
        self.nodes[idx].kind
    }

    pub fn children(&self, idx: usize) -> &[usize] {
        &self.nodes[idx].children
    }

    pub fn parent(&self, idx: usize) -> Option<usize> {
        self.nodes[idx].parent
    }

    pub fn child_by_field(&self, idx: usize, field: &str) -> Option<usize> {
        self.children(idx)
            .iter()
            .copied()
            .find(|&child| self.nodes[child].field == Some(field))
    }

    /// Source text covered by a node (lossy UTF-8)
    pub fn text(&self, idx: usize, source: &[u8]) -> String {
        let node = &self.nodes[idx];
        let end = node.end_byte.min(source.len());
        let start = node.start_byte.min(end);
        String::from_utf8_lossy(&source[start..end]).into_owned()
    }

    /// Snapshot a tree-sitter tree with an explicit cursor walk
    pub fn from_tree_sitter(tree: &tree_sitter::Tree) -> Self {
        let mut out = SyntaxTree::default();
        let mut cursor = tree.walk();
        // Indices of the current node's ancestors
        let mut ancestors: Vec<usize> = Vec::new();

        loop {
            let node = cursor.node();
            let start = node.start_position();
            let end = node.end_position();
            let snapshot = SyntaxNode {
                kind: node.kind(),
                field: cursor.field_name(),
                is_named: node.is_named(),
                start_byte: node.start_byte(),
                end_byte: node.end_byte(),
                start: Point {
                    row: start.row,
                    column: start.column,
                },
                end: Point {
                    row: end.row,
                    column: end.column,
                },
                parent: None,
                children: Vec::new(),
            };
            let idx = out.push(snapshot, ancestors.last().copied());

            if cursor.goto_first_child() {
                ancestors.push(idx);
                continue;
            }

            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return out;
                }
                ancestors.pop();
            }
        }
    }
}

/// Capability the graph builder depends on: bytes in, positioned tree out.
///
/// `None` means the file could not be parsed; the builder logs and skips it.
pub trait SyntaxTreeProvider {
    fn parse(&mut self, source: &[u8]) -> Option<SyntaxTree>;
}

/// Python provider backed by tree-sitter
pub struct PythonTreeProvider {
    parser: Parser,
}

impl PythonTreeProvider {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let language: tree_sitter::Language = tree_sitter_python::LANGUAGE.into();
        parser
            .set_language(&language)
            .map_err(|e| GraphError::BuildError(format!("Failed to set language: {e}")))?;
        Ok(Self { parser })
    }
}

impl SyntaxTreeProvider for PythonTreeProvider {
    fn parse(&mut self, source: &[u8]) -> Option<SyntaxTree> {
        let tree = self.parser.parse(source, None)?;
        if tree.root_node().has_error() {
            log::debug!("Parsed with syntax errors; keeping partial tree");
        }
        Some(SyntaxTree::from_tree_sitter(&tree))
    }
}
