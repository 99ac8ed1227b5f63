use crate::constructs::{self, Construct};
use crate::graph::CodeGraph;
use crate::syntax::{SyntaxTree, SyntaxTreeProvider};
use crate::types::{EdgeType, NodeDraft, NodeId, NodeKind};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// Qualified name -> node id, scoped to a single build
///
/// Later registrations overwrite earlier ones for the same name; the earlier
/// node stays in the graph but is no longer a call target.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: HashMap<String, NodeId>,
}

impl SymbolTable {
    /// Register a name, returning the id it replaced
    pub fn insert(&mut self, qualified_name: impl Into<String>, id: NodeId) -> Option<NodeId> {
        self.entries.insert(qualified_name.into(), id)
    }

    pub fn get(&self, qualified_name: &str) -> Option<NodeId> {
        self.entries.get(qualified_name).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Counters reported after a build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub files: usize,
    pub skipped_files: usize,
    pub symbol_collisions: usize,
    pub imports: usize,
    pub resolved_calls: usize,
    pub external_functions: usize,
    pub nodes: usize,
    pub edges: usize,
}

/// One file that completed pass 1
pub(crate) struct FileUnit {
    pub module_id: NodeId,
    pub module_name: String,
    pub path: String,
    pub source: Vec<u8>,
    pub tree: SyntaxTree,
    /// Tree node index -> graph node created for it
    pub registered: HashMap<usize, NodeId>,
}

/// Pending traversal entry for pass 1
struct Frame {
    idx: usize,
    /// Node that owns whatever is created here
    container: NodeId,
    enclosing_kind: NodeKind,
    /// Qualified name of the nearest named scope
    scope: String,
}

/// Pass 1: creates structural nodes, CONTAINS edges and the symbol table
pub struct Registrar {
    pub(crate) graph: CodeGraph,
    pub(crate) symbols: SymbolTable,
    pub(crate) units: Vec<FileUnit>,
    pub(crate) stats: BuildStats,
}

impl Registrar {
    pub fn new() -> Self {
        Self {
            graph: CodeGraph::new(),
            symbols: SymbolTable::default(),
            units: Vec::new(),
            stats: BuildStats::default(),
        }
    }

    /// Register one file; returns `false` (and logs) when it cannot be parsed
    pub fn register_file<P: SyntaxTreeProvider + ?Sized>(
        &mut self,
        provider: &mut P,
        path: &str,
        source: Vec<u8>,
    ) -> bool {
        let Some(tree) = provider.parse(&source) else {
            log::warn!("Failed to parse {path}; skipping");
            self.stats.skipped_files += 1;
            return false;
        };
        if tree.is_empty() {
            log::warn!("Empty syntax tree for {path}; skipping");
            self.stats.skipped_files += 1;
            return false;
        }

        let module_name = module_name(path);
        let text = String::from_utf8_lossy(&source).into_owned();
        let total_lines = text.lines().count().max(1);
        let module_id = self.graph.add_node(
            NodeKind::Module,
            NodeDraft::default()
                .name(module_name.clone())
                .qualified_name(module_name.clone())
                .code(text)
                .lines(1, total_lines)
                .path(path),
        );
        self.record_symbol(module_name.clone(), module_id);

        let mut registered = HashMap::new();
        self.walk(&tree, &source, path, &module_name, module_id, &mut registered);
        log::debug!("Registered {path}: {} definitions", registered.len());

        self.stats.files += 1;
        self.units.push(FileUnit {
            module_id,
            module_name,
            path: path.to_string(),
            source,
            tree,
            registered,
        });
        true
    }

    /// Close pass 1; the returned build has a complete symbol table
    pub fn finish(self) -> RegisteredBuild {
        RegisteredBuild { inner: self }
    }

    fn walk(
        &mut self,
        tree: &SyntaxTree,
        source: &[u8],
        path: &str,
        module_name: &str,
        module_id: NodeId,
        registered: &mut HashMap<usize, NodeId>,
    ) {
        let mut stack = vec![Frame {
            idx: tree.root(),
            container: module_id,
            enclosing_kind: NodeKind::Module,
            scope: module_name.to_string(),
        }];

        while let Some(frame) = stack.pop() {
            let idx = frame.idx;
            let construct = constructs::classify(tree, idx, source);

            let Some(kind) = construct.and_then(|c| definition_kind(c, frame.enclosing_kind)) else {
                push_children(&mut stack, tree, idx, |child| Frame {
                    idx: child,
                    container: frame.container,
                    enclosing_kind: frame.enclosing_kind,
                    scope: frame.scope.clone(),
                });
                continue;
            };

            let (start_line, end_line) = tree.node(idx).lines();
            let mut draft = NodeDraft::default()
                .code(tree.text(idx, source))
                .lines(start_line, end_line)
                .path(path);

            let child_scope = if kind.is_named_scope() {
                let name = constructs::name(tree, idx, source);
                let qualified_name = format!("{}.{name}", frame.scope);
                let signature = match kind {
                    NodeKind::Class => None,
                    _ => constructs::signature(tree, idx, source),
                };
                draft = draft
                    .name(name)
                    .qualified_name(qualified_name.clone())
                    .signature(signature)
                    .docstring(constructs::docstring(tree, idx, source));
                qualified_name
            } else {
                frame.scope.clone()
            };

            let id = self.graph.add_node(kind, draft);
            self.graph.add_edge(frame.container, id, EdgeType::Contains);
            registered.insert(idx, id);
            if kind.is_named_scope() {
                self.record_symbol(child_scope.clone(), id);
            }

            if kind.is_named_scope() || kind.is_control_flow() {
                push_children(&mut stack, tree, idx, |child| Frame {
                    idx: child,
                    container: id,
                    enclosing_kind: kind,
                    scope: child_scope.clone(),
                });
            }
        }
    }

    fn record_symbol(&mut self, qualified_name: String, id: NodeId) {
        if let Some(previous) = self.symbols.insert(qualified_name, id) {
            log::debug!("Symbol collision: node {id} replaces node {previous}");
            self.stats.symbol_collisions += 1;
        }
    }
}

impl Default for Registrar {
    fn default() -> Self {
        Self::new()
    }
}

/// Build state after every file finished pass 1
pub struct RegisteredBuild {
    pub(crate) inner: Registrar,
}

impl RegisteredBuild {
    pub fn symbols(&self) -> &SymbolTable {
        &self.inner.symbols
    }

    pub fn graph(&self) -> &CodeGraph {
        &self.inner.graph
    }
}

/// Node kind for a pass-1 construct; Function vs Method is decided by the
/// kind of the node that will own it.
fn definition_kind(construct: Construct, enclosing_kind: NodeKind) -> Option<NodeKind> {
    let kind = match construct {
        Construct::Class => NodeKind::Class,
        Construct::Function if enclosing_kind == NodeKind::Class => NodeKind::Method,
        Construct::Function => NodeKind::Function,
        Construct::If => NodeKind::If,
        Construct::For => NodeKind::For,
        Construct::While => NodeKind::While,
        Construct::Try => NodeKind::Try,
        Construct::With => NodeKind::With,
        Construct::Assignment => NodeKind::Assignment,
        Construct::Decorator => NodeKind::Decorator,
        Construct::Docstring => NodeKind::Docstring,
        Construct::Import | Construct::Call => return None,
    };
    Some(kind)
}

/// Push children in reverse so they pop in source order
fn push_children<T>(stack: &mut Vec<T>, tree: &SyntaxTree, idx: usize, frame: impl Fn(usize) -> T) {
    stack.extend(tree.children(idx).iter().rev().map(|&child| frame(child)));
}

/// Module name is the file stem
pub(crate) fn module_name(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}
