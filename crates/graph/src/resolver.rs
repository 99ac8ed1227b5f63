use crate::constructs::{self, Construct};
use crate::graph::CodeGraph;
use crate::registrar::{BuildStats, FileUnit, RegisteredBuild, SymbolTable};
use crate::types::{EdgeType, NodeDraft, NodeId, NodeKind};
use std::collections::HashMap;

/// Finished build: immutable graph plus the symbol table it was resolved with
#[derive(Debug)]
pub struct BuildOutput {
    pub graph: CodeGraph,
    pub symbols: SymbolTable,
    pub stats: BuildStats,
}

/// Pending traversal entry for pass 2
struct Frame {
    idx: usize,
    /// Owner for Import nodes (innermost registered container)
    container: NodeId,
    /// Source of CALLS/IMPORTS edges (innermost named scope)
    scope_node: NodeId,
    scope: String,
}

impl RegisteredBuild {
    /// Pass 2: record imports and resolve calls against the complete table
    pub fn resolve(self) -> BuildOutput {
        let mut registrar = self.inner;
        let units = std::mem::take(&mut registrar.units);

        for unit in &units {
            let mut pass = FilePass {
                graph: &mut registrar.graph,
                symbols: &registrar.symbols,
                stats: &mut registrar.stats,
                unit,
                externals: HashMap::new(),
            };
            pass.run();
        }

        let mut stats = registrar.stats;
        stats.nodes = registrar.graph.node_count();
        stats.edges = registrar.graph.edge_count();
        log::info!(
            "Built code graph: {} files ({} skipped), {} nodes, {} edges",
            stats.files,
            stats.skipped_files,
            stats.nodes,
            stats.edges
        );

        BuildOutput {
            graph: registrar.graph,
            symbols: registrar.symbols,
            stats,
        }
    }
}

struct FilePass<'a> {
    graph: &'a mut CodeGraph,
    symbols: &'a SymbolTable,
    stats: &'a mut BuildStats,
    unit: &'a FileUnit,
    /// Unresolved callee name -> ExternalFunction node, one per module
    externals: HashMap<String, NodeId>,
}

impl FilePass<'_> {
    fn run(&mut self) {
        let unit = self.unit;
        let tree = &unit.tree;
        let mut stack = vec![Frame {
            idx: tree.root(),
            container: unit.module_id,
            scope_node: unit.module_id,
            scope: unit.module_name.clone(),
        }];

        while let Some(mut frame) = stack.pop() {
            let idx = frame.idx;

            if let Some(&id) = unit.registered.get(&idx) {
                frame.container = id;
                if let Some(node) = self.graph.node(id).filter(|n| n.kind.is_named_scope()) {
                    frame.scope_node = id;
                    frame.scope = node.qualified_name.clone().unwrap_or_default();
                }
            }

            match constructs::classify(tree, idx, &unit.source) {
                Some(Construct::Import) => {
                    self.record_import(&frame);
                    continue;
                }
                Some(Construct::Call) => self.resolve_call(&frame),
                _ => {}
            }

            stack.extend(tree.children(idx).iter().rev().map(|&child| Frame {
                idx: child,
                container: frame.container,
                scope_node: frame.scope_node,
                scope: frame.scope.clone(),
            }));
        }
    }

    fn record_import(&mut self, frame: &Frame) {
        let tree = &self.unit.tree;
        let text = tree.text(frame.idx, &self.unit.source).trim().to_string();
        let (start_line, end_line) = tree.node(frame.idx).lines();

        let import_id = self.graph.add_node(
            NodeKind::Import,
            NodeDraft::default()
                .name(text.clone())
                .code(text)
                .lines(start_line, end_line)
                .path(self.unit.path.as_str()),
        );
        self.graph.add_edge(frame.container, import_id, EdgeType::Contains);
        self.graph.add_edge(frame.scope_node, import_id, EdgeType::Imports);
        self.stats.imports += 1;
    }

    fn resolve_call(&mut self, frame: &Frame) {
        let callee = constructs::callee(&self.unit.tree, frame.idx, &self.unit.source);

        let target = match self.lookup(&frame.scope, &callee) {
            Some(id) => {
                self.stats.resolved_calls += 1;
                id
            }
            None => self.external(&callee),
        };
        self.graph.add_edge(frame.scope_node, target, EdgeType::Calls);
    }

    /// Immediate scope, then module level; intermediate scopes are not searched
    fn lookup(&self, scope: &str, callee: &str) -> Option<NodeId> {
        let module = self.unit.module_name.as_str();
        self.symbols
            .get(&format!("{scope}.{callee}"))
            .or_else(|| {
                (scope != module)
                    .then(|| self.symbols.get(&format!("{module}.{callee}")))
                    .flatten()
            })
            .or_else(|| self.symbols.get(callee))
    }

    fn external(&mut self, callee: &str) -> NodeId {
        if let Some(&id) = self.externals.get(callee) {
            return id;
        }
        let id = self.graph.add_node(
            NodeKind::ExternalFunction,
            NodeDraft::default()
                .name(callee)
                .qualified_name(callee)
                .path(self.unit.path.as_str()),
        );
        self.graph.add_edge(self.unit.module_id, id, EdgeType::Contains);
        self.externals.insert(callee.to_string(), id);
        self.stats.external_functions += 1;
        id
    }
}
