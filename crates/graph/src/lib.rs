//! # Structgraph Graph
//!
//! Typed structural graph of a source tree: modules, classes, functions,
//! control-flow blocks, imports and calls.
//!
//! ## Architecture
//!
//! ```text
//! (path, bytes)[]
//!     │
//!     ├──> Syntax Tree Provider (tree-sitter snapshot)
//!     │
//!     ├──> Pass 1: Registrar
//!     │      ├─ Structural nodes + CONTAINS edges
//!     │      ├─ Identity (sid, code_sha, summary, sloc)
//!     │      └─ Symbol table (qualified name -> node)
//!     │
//!     ├──> Pass 2: Resolver (after every file finished pass 1)
//!     │      ├─ Import records + IMPORTS edges
//!     │      └─ CALLS edges (scope, module, external stand-in)
//!     │
//!     └──> Code Graph (petgraph)
//!            ├─ JSON document / NDJSON stream
//!            └─ Diff between two builds by sid
//! ```
//!
//! ## Example
//!
//! ```rust
//! use structgraph_graph::{GraphBuilder, NodeKind};
//!
//! let mut builder = GraphBuilder::python(None).unwrap();
//! let out = builder.build_sources(vec![("app.py".into(), b"def f(): pass\n".to_vec())]);
//!
//! let f = &out.graph.find_by_qualified_name("app.f")[0];
//! assert_eq!(f.kind, NodeKind::Function);
//! ```

mod builder;
pub mod constructs;
mod diff;
mod error;
mod graph;
pub mod identity;
mod persist;
mod registrar;
mod resolver;
mod syntax;
mod types;

pub use builder::GraphBuilder;
pub use diff::{GraphDiff, NodeChange};
pub use error::{GraphError, Result};
pub use graph::CodeGraph;
pub use persist::GraphDocument;
pub use registrar::{BuildStats, Registrar, RegisteredBuild, SymbolTable};
pub use resolver::BuildOutput;
pub use syntax::{Point, PythonTreeProvider, SyntaxNode, SyntaxTree, SyntaxTreeProvider};
pub use types::{Edge, EdgeType, Node, NodeDraft, NodeId, NodeKind};
