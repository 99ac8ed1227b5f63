//! # Structgraph Indexer
//!
//! Turns a project directory into graph artifacts and text bundles.
//!
//! ## Pipeline
//!
//! ```text
//! Directory
//!     │
//!     ├──> File Scanner (.gitignore aware, extension filter)
//!     │      └─> Sorted source files
//!     │
//!     ├──> Graph Builder (two passes)
//!     │      └─> graph.json / graph.ndjson
//!     │
//!     └──> Text Bundle
//!            └─> bundle.json ─> raw-text chunks
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use structgraph_indexer::{build_graph, write_graph_artifacts, ScanOptions};
//!
//! let out = build_graph("/path/to/project", ScanOptions::default())?;
//! write_graph_artifacts(&out.graph, "out/graph.json", None)?;
//! println!("{} nodes, {} edges", out.stats.nodes, out.stats.edges);
//! # Ok::<(), structgraph_indexer::IndexerError>(())
//! ```

mod bundle;
mod error;
mod pipeline;
mod scanner;

pub use bundle::{BundleFile, BundleSummary, TextBundle};
pub use error::{IndexerError, Result};
pub use pipeline::{build_graph, write_graph_artifacts};
pub use scanner::{FileScanner, ScanOptions};
