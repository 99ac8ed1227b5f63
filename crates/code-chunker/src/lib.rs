//! # Structgraph Chunker
//!
//! Partitions source text, or the nodes of a code graph, into chunks that
//! fit a token budget, so a downstream analyzer can consume them one at a
//! time.
//!
//! ## Architecture
//!
//! ```text
//! Raw text ─────> Recursive split ("\n\n", "\n", " ", graphemes)
//!                   └─> Greedy merge with overlap ─> Chunk[] (line spans)
//!
//! Node list ────> Sort by line ─> Render "[kind] name Ls-e" blocks
//!                   └─> Greedy packing, blocks never split ─> Chunk[]
//! ```
//!
//! Token counting is injected through [`TokenCounter`]; any
//! `Fn(&str) -> usize` works.
//!
//! ## Example
//!
//! ```rust
//! use structgraph_chunker::{Chunker, ChunkerConfig};
//!
//! let chunker = Chunker::new(ChunkerConfig::with_budget(200)).unwrap();
//! let chunks = chunker.chunk_text("app.py", "def f():\n    return 1\n");
//!
//! assert_eq!(chunks.len(), 1);
//! assert_eq!((chunks[0].start_line, chunks[0].end_line), (Some(1), Some(2)));
//! ```

mod chunker;
mod config;
mod error;
mod node_packer;
mod text_splitter;
mod token;
mod types;

pub use chunker::Chunker;
pub use config::ChunkerConfig;
pub use error::{ChunkerError, Result};
pub use node_packer::render_node;
#[cfg(feature = "hf-tokenizer")]
pub use token::HfTokenCounter;
pub use token::{HeuristicTokenCounter, TokenCounter};
pub use types::Chunk;
