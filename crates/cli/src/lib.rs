use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use flags::GraphFormatFlag;
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use structgraph_chunker::{Chunk, Chunker, ChunkerConfig, HeuristicTokenCounter, TokenCounter};
use structgraph_graph::GraphDiff;
use structgraph_indexer::{build_graph, write_graph_artifacts, ScanOptions, TextBundle};

mod flags;

fn print_stdout(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    print_stdout(&serde_json::to_string_pretty(value)?)
}

#[derive(Parser)]
#[command(name = "structgraph")]
#[command(about = "Structural code graphs and token-budgeted chunks for Python projects", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the code graph of a project
    Graph(GraphArgs),

    /// Bundle every source file of a project into one JSON document
    Bundle(BundleArgs),

    /// Split a text bundle into raw-text chunks (JSON on stdout)
    #[command(name = "chunk-text")]
    ChunkText(ChunkTextArgs),

    /// Split a graph's nodes into node-list chunks (JSON on stdout)
    #[command(name = "chunk-graph")]
    ChunkGraph(ChunkGraphArgs),

    /// Compare two graphs by stable id (JSON on stdout)
    Diff(DiffArgs),
}

#[derive(Args)]
struct ScanArgs {
    /// File extension to include (repeatable)
    #[arg(long = "ext", value_name = "EXT", default_values_t = [String::from("py")])]
    extensions: Vec<String>,

    /// Extra directory name to skip (repeatable)
    #[arg(long = "exclude", value_name = "DIR")]
    excluded_dirs: Vec<String>,

    /// Skip files larger than this many bytes
    #[arg(long)]
    max_file_bytes: Option<u64>,
}

impl ScanArgs {
    fn options(&self) -> ScanOptions {
        let mut options = ScanOptions::default().with_extensions(self.extensions.iter().cloned());
        for dir in &self.excluded_dirs {
            options = options.exclude_dir(dir.clone());
        }
        if self.max_file_bytes.is_some() {
            options.max_file_bytes = self.max_file_bytes;
        }
        options
    }
}

#[derive(Args)]
struct GraphArgs {
    /// Project root
    root: PathBuf,

    /// Graph JSON output path
    #[arg(long)]
    out: PathBuf,

    /// Also write the NDJSON stream to this path
    #[arg(long)]
    ndjson: Option<PathBuf>,

    #[command(flatten)]
    scan: ScanArgs,
}

#[derive(Args)]
struct BundleArgs {
    /// Project root
    root: PathBuf,

    /// Bundle JSON output path
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    scan: ScanArgs,
}

#[derive(Args)]
struct BudgetArgs {
    /// Maximum tokens per chunk
    #[arg(long, default_value_t = ChunkerConfig::default().token_budget)]
    budget: usize,

    /// Cap on rendered code per node, in characters (0 = unbounded)
    #[arg(long, default_value_t = ChunkerConfig::default().code_max_chars)]
    code_max_chars: usize,

    /// HuggingFace tokenizer.json used to count tokens
    #[cfg(feature = "hf-tokenizer")]
    #[arg(long)]
    tokenizer: Option<PathBuf>,
}

#[derive(Args)]
struct ChunkTextArgs {
    /// Text bundle produced by `bundle`
    bundle: PathBuf,

    #[command(flatten)]
    budget: BudgetArgs,

    /// Tokens repeated between consecutive chunks
    #[arg(long, default_value_t = ChunkerConfig::default().overlap_tokens)]
    overlap: usize,
}

#[derive(Args)]
struct ChunkGraphArgs {
    /// Graph produced by `graph`
    graph: PathBuf,

    #[command(flatten)]
    budget: BudgetArgs,

    /// Input format
    #[arg(long, value_enum, default_value_t = GraphFormatFlag::Auto)]
    format: GraphFormatFlag,
}

#[derive(Args)]
struct DiffArgs {
    /// Graph of the older build
    old: PathBuf,

    /// Graph of the newer build
    new: PathBuf,

    /// Input format for both graphs
    #[arg(long, value_enum, default_value_t = GraphFormatFlag::Auto)]
    format: GraphFormatFlag,
}

pub fn main_entry() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Graph(args) => run_graph(args)?,
        Commands::Bundle(args) => run_bundle(args)?,
        Commands::ChunkText(args) => run_chunk_text(args)?,
        Commands::ChunkGraph(args) => run_chunk_graph(args)?,
        Commands::Diff(args) => run_diff(args)?,
    }

    Ok(())
}

fn run_graph(args: GraphArgs) -> Result<()> {
    let out = build_graph(&args.root, args.scan.options())
        .with_context(|| format!("Failed to build graph for {}", args.root.display()))?;
    write_graph_artifacts(&out.graph, &args.out, args.ndjson.as_deref())
        .context("Failed to write graph artifacts")?;

    log::info!(
        "Graph: {} files, {} nodes, {} edges ({} calls resolved, {} external)",
        out.stats.files,
        out.stats.nodes,
        out.stats.edges,
        out.stats.resolved_calls,
        out.stats.external_functions
    );
    Ok(())
}

fn run_bundle(args: BundleArgs) -> Result<()> {
    let bundle = TextBundle::collect(&args.root, args.scan.options())
        .with_context(|| format!("Failed to bundle {}", args.root.display()))?;
    bundle
        .save(&args.out)
        .with_context(|| format!("Failed to write {}", args.out.display()))?;
    log::info!("Bundle: {} file(s) -> {}", bundle.summary.file_count, args.out.display());
    Ok(())
}

fn run_chunk_text(args: ChunkTextArgs) -> Result<()> {
    let bundle = TextBundle::load(&args.bundle)
        .with_context(|| format!("Failed to read bundle {}", args.bundle.display()))?;
    let config = ChunkerConfig {
        overlap_tokens: args.overlap,
        ..args.budget.config()
    };
    let chunks = with_counter(&args.budget, config, |chunker| bundle.split(chunker))?;
    print_json(&chunks)
}

fn run_chunk_graph(args: ChunkGraphArgs) -> Result<()> {
    let graph = args.format.load(&args.graph)?;
    let config = ChunkerConfig {
        overlap_tokens: 0,
        ..args.budget.config()
    };
    let chunks = with_counter(&args.budget, config, |chunker| chunker.chunk_graph(&graph))?;
    print_json(&chunks)
}

fn run_diff(args: DiffArgs) -> Result<()> {
    let old = args.format.load(&args.old)?;
    let new = args.format.load(&args.new)?;
    let diff = GraphDiff::between(&old, &new);
    log::info!(
        "Diff: {} added, {} removed, {} modified",
        diff.added.len(),
        diff.removed.len(),
        diff.modified.len()
    );
    print_json(&diff)
}

impl BudgetArgs {
    fn config(&self) -> ChunkerConfig {
        ChunkerConfig {
            token_budget: self.budget,
            code_max_chars: self.code_max_chars,
            ..ChunkerConfig::default()
        }
    }
}

/// Token counter picked by the flags
enum CliCounter {
    Heuristic(HeuristicTokenCounter),
    #[cfg(feature = "hf-tokenizer")]
    Hf(structgraph_chunker::HfTokenCounter),
}

impl TokenCounter for CliCounter {
    fn count(&self, text: &str) -> usize {
        match self {
            CliCounter::Heuristic(counter) => counter.count(text),
            #[cfg(feature = "hf-tokenizer")]
            CliCounter::Hf(counter) => counter.count(text),
        }
    }
}

impl BudgetArgs {
    #[cfg(feature = "hf-tokenizer")]
    fn counter(&self) -> Result<CliCounter> {
        match &self.tokenizer {
            Some(path) => Ok(CliCounter::Hf(
                structgraph_chunker::HfTokenCounter::from_file(path)
                    .context("Failed to load tokenizer")?,
            )),
            None => Ok(CliCounter::Heuristic(HeuristicTokenCounter)),
        }
    }

    #[cfg(not(feature = "hf-tokenizer"))]
    fn counter(&self) -> Result<CliCounter> {
        Ok(CliCounter::Heuristic(HeuristicTokenCounter))
    }
}

/// Run `split` with the token counter the flags ask for
fn with_counter<F>(args: &BudgetArgs, config: ChunkerConfig, split: F) -> Result<Vec<Chunk>>
where
    F: FnOnce(&Chunker<CliCounter>) -> Vec<Chunk>,
{
    let chunker =
        Chunker::with_counter(config, args.counter()?).context("Invalid chunking options")?;
    let chunks = split(&chunker);
    log::info!("{} chunk(s) within {} tokens", chunks.len(), chunker.config().token_budget);
    Ok(chunks)
}
