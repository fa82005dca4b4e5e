use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rezerag_core::source::DEFAULT_LOCATION;
use rezerag_core::{AutoSource, EnhanceOptions, RagConfig, RagEngine, SearchHit};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "rezerag")]
#[command(about = "Index a character knowledge base and build retrieval-augmented prompts", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConfigArgs {
    /// JSON config file; flags below override it
    #[arg(long, global = true)]
    config: Option<String>,
    /// Number of passages to retrieve
    #[arg(short = 'k', long, global = true)]
    k: Option<usize>,
    #[arg(long, global = true)]
    max_chunk_chars: Option<usize>,
    #[arg(long, global = true)]
    overlap: Option<usize>,
    #[arg(long, global = true)]
    summarize_lines: Option<usize>,
    #[arg(long, global = true)]
    cache_limit: Option<usize>,
}

#[derive(Args)]
struct SourceArgs {
    /// Knowledge text file path or http(s) URL
    #[arg(long, conflicts_with = "snapshot")]
    source: Option<String>,
    /// Snapshot directory written by `index`
    #[arg(long)]
    snapshot: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chunk and index a knowledge source, then save a snapshot
    Index {
        #[arg(long, default_value = DEFAULT_LOCATION)]
        source: String,
        /// Output snapshot directory
        #[arg(long)]
        output: String,
    },
    /// Print the ranked passages for a query as JSON
    Search {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long)]
        query: String,
    },
    /// Print the enhanced prompt for a query
    Prompt {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long)]
        query: String,
    },
    /// Read queries from stdin, one per line, and print an enhanced prompt for each
    Chat {
        #[command(flatten)]
        source: SourceArgs,
    },
}

#[derive(Serialize)]
struct SearchResponse<'a> {
    query: &'a str,
    took_s: f64,
    results: Vec<SearchHit>,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let cli = Cli::parse();
    let config = resolve_config(&cli.config)?;
    let engine = RagEngine::new(config)?;

    match cli.command {
        Commands::Index { source, output } => {
            engine.load(&AutoSource::new()?, &source).await?;
            engine.save_snapshot(&output)?;
            tracing::info!(output = %output, chunks = engine.chunk_count(), "index build complete");
        }
        Commands::Search { source, query } => {
            load(&engine, &source).await?;
            let start = std::time::Instant::now();
            let results = engine.search(&query, None);
            let resp = SearchResponse { query: &query, took_s: start.elapsed().as_secs_f64(), results };
            println!("{}", serde_json::to_string_pretty(&resp)?);
        }
        Commands::Prompt { source, query } => {
            load(&engine, &source).await?;
            println!("{}", engine.enhance_prompt(&query, EnhanceOptions::default()));
        }
        Commands::Chat { source } => {
            load(&engine, &source).await?;
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                if line.trim().is_empty() { continue; }
                println!("{}\n", engine.enhance_prompt(&line, EnhanceOptions::default()));
            }
            let stats = engine.cache_stats();
            tracing::info!(hits = stats.hits, misses = stats.misses, evictions = stats.evictions, "chat finished");
        }
    }
    Ok(())
}

fn resolve_config(args: &ConfigArgs) -> Result<RagConfig> {
    let mut config = match &args.config {
        Some(path) => RagConfig::from_json_file(path)?,
        None => RagConfig::default(),
    };
    if let Some(k) = args.k { config.k = k; }
    if let Some(v) = args.max_chunk_chars { config.max_chunk_chars = v; }
    if let Some(v) = args.overlap { config.overlap = v; }
    if let Some(v) = args.summarize_lines { config.summarize_lines = v; }
    if let Some(v) = args.cache_limit { config.cache_limit = v; }
    Ok(config)
}

async fn load(engine: &RagEngine, args: &SourceArgs) -> Result<()> {
    match (&args.snapshot, &args.source) {
        (Some(dir), _) => engine.load_snapshot(dir).await.with_context(|| format!("loading snapshot {dir}")),
        (None, source) => {
            let location = source.as_deref().unwrap_or(DEFAULT_LOCATION);
            engine.load(&AutoSource::new()?, location).await.map_err(Into::into)
        }
    }
}
