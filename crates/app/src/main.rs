use chrono::Utc;
use clap::{Parser, Subcommand};
use pdf_semantic_core::{
    CharacterNgramEmbedder, ChunkerConfig, Embedder, HttpEmbedder, JsonFileStore, LopdfExtractor,
    SearchEngine,
};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pdf-semantic-search", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Index artifact path
    #[arg(long, default_value = "index.json")]
    index_file: PathBuf,

    /// Embedding model identifier recorded in the index and validated on load
    #[arg(long, default_value = "character-ngram-v1")]
    model_id: String,

    /// Embedding vector dimension
    #[arg(long, default_value = "128")]
    dimensions: usize,

    /// Remote embedding endpoint; the local n-gram embedder is used when unset
    #[arg(long)]
    embed_endpoint: Option<String>,

    /// Bearer token for the remote embedding endpoint
    #[arg(long, env = "PDF_EMBED_API_KEY", hide_env_values = true)]
    embed_api_key: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Extract, chunk, embed, and persist one PDF as the searchable index.
    Index {
        /// PDF document to index
        #[arg(long)]
        pdf: PathBuf,
        /// Approximate characters per chunk
        #[arg(long, default_value = "500")]
        target_chars: usize,
        /// Approximate character overlap between consecutive chunks
        #[arg(long, default_value = "100")]
        overlap_chars: usize,
    },
    /// Rank indexed chunks against a question.
    Search {
        /// The question to answer
        #[arg(long)]
        query: String,
        /// Number of chunks to return
        #[arg(long, default_value = "3")]
        top_k: usize,
    },
    /// Report whether an index is loaded and what it holds.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    let embedder: Box<dyn Embedder + Send + Sync> = match &cli.embed_endpoint {
        Some(endpoint) => Box::new(HttpEmbedder::new(
            endpoint,
            &cli.model_id,
            cli.dimensions,
            cli.embed_api_key.clone(),
        )?),
        None => Box::new(CharacterNgramEmbedder::new(&cli.model_id, cli.dimensions)),
    };

    let chunker = match &cli.command {
        Command::Index {
            target_chars,
            overlap_chars,
            ..
        } => ChunkerConfig {
            target_chars: *target_chars,
            overlap_chars: *overlap_chars,
            ..ChunkerConfig::default()
        },
        _ => ChunkerConfig::default(),
    };

    let engine = SearchEngine::new(
        LopdfExtractor::default(),
        embedder,
        JsonFileStore::new(&cli.index_file),
        chunker,
    );

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "pdf-semantic-search boot"
    );

    match cli.command {
        Command::Index { pdf, .. } => {
            info!(pdf = %pdf.display(), "indexing document");

            let chunk_count = engine.index_document(&pdf).await?;

            let artifact_bytes = std::fs::metadata(&cli.index_file)?.len();
            println!(
                "{} chunks indexed into {} ({:.1} MB)",
                chunk_count,
                cli.index_file.display(),
                artifact_bytes as f64 / (1024.0 * 1024.0)
            );
        }
        Command::Search { query, top_k } => {
            match engine.load_persisted().await {
                Ok(chunk_count) => info!(chunk_count, "index loaded"),
                Err(error) => warn!(%error, "unable to load index"),
            }

            let results = engine.search(&query, top_k).await?;

            println!("query: {query}");
            for result in results {
                let page = result
                    .page
                    .map(|number| number.to_string())
                    .unwrap_or_else(|| "N/A".to_string());
                println!(
                    "[#{}] score={:.4} page={}",
                    result.rank, result.score, page
                );
                println!("{}", preview(&result.text, 600));
            }
        }
        Command::Status => {
            if let Err(error) = engine.load_persisted().await {
                warn!(%error, "unable to load index");
            }

            let status = engine.status();
            println!("has_index: {}", status.has_index);
            println!("chunk_count: {}", status.chunk_count);
            if let Some(model_id) = status.model_id {
                println!("model: {model_id}");
            }
            if let Some(source_path) = status.source_path {
                println!("document: {source_path}");
            }
        }
    }

    Ok(())
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}
