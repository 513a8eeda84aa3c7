use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pdfsearch_core::{run_ingest, IngestConfig, PgStore, ServerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;

/// pdfsearch — full-text PDF search service
#[derive(Parser)]
#[command(name = "pdfsearch", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Bind address (default mode only)
    #[arg(short, long, default_value = "0.0.0.0")]
    addr: String,

    /// Bind port (default mode only)
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Postgres connection string (falls back to $PGCONN)
    #[arg(short = 'c', long)]
    pgconn: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk a directory and ingest PDFs into the store
    Index(IndexArgs),
}

#[derive(Parser)]
struct IndexArgs {
    /// Root directory to walk for PDFs
    #[arg(short, long)]
    root: PathBuf,

    /// Skip PDFs with fewer than this many pages
    #[arg(long, default_value_t = 4)]
    min_pages: u32,

    /// Log what would be ingested without writing to the store
    #[arg(long)]
    dryrun: bool,

    /// Postgres connection string (falls back to $PGCONN)
    #[arg(short = 'c', long)]
    pgconn: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Index(args)) => run_index(args).await,
        None => run_serve(cli.addr, cli.port, cli.pgconn).await,
    }
}

fn resolve_pgconn(explicit: Option<String>) -> Result<String> {
    explicit
        .or_else(|| std::env::var("PGCONN").ok())
        .context("no Postgres connection string: pass --pgconn or set $PGCONN")
}

async fn run_index(args: IndexArgs) -> Result<()> {
    let pgconn = resolve_pgconn(args.pgconn)?;

    let mut config = IngestConfig::new(args.root);
    config.min_pages = args.min_pages;
    config.dry_run = args.dryrun;

    let mut store = PgStore::connect(&pgconn).await?;
    store.ensure_schema().await?;
    drop(store);

    let summary = run_ingest(&config, &pgconn).await?;
    tracing::info!(
        seen = summary.files_seen,
        ingested = summary.files_ingested,
        skipped = summary.files_skipped,
        failed = summary.files_failed,
        "ingestion complete"
    );

    Ok(())
}

async fn run_serve(addr: String, port: u16, pgconn: Option<String>) -> Result<()> {
    let pgconn = resolve_pgconn(pgconn)?;
    let mut config = ServerConfig::new(pgconn.clone());
    config.addr = addr;
    config.port = port;
    config.gemini_api_key = std::env::var("GEMINI_API_KEY").ok();
    if let Ok(model) = std::env::var("GEMINI_MODEL") {
        config.gemini_model = model;
    }

    let mut store = PgStore::connect(&pgconn).await?;
    store.ensure_schema().await?;
    drop(store);

    let bind: SocketAddr = format!("{}:{}", config.addr, config.port)
        .parse()
        .context("invalid bind address")?;

    let worker_count = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);

    tracing::info!(%bind, worker_count, "starting server");

    tokio::task::spawn_blocking(move || {
        pdfsearch_server::serve_thread_per_core(
            bind,
            pgconn,
            worker_count,
            config.cache_capacity,
            std::time::Duration::from_secs(config.cache_ttl_secs),
            config.gemini_api_key,
            config.gemini_model,
        )
    })
    .await
    .context("server task panicked")??;

    Ok(())
}
