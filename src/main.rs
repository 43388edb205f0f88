//! Shelf-Scout main entry point
//!
//! This is the command-line interface for the Shelf-Scout batch scraper.

use anyhow::{bail, Context};
use clap::Parser;
use shelf_scout::cache::{open_cache, RecordCache};
use shelf_scout::config::{load_config_with_hash, Config};
use shelf_scout::engine::{ResolveEngine, ResolveReport};
use shelf_scout::output::{print_statistics, write_results, ResolveStatistics};
use shelf_scout::source::build_adapter;
use shelf_scout::state::{load_batch, Batch};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Shelf-Scout: a polite batch scraper for book metadata
///
/// Shelf-Scout resolves a batch of books against a web source, consulting
/// an append-only cache first and retrying transient failures over
/// bounded passes with generous delays between requests.
#[derive(Parser, Debug)]
#[command(name = "shelf-scout")]
#[command(version = "1.0.0")]
#[command(about = "A polite batch scraper for book metadata", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// JSON batch mapping each index to {"title", "authors"}
    #[arg(short, long, value_name = "BATCH")]
    input: PathBuf,

    /// Where to write the JSON results (overrides output.results-path)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Load config, batch and cache, report what is already cached, and exit
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let batch = load_batch(&cli.input)
        .with_context(|| format!("Failed to load batch from {}", cli.input.display()))?;
    tracing::info!("Loaded {} items from {}", batch.len(), cli.input.display());

    let adapter = build_adapter(&config.source).context("Failed to set up source adapter")?;
    let mut cache = open_cache(&config.cache, adapter.schema().clone())
        .context("Failed to open cache")?;

    if cli.dry_run {
        handle_dry_run(&config, &batch, cache.as_ref());
        return Ok(());
    }

    let token = CancellationToken::new();
    spawn_interrupt_handler(token.clone());

    let engine = ResolveEngine::from_config(&config.engine, adapter, token);

    let (report, fatal) = match engine.resolve(&batch, cache.as_mut()).await {
        Ok(report) => (report, None),
        Err(e) => {
            let message = e.to_string();
            (e.into_report(), Some(message))
        }
    };

    if !cli.quiet {
        print_statistics(&ResolveStatistics::from_report(&report));
    }

    let results_path = cli
        .output
        .clone()
        .or_else(|| config.output.results_path.as_ref().map(PathBuf::from));
    if let Some(path) = results_path {
        save_results(&path, &report)?;
    }

    if let Some(message) = fatal {
        bail!("Run aborted: {}", message);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("shelf_scout=info,warn"),
            1 => EnvFilter::new("shelf_scout=debug,info"),
            2 => EnvFilter::new("shelf_scout=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Cancels the run on Ctrl-C; the engine returns its partial report
fn spawn_interrupt_handler(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current step");
            token.cancel();
        }
    });
}

/// Handles the --dry-run mode: shows what a run would have to fetch
fn handle_dry_run(config: &Config, batch: &Batch, cache: &dyn RecordCache) {
    let cached = batch
        .iter()
        .filter(|(_, item)| cache.contains(&item.title))
        .count();

    println!("=== Shelf-Scout Dry Run ===\n");

    println!("Engine Configuration:");
    println!("  Max passes: {}", config.engine.max_passes);
    println!("  Request delay: {}ms", config.engine.request_delay_ms);
    println!("  Cool-down: {}s", config.engine.cooldown_secs);

    println!("\nSource:");
    println!("  Kind: {}", config.source.kind.as_str());
    if let Some(url) = config.source.effective_base_url() {
        println!("  Base URL: {}", url);
    }

    println!("\nCache:");
    match &config.cache.path {
        Some(path) => println!("  File: {}{}", path, if cache.is_new() { " (new)" } else { "" }),
        None => println!("  In-memory only"),
    }
    println!("  Records: {}", cache.len());

    println!("\nBatch:");
    println!("  Items: {}", batch.len());
    println!("  Already cached: {}", cached);
    println!("  To fetch: {}", batch.len() - cached);

    println!("\n✓ Configuration is valid");
}

fn save_results(path: &Path, report: &ResolveReport) -> anyhow::Result<()> {
    write_results(path, report)
        .with_context(|| format!("Failed to write results to {}", path.display()))?;
    println!("✓ Results written to: {}", path.display());
    Ok(())
}
