//! Wikitrawl main entry point
//!
//! This is the command-line interface for the Wikitrawl crawler.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use wikitrawl::config::{load_config_with_hash, Config};
use wikitrawl::crawler::{seed_store, Coordinator};
use wikitrawl::output::{load_statistics, print_statistics};
use wikitrawl::storage::open_store;
use tracing_subscriber::EnvFilter;

/// Wikitrawl: a rate-limited concurrent wiki crawler
///
/// Wikitrawl expands a link frontier from a single seed article, scrapes
/// article content, and spills both to SQLite while every worker shares one
/// global request budget.
#[derive(Parser, Debug)]
#[command(name = "wikitrawl")]
#[command(version)]
#[command(about = "A rate-limited concurrent wiki crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Insert the configured seed URL into the store and exit
    #[arg(long, conflicts_with_all = ["stats", "dry_run"])]
    seed: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["seed", "dry_run"])]
    stats: bool,

    /// Validate config and print the effective settings without crawling
    #[arg(long, conflicts_with_all = ["seed", "stats"])]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.seed {
        handle_seed(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// `RUST_LOG` takes precedence when set.
fn setup_logging(verbose: u8, quiet: bool) {
    let default_filter = if quiet {
        "error"
    } else {
        match verbose {
            0 => "wikitrawl=info,warn",
            1 => "wikitrawl=debug,info",
            2 => "wikitrawl=trace,debug",
            _ => "trace",
        }
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Wikitrawl Dry Run ===\n");

    println!("Crawl:");
    println!("  Seed URL: {}", config.crawl.seed_url);
    println!(
        "  Domain: {}",
        config.crawl.target_domain().unwrap_or_default()
    );
    println!("  Article path: {}", config.crawl.article_path);
    println!("  Workers: {}", config.crawl.workers);
    match config.crawl.attempt_limit() {
        Some(limit) => println!("  Max attempts: {}", limit),
        None => println!("  Max attempts: unbounded"),
    }

    println!("\nRate Limits:");
    println!("  Per second: {}", config.rate_limits.per_second);
    println!("  Per minute: {}", config.rate_limits.per_minute);
    println!("  Per hour: {}", config.rate_limits.per_hour);

    println!("\nBuffers:");
    println!("  Frontier ceiling: {}", config.buffers.frontier_ceiling);
    println!("  Content ceiling: {}", config.buffers.content_ceiling);
    println!("  Refill batch: {}", config.buffers.refill_batch);

    println!("\nSchedule:");
    println!(
        "  Overseer: {} tick(s)/s",
        config.schedule.overseer_frequency
    );
    println!("  Worker: {} tick(s)/s", config.schedule.worker_frequency);
    println!(
        "  Metrics every {} overseer tick(s)",
        config.schedule.metrics_every
    );

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\n✓ Configuration is valid");
}

/// Handles the --seed mode: inserts the seed record
fn handle_seed(config: &Config) -> anyhow::Result<()> {
    let store = open_store(Path::new(&config.output.database_path))
        .with_context(|| format!("Failed to open {}", config.output.database_path))?;

    if seed_store(&store, &config.crawl.seed_url)? {
        println!("✓ Seeded {}", config.crawl.seed_url);
    } else {
        println!("Seed {} is already stored", config.crawl.seed_url);
    }

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let store = open_store(Path::new(&config.output.database_path))
        .with_context(|| format!("Failed to open {}", config.output.database_path))?;

    let stats = load_statistics(&store, &store, config.crawl.attempt_limit())?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config) -> anyhow::Result<()> {
    tracing::info!(
        "Crawling {} with {} worker(s), budget {}/s {}/min {}/h",
        config.crawl.seed_url,
        config.crawl.workers,
        config.rate_limits.per_second,
        config.rate_limits.per_minute,
        config.rate_limits.per_hour
    );

    let coordinator = Coordinator::new(config).context("Failed to start crawler")?;
    let report = coordinator.run().await.context("Crawl failed")?;

    tracing::info!(
        "Crawl finished: {} page(s) and {} link record(s) saved on shutdown",
        report.pages_flushed,
        report.links_flushed
    );

    Ok(())
}
