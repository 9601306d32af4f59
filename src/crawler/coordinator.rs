//! Crawler coordinator - shared state and task orchestration
//!
//! This module owns everything the concurrent units share and drives their
//! lifecycle:
//! - Building the shared crawl context from the configuration
//! - Spawning the overseer and the workers
//! - Signalling shutdown and draining the in-memory buffers to the store
//! - Seeding an empty store

use crate::config::{Config, RateLimitConfig};
use crate::crawler::content_sink::ContentSink;
use crate::crawler::extractor::{Extractor, PageFetcher};
use crate::crawler::fetcher::HttpFetcher;
use crate::crawler::frontier::Frontier;
use crate::crawler::overseer::Overseer;
use crate::crawler::parser::WikiExtractor;
use crate::crawler::rate_limiter::RateLimiter;
use crate::crawler::worker::Worker;
use crate::output::CrawlMetrics;
use crate::state::LinkRecord;
use crate::storage::{ContentStore, FrontierStore, SqliteStore};
use crate::url::LinkScreen;
use crate::Result;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Tunables read by the workers and the overseer
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub workers: usize,

    /// Quarantine threshold, None when attempts are unbounded
    pub max_attempts: Option<u32>,

    pub frontier_ceiling: usize,
    pub content_ceiling: usize,
    pub refill_batch: usize,
    pub worker_interval: Duration,
    pub overseer_interval: Duration,

    /// Overseer ticks between metrics snapshots
    pub metrics_every: u64,
}

impl CrawlSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            workers: config.crawl.workers,
            max_attempts: config.crawl.attempt_limit(),
            frontier_ceiling: config.buffers.frontier_ceiling,
            content_ceiling: config.buffers.content_ceiling,
            refill_batch: config.buffers.refill_batch,
            worker_interval: config.schedule.worker_interval(),
            overseer_interval: config.schedule.overseer_interval(),
            metrics_every: u64::from(config.schedule.metrics_every.max(1)),
        }
    }
}

/// State shared by the overseer and every worker
///
/// Each container only exposes single-lock operations. Multi-step sequences
/// such as "check the store, then enqueue" can race across workers; the
/// resulting duplicate crawls are tolerated.
pub struct CrawlContext {
    pub frontier: Frontier,
    pub content: ContentSink,
    pub limiter: RateLimiter,
    pub metrics: CrawlMetrics,
    pub frontier_store: Arc<dyn FrontierStore>,
    pub content_store: Arc<dyn ContentStore>,
    pub fetcher: Arc<dyn PageFetcher>,
    pub extractor: Arc<dyn Extractor>,
    pub screen: LinkScreen,
    pub settings: CrawlSettings,
}

impl CrawlContext {
    /// Creates a context with empty buffers and a full rate budget
    pub fn new(
        settings: CrawlSettings,
        limits: RateLimitConfig,
        screen: LinkScreen,
        frontier_store: Arc<dyn FrontierStore>,
        content_store: Arc<dyn ContentStore>,
        fetcher: Arc<dyn PageFetcher>,
        extractor: Arc<dyn Extractor>,
    ) -> Self {
        Self {
            frontier: Frontier::new(),
            content: ContentSink::new(),
            limiter: RateLimiter::new(limits),
            metrics: CrawlMetrics::new(),
            frontier_store,
            content_store,
            fetcher,
            extractor,
            screen,
            settings,
        }
    }

    /// Wires the SQLite store, HTTP fetcher and wiki extractor from `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = Arc::new(SqliteStore::open(Path::new(&config.output.database_path))?);
        let fetcher = HttpFetcher::from_config(&config.user_agent)?;
        let screen = LinkScreen::from_config(&config.crawl)?;

        Ok(Self::new(
            CrawlSettings::from_config(config),
            config.rate_limits,
            screen,
            store.clone(),
            store,
            Arc::new(fetcher),
            Arc::new(WikiExtractor::new()),
        ))
    }
}

/// Records moved to the store when the crawl stopped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    pub pages_flushed: usize,
    pub links_flushed: usize,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    ctx: Arc<CrawlContext>,
}

impl Coordinator {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::with_context(Arc::new(CrawlContext::from_config(
            config,
        )?)))
    }

    pub fn with_context(ctx: Arc<CrawlContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &Arc<CrawlContext> {
        &self.ctx
    }

    /// Runs until Ctrl-C
    pub async fn run(&self) -> Result<ShutdownReport> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Runs the overseer and the workers until `shutdown` completes
    ///
    /// Every task stops at its next suspension point. A worker that is
    /// mid-record finishes it first. Once all tasks have stopped, both
    /// buffers are drained to the store.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<ShutdownReport>
    where
        F: Future<Output = ()>,
    {
        let (stop_tx, stop_rx) = watch::channel(false);
        let settings = &self.ctx.settings;

        info!(
            workers = settings.workers,
            frontier_ceiling = settings.frontier_ceiling,
            content_ceiling = settings.content_ceiling,
            "Starting crawl"
        );

        let mut handles = Vec::with_capacity(settings.workers + 1);
        handles.push(tokio::spawn(
            Overseer::new(Arc::clone(&self.ctx)).run(stop_rx.clone()),
        ));
        for id in 0..settings.workers {
            handles.push(tokio::spawn(
                Worker::new(id, Arc::clone(&self.ctx)).run(stop_rx.clone()),
            ));
        }
        drop(stop_rx);

        shutdown.await;
        info!("Shutdown requested, stopping workers");
        // Receivers are still held by the tasks, so this cannot fail
        let _ = stop_tx.send(true);

        for handle in handles {
            if let Err(e) = handle.await {
                error!("Crawl task failed: {}", e);
            }
        }

        let report = self.flush()?;
        info!(
            pages = report.pages_flushed,
            links = report.links_flushed,
            scraped = self.ctx.metrics.scraped(),
            "Crawl stopped"
        );
        Ok(report)
    }

    /// Moves everything held in memory to the store
    ///
    /// On a store error the affected records are put back.
    pub fn flush(&self) -> Result<ShutdownReport> {
        let pages = self.ctx.content.drain_all();
        let pages_flushed = match self.ctx.content_store.insert_pages(&pages) {
            Ok(count) => count,
            Err(e) => {
                self.ctx.content.restore(pages);
                return Err(e.into());
            }
        };

        let links = self.ctx.frontier.drain_all();
        let links_flushed = match self.ctx.frontier_store.insert_links(&links) {
            Ok(count) => count,
            Err(e) => {
                self.ctx.frontier.extend_back(links);
                return Err(e.into());
            }
        };

        Ok(ShutdownReport {
            pages_flushed,
            links_flushed,
        })
    }
}

/// Inserts the seed record unless the URL is already stored
///
/// Returns true if a record was inserted.
pub fn seed_store(store: &dyn FrontierStore, seed_url: &str) -> Result<bool> {
    if store.link_exists(seed_url)? {
        warn!("Seed {} is already stored, nothing inserted", seed_url);
        return Ok(false);
    }

    store.insert_link(&LinkRecord::seed(seed_url))?;
    info!("Inserted seed {}", seed_url);
    Ok(true)
}
