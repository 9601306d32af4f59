//! Crawl statistics
//!
//! Two views of a crawl:
//! - `CrawlMetrics`: live counters shared by workers, reported by the overseer
//! - `StoreStatistics`: totals loaded from the persistent store for `--stats`

use crate::state::BudgetSnapshot;
use crate::storage::{ContentStore, FrontierStore, LinkFilter};
use crate::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::info;

/// Weight of the previous average in the links-per-page rolling average
const AVERAGE_DECAY: f64 = 0.1;

/// Live counters updated by workers
#[derive(Debug, Default)]
pub struct CrawlMetrics {
    scraped: AtomicU64,
    database_hits: AtomicU64,
    buffer_hits: AtomicU64,
    average_links: Mutex<f64>,
}

impl CrawlMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one page pushed to the content sink
    pub fn record_scraped(&self) {
        self.scraped.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a discovered URL that was already in the store
    pub fn record_database_hit(&self) {
        self.database_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a discovered URL that was already in the frontier
    pub fn record_buffer_hit(&self) {
        self.buffer_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Folds one page's accepted link count into the rolling average
    pub fn record_links(&self, count: usize) {
        let mut average = self
            .average_links
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *average = AVERAGE_DECAY * *average + (1.0 - AVERAGE_DECAY) * count as f64;
    }

    pub fn scraped(&self) -> u64 {
        self.scraped.load(Ordering::Relaxed)
    }

    pub fn snapshot(
        &self,
        frontier_len: usize,
        content_len: usize,
        budget: BudgetSnapshot,
    ) -> MetricsSnapshot {
        let average_links = *self
            .average_links
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        MetricsSnapshot {
            frontier_len,
            content_len,
            scraped: self.scraped(),
            average_links,
            budget,
            database_hits: self.database_hits.load(Ordering::Relaxed),
            buffer_hits: self.buffer_hits.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of the running crawl
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub frontier_len: usize,
    pub content_len: usize,
    pub scraped: u64,
    pub average_links: f64,
    pub budget: BudgetSnapshot,
    pub database_hits: u64,
    pub buffer_hits: u64,
}

impl MetricsSnapshot {
    /// Database hits per buffer hit, with the denominator offset by one
    pub fn hit_ratio(&self) -> f64 {
        self.database_hits as f64 / (self.buffer_hits as f64 + 1.0)
    }

    pub fn log(&self) {
        info!(
            frontier = self.frontier_len,
            content = self.content_len,
            scraped = self.scraped,
            average_links = self.average_links,
            per_second = self.budget.per_second,
            per_minute = self.budget.per_minute,
            per_hour = self.budget.per_hour,
            database_hits = self.database_hits,
            buffer_hits = self.buffer_hits,
            hit_ratio = self.hit_ratio(),
            "Crawl metrics"
        );
    }
}

/// Totals loaded from the persistent store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStatistics {
    pub total_links: u64,
    pub pending_links: u64,
    pub completed_links: u64,

    /// None when attempts are unbounded
    pub quarantined_links: Option<u64>,

    pub pages: u64,
}

/// Loads statistics from storage
pub fn load_statistics(
    links: &dyn FrontierStore,
    pages: &dyn ContentStore,
    max_attempts: Option<u32>,
) -> Result<StoreStatistics> {
    let quarantined_links = match max_attempts {
        Some(max_attempts) => Some(links.count_links(&LinkFilter::Quarantined { max_attempts })?),
        None => None,
    };

    Ok(StoreStatistics {
        total_links: links.count_links(&LinkFilter::All)?,
        pending_links: links.count_links(&LinkFilter::Pending)?,
        completed_links: links.count_links(&LinkFilter::Completed)?,
        quarantined_links,
        pages: pages.count_pages()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &StoreStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Links:");
    println!("  Stored: {}", stats.total_links);
    println!("  Pending: {}", stats.pending_links);
    println!("  Completed: {}", stats.completed_links);
    match stats.quarantined_links {
        Some(count) => println!("  Quarantined: {}", count),
        None => println!("  Quarantined: n/a (attempts unbounded)"),
    }
    println!();

    println!("Pages:");
    println!("  Stored: {}", stats.pages);
    println!();
}
