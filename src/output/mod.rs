//! Output module for crawl metrics and reports
//!
//! This module handles:
//! - Live metrics shared by the workers and reported by the overseer
//! - Statistics loaded from the persistent store

pub mod stats;

pub use stats::{load_statistics, print_statistics, CrawlMetrics, MetricsSnapshot, StoreStatistics};
