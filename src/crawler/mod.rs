//! Crawler module for the concurrent crawl engine
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and wiki page extraction
//! - The global three-tier rate limiter
//! - The shared frontier and content buffers
//! - The worker and overseer loops and their coordination

mod content_sink;
mod coordinator;
mod extractor;
mod fetcher;
mod frontier;
mod overseer;
mod parser;
mod rate_limiter;
mod worker;

#[cfg(test)]
mod testing;

pub use content_sink::ContentSink;
pub use coordinator::{
    seed_store, Coordinator, CrawlContext, CrawlSettings, ShutdownReport,
};
pub use extractor::{ExtractedContent, Extractor, PageFetcher};
pub use fetcher::{build_http_client, HttpFetcher};
pub use frontier::Frontier;
pub use overseer::{Overseer, TickReport};
pub use parser::WikiExtractor;
pub use rate_limiter::RateLimiter;
pub use worker::{RecordOutcome, Worker};
