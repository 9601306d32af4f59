use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Main configuration structure for the crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawl: CrawlConfig,
    #[serde(rename = "rate-limits")]
    pub rate_limits: RateLimitConfig,
    #[serde(default)]
    pub buffers: BufferConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// What to crawl and how many workers to use
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// URL inserted by seed mode
    #[serde(rename = "seed-url")]
    pub seed_url: String,

    /// Host that discovered links must belong to (defaults to the seed's host)
    #[serde(default)]
    pub domain: Option<String>,

    /// Path prefix of article pages on the target site
    #[serde(rename = "article-path", default = "default_article_path")]
    pub article_path: String,

    /// Number of concurrent workers
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Attempts after which an unfinished record is quarantined (0 disables)
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl CrawlConfig {
    /// Returns the configured domain restriction, falling back to the seed's host
    pub fn target_domain(&self) -> Option<String> {
        match &self.domain {
            Some(domain) => Some(domain.to_lowercase()),
            None => Url::parse(&self.seed_url)
                .ok()?
                .host_str()
                .map(str::to_lowercase),
        }
    }

    /// Returns the quarantine threshold, or None when attempts are unbounded
    pub fn attempt_limit(&self) -> Option<u32> {
        (self.max_attempts > 0).then_some(self.max_attempts)
    }
}

/// Global request budget ceilings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RateLimitConfig {
    #[serde(rename = "per-second")]
    pub per_second: u32,

    #[serde(rename = "per-minute")]
    pub per_minute: u32,

    #[serde(rename = "per-hour")]
    pub per_hour: u32,
}

/// In-memory buffer bounds
#[derive(Debug, Clone, Deserialize)]
pub struct BufferConfig {
    /// Frontier size above which the tail is spilled to the store
    #[serde(rename = "frontier-ceiling", default = "default_frontier_ceiling")]
    pub frontier_ceiling: usize,

    /// Content sink size above which it is flushed to the store
    #[serde(rename = "content-ceiling", default = "default_content_ceiling")]
    pub content_ceiling: usize,

    /// Records pulled from the store when the frontier runs dry
    #[serde(rename = "refill-batch", default = "default_refill_batch")]
    pub refill_batch: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            frontier_ceiling: default_frontier_ceiling(),
            content_ceiling: default_content_ceiling(),
            refill_batch: default_refill_batch(),
        }
    }
}

/// Tick frequencies for the overseer and the workers
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    /// Overseer ticks per second
    #[serde(rename = "overseer-frequency", default = "default_overseer_frequency")]
    pub overseer_frequency: f64,

    /// Worker ticks per second
    #[serde(rename = "worker-frequency", default = "default_worker_frequency")]
    pub worker_frequency: f64,

    /// Overseer ticks between two metrics snapshots
    #[serde(rename = "metrics-every", default = "default_metrics_every")]
    pub metrics_every: u32,
}

impl ScheduleConfig {
    pub fn overseer_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.overseer_frequency)
    }

    pub fn worker_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.worker_frequency)
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            overseer_frequency: default_overseer_frequency(),
            worker_frequency: default_worker_frequency(),
            metrics_every: default_metrics_every(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

fn default_article_path() -> String {
    "/wiki".to_string()
}

fn default_workers() -> usize {
    4
}

fn default_max_attempts() -> u32 {
    5
}

fn default_frontier_ceiling() -> usize {
    1000
}

fn default_content_ceiling() -> usize {
    100
}

fn default_refill_batch() -> usize {
    10
}

fn default_overseer_frequency() -> f64 {
    2.0
}

fn default_worker_frequency() -> f64 {
    4.0
}

fn default_metrics_every() -> u32 {
    15
}
