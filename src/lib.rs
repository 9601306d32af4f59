//! Wikitrawl: a rate-limited concurrent wiki crawler
//!
//! This crate implements a crawler that expands a link frontier from a single
//! seed page, scrapes page content, and spills both the frontier and the
//! scraped content to SQLite while a fixed global request budget is shared by
//! all workers.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Unexpected status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Link extraction failed: {reason}")]
    LinkExtract { reason: String },

    #[error("Content extraction failed: {reason}")]
    ContentExtract { reason: String },

    #[error("Frontier is empty")]
    EmptyFrontier,

    #[error("Persistence error: {0}")]
    Persistence(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl CrawlError {
    /// Returns true for the transport/status class of failures
    pub fn is_fetch_error(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Status { .. })
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid value for {key}: '{value}'")]
    Env { key: String, value: String },
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use state::{ContentRecord, LinkRecord, Phase};
pub use crate::url::LinkScreen;
