//! Configuration module
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! including the `TRAWL_*` environment overrides.
//!
//! # Example
//!
//! ```no_run
//! use wikitrawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Crawling with {} workers", config.crawl.workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BufferConfig, Config, CrawlConfig, OutputConfig, RateLimitConfig, ScheduleConfig,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, compute_config_hash, load_config, load_config_with_hash, parse_config,
};
