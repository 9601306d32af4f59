//! Crawl work units and their results
//!
//! A `LinkRecord` carries two independent completion flags instead of a single
//! state enum: link extraction and content extraction may finish in either
//! order, and a record is only done once both have.

use chrono::{DateTime, Utc};
use std::fmt;

/// A candidate URL to crawl
#[derive(Debug, Clone, PartialEq)]
pub struct LinkRecord {
    /// The page URL
    pub url: String,

    /// URL of the page that linked here (None only for the seed)
    pub parent_url: Option<String>,

    /// Byte length of the parent page, used as a relevance proxy
    pub parent_priority: u64,

    /// Number of failed phases so far
    pub attempts: u32,

    /// Outgoing links have been extracted
    pub links_scraped: bool,

    /// Page content has been extracted
    pub content_scraped: bool,

    /// When the record was created
    pub timestamp: DateTime<Utc>,
}

impl LinkRecord {
    /// Creates the record that starts a crawl
    pub fn seed(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            parent_url: None,
            parent_priority: 0,
            attempts: 0,
            links_scraped: false,
            content_scraped: false,
            timestamp: Utc::now(),
        }
    }

    /// Creates a record for a link found on `parent_url`
    pub fn discovered(url: impl Into<String>, parent_url: &str, parent_priority: u64) -> Self {
        Self {
            parent_url: Some(parent_url.to_string()),
            parent_priority,
            ..Self::seed(url)
        }
    }

    /// Both phases have completed
    pub fn is_complete(&self) -> bool {
        self.links_scraped && self.content_scraped
    }

    /// Returns true if `phase` still has to run for this record
    pub fn needs(&self, phase: Phase) -> bool {
        match phase {
            Phase::Fetch => !self.is_complete(),
            Phase::Links => !self.links_scraped,
            Phase::Content => !self.content_scraped,
        }
    }

    /// Marks a phase as completed
    pub fn complete(&mut self, phase: Phase) {
        match phase {
            Phase::Fetch => {}
            Phase::Links => self.links_scraped = true,
            Phase::Content => self.content_scraped = true,
        }
    }

    /// Records a failed phase
    pub fn record_failure(&mut self) {
        self.attempts = self.attempts.saturating_add(1);
    }

    /// Returns true once `attempts` reaches `limit` without the record being done
    pub fn exhausted(&self, limit: Option<u32>) -> bool {
        match limit {
            Some(limit) => !self.is_complete() && self.attempts >= limit,
            None => false,
        }
    }
}

/// A scraped page's content
#[derive(Debug, Clone, PartialEq)]
pub struct ContentRecord {
    pub url: String,
    pub title: String,
    pub heading: String,

    /// Structured text produced by the extractor
    pub content: String,

    pub timestamp: DateTime<Utc>,
}

impl ContentRecord {
    pub fn new(url: &str, title: String, heading: String, content: String) -> Self {
        Self {
            url: url.to_string(),
            title,
            heading,
            content,
            timestamp: Utc::now(),
        }
    }
}

/// One step of processing a record, used for failure reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Fetching the page bytes
    Fetch,

    /// Extracting and screening outgoing links
    Links,

    /// Extracting title and structured content
    Content,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Links => "links",
            Self::Content => "content",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
