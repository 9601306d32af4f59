//! Collaborator interfaces consumed by the workers
//!
//! Fetching is async and extraction is synchronous CPU work on bytes that are
//! already in memory. Both are trait objects on the shared crawl context so
//! tests can substitute canned pages.

use crate::Result;
use async_trait::async_trait;

/// Fetches raw page bytes
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Returns the body of `url`, or a `Fetch`/`Status` error
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Title, heading and structured text of one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    pub title: String,
    pub heading: String,
    pub content: String,
}

/// Turns fetched bytes into links or content
pub trait Extractor: Send + Sync {
    /// Returns every raw `href` on the page, unfiltered
    fn extract_links(&self, body: &[u8]) -> Result<Vec<String>>;

    fn extract_content(&self, body: &[u8]) -> Result<ExtractedContent>;
}
