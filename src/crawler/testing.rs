//! Shared fixtures for the engine's unit tests

use crate::config::RateLimitConfig;
use crate::crawler::coordinator::{CrawlContext, CrawlSettings};
use crate::crawler::extractor::PageFetcher;
use crate::crawler::parser::WikiExtractor;
use crate::state::{ContentRecord, LinkRecord};
use crate::storage::{
    ContentStore, FrontierStore, LinkFilter, SqliteStore, StorageError, StorageResult,
};
use crate::url::LinkScreen;
use crate::{CrawlError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::{tempdir, TempDir};

/// Serves canned pages; every other URL is a 404
#[derive(Debug, Default)]
pub struct StaticFetcher {
    pages: HashMap<String, Vec<u8>>,
    calls: AtomicUsize,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.as_bytes().to_vec());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pages.get(url).cloned().ok_or_else(|| CrawlError::Status {
            url: url.to_string(),
            status: 404,
        })
    }
}

/// A minimal wiki article linking to `links`
pub fn article(heading: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">link</a> "#, href))
        .collect();

    format!(
        r#"<html><head><title>{heading} - Wiki</title></head><body>
<h1 class="firstHeading"><span class="mw-page-title-main">{heading}</span></h1>
<div class="mw-parser-output"><p>About {heading}: {anchors}</p></div>
</body></html>"#
    )
}

pub fn test_settings() -> CrawlSettings {
    CrawlSettings {
        workers: 1,
        max_attempts: Some(5),
        frontier_ceiling: 100,
        content_ceiling: 10,
        refill_batch: 10,
        worker_interval: Duration::from_millis(250),
        overseer_interval: Duration::from_millis(500),
        metrics_every: 15,
    }
}

/// A SQLite store that can be switched offline
///
/// While offline every read and write fails without touching the database.
pub struct FlakyStore {
    inner: SqliteStore,
    offline: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: SqliteStore) -> Self {
        Self {
            inner,
            offline: AtomicBool::new(false),
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check(&self) -> StorageResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "store offline",
            )));
        }
        Ok(())
    }
}

impl FrontierStore for FlakyStore {
    fn insert_link(&self, record: &LinkRecord) -> StorageResult<()> {
        self.check()?;
        self.inner.insert_link(record)
    }

    fn insert_links(&self, records: &[LinkRecord]) -> StorageResult<usize> {
        self.check()?;
        self.inner.insert_links(records)
    }

    fn query_links(
        &self,
        filter: &LinkFilter,
        limit: Option<usize>,
    ) -> StorageResult<Vec<LinkRecord>> {
        self.check()?;
        self.inner.query_links(filter, limit)
    }

    fn delete_links(&self, filter: &LinkFilter) -> StorageResult<usize> {
        self.check()?;
        self.inner.delete_links(filter)
    }

    fn link_exists(&self, url: &str) -> StorageResult<bool> {
        self.check()?;
        self.inner.link_exists(url)
    }

    fn take_pending(
        &self,
        limit: usize,
        max_attempts: Option<u32>,
    ) -> StorageResult<Vec<LinkRecord>> {
        self.check()?;
        self.inner.take_pending(limit, max_attempts)
    }

    fn count_links(&self, filter: &LinkFilter) -> StorageResult<u64> {
        self.check()?;
        self.inner.count_links(filter)
    }

    fn release_idle(&self) -> usize {
        FrontierStore::release_idle(&self.inner)
    }
}

impl ContentStore for FlakyStore {
    fn insert_page(&self, record: &ContentRecord) -> StorageResult<()> {
        self.check()?;
        self.inner.insert_page(record)
    }

    fn insert_pages(&self, records: &[ContentRecord]) -> StorageResult<usize> {
        self.check()?;
        self.inner.insert_pages(records)
    }

    fn count_pages(&self) -> StorageResult<u64> {
        self.check()?;
        self.inner.count_pages()
    }

    fn release_idle(&self) -> usize {
        ContentStore::release_idle(&self.inner)
    }
}

/// Builds a context for `en.wikipedia.org` backed by a temporary SQLite store
pub fn test_context(
    fetcher: impl Into<Arc<StaticFetcher>>,
    configure: impl FnOnce(&mut CrawlSettings),
) -> (TempDir, Arc<CrawlContext>, Arc<SqliteStore>) {
    let dir = tempdir().unwrap();
    let store = Arc::new(SqliteStore::open(&dir.path().join("crawl.db")).unwrap());
    let ctx = context_with_store(fetcher.into(), Arc::clone(&store), configure);
    (dir, ctx, store)
}

/// Like `test_context`, but the store can be taken offline
pub fn flaky_context(
    fetcher: impl Into<Arc<StaticFetcher>>,
    configure: impl FnOnce(&mut CrawlSettings),
) -> (TempDir, Arc<CrawlContext>, Arc<FlakyStore>) {
    let dir = tempdir().unwrap();
    let inner = SqliteStore::open(&dir.path().join("crawl.db")).unwrap();
    let store = Arc::new(FlakyStore::new(inner));
    let ctx = context_with_store(fetcher.into(), Arc::clone(&store), configure);
    (dir, ctx, store)
}

fn context_with_store<S>(
    fetcher: Arc<StaticFetcher>,
    store: Arc<S>,
    configure: impl FnOnce(&mut CrawlSettings),
) -> Arc<CrawlContext>
where
    S: FrontierStore + ContentStore + 'static,
{
    let mut settings = test_settings();
    configure(&mut settings);

    let ctx = CrawlContext::new(
        settings,
        RateLimitConfig {
            per_second: 100,
            per_minute: 10_000,
            per_hour: 100_000,
        },
        LinkScreen::new("https", "en.wikipedia.org", "/wiki"),
        store.clone(),
        store,
        fetcher,
        Arc::new(WikiExtractor::new()),
    );

    Arc::new(ctx)
}
