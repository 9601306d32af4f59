//! Worker loop
//!
//! A worker repeatedly takes the record at the head of the frontier, waits
//! for the global rate budget, fetches the page and runs whichever of the two
//! phases the record still needs. Phase failures never escape the worker:
//! each one is logged and counted against the record's attempts. The record
//! then goes back to the tail of the frontier, or to the store once it has
//! used up its attempts.

use crate::crawler::coordinator::CrawlContext;
use crate::state::{ContentRecord, LinkRecord, Phase};
use crate::{CrawlError, Result};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, trace, warn};

/// Where a processed record ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Pushed back to the frontier tail
    Requeued,

    /// Written to the store after reaching the attempt limit
    Quarantined,

    /// Returned to the frontier head because shutdown was signalled while
    /// waiting for the rate budget
    Interrupted,
}

pub struct Worker {
    id: usize,
    ctx: Arc<CrawlContext>,
}

impl Worker {
    pub fn new(id: usize, ctx: Arc<CrawlContext>) -> Self {
        Self { id, ctx }
    }

    /// Processes records on every tick until shutdown is signalled
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.ctx.settings.worker_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!("Worker {} started", self.id);

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {}
            }

            if self.process_next(&mut shutdown).await == Some(RecordOutcome::Interrupted) {
                break;
            }
        }

        debug!("Worker {} stopped", self.id);
    }

    /// Takes one record from the frontier and processes it
    ///
    /// Done records go straight back to the tail without a fetch or a rate
    /// token. Returns None when the frontier is empty.
    pub async fn process_next(
        &self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Option<RecordOutcome> {
        let record = self.ctx.frontier.pop_front().ok()?;
        if record.is_complete() {
            self.ctx.frontier.push_back(record);
            return Some(RecordOutcome::Requeued);
        }

        tokio::select! {
            _ = shutdown.changed() => {
                self.ctx.frontier.push_front(record);
                return Some(RecordOutcome::Interrupted);
            }
            _ = self.ctx.limiter.acquire() => {}
        }

        Some(self.handle(record).await)
    }

    /// Fetches `record` and runs its outstanding phases
    ///
    /// The caller has already been admitted by the rate limiter.
    pub async fn handle(&self, mut record: LinkRecord) -> RecordOutcome {
        match self.ctx.fetcher.fetch(&record.url).await {
            Ok(body) => {
                if record.needs(Phase::Links) {
                    match self.scrape_links(&record, &body) {
                        Ok(discovered) => {
                            trace!("{}: {} new link(s)", record.url, discovered);
                            record.complete(Phase::Links);
                        }
                        Err(e) => self.fail(&mut record, Phase::Links, &e),
                    }
                }

                if record.needs(Phase::Content) {
                    match self.scrape_content(&record, &body) {
                        Ok(()) => record.complete(Phase::Content),
                        Err(e) => self.fail(&mut record, Phase::Content, &e),
                    }
                }
            }
            Err(e) => self.fail(&mut record, Phase::Fetch, &e),
        }

        self.requeue(record)
    }

    /// Extracts, screens and enqueues the page's unseen links
    ///
    /// New records are pushed to the frontier head only once every link has
    /// been checked, so a store error leaves the frontier untouched.
    fn scrape_links(&self, record: &LinkRecord, body: &[u8]) -> Result<usize> {
        let raw = self.ctx.extractor.extract_links(body)?;
        let accepted = self.ctx.screen.screen(&record.url, raw);
        self.ctx.metrics.record_links(accepted.len());

        let parent_priority = body.len() as u64;
        let mut discovered = Vec::new();
        for url in accepted {
            if self.ctx.frontier.contains(&url) {
                self.ctx.metrics.record_buffer_hit();
                continue;
            }
            if self.ctx.frontier_store.link_exists(&url)? {
                self.ctx.metrics.record_database_hit();
                continue;
            }
            discovered.push(LinkRecord::discovered(url, &record.url, parent_priority));
        }

        let count = discovered.len();
        self.ctx.frontier.push_front_all(discovered);
        Ok(count)
    }

    fn scrape_content(&self, record: &LinkRecord, body: &[u8]) -> Result<()> {
        let extracted = self.ctx.extractor.extract_content(body)?;
        self.ctx.content.push(ContentRecord::new(
            &record.url,
            extracted.title,
            extracted.heading,
            extracted.content,
        ));
        self.ctx.metrics.record_scraped();
        Ok(())
    }

    fn fail(&self, record: &mut LinkRecord, phase: Phase, error: &CrawlError) {
        record.record_failure();
        warn!(
            worker = self.id,
            url = %record.url,
            phase = %phase,
            attempts = record.attempts,
            error = %error,
            "Phase failed"
        );
    }

    fn requeue(&self, record: LinkRecord) -> RecordOutcome {
        if record.exhausted(self.ctx.settings.max_attempts) {
            match self.ctx.frontier_store.insert_link(&record) {
                Ok(()) => {
                    warn!(
                        url = %record.url,
                        attempts = record.attempts,
                        "Record quarantined"
                    );
                    return RecordOutcome::Quarantined;
                }
                Err(e) => error!("Failed to quarantine {}: {}", record.url, e),
            }
        }

        self.ctx.frontier.push_back(record);
        RecordOutcome::Requeued
    }
}
