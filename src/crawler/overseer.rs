//! Overseer loop
//!
//! The single unit that moves records between memory and the store. On
//! every tick it flushes the content sink once it passes its ceiling,
//! refills an empty frontier from the store, spills the frontier tail once
//! it passes its ceiling, periodically reports metrics and finally releases
//! idle store connections.

use crate::crawler::coordinator::CrawlContext;
use crate::output::MetricsSnapshot;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error};

/// What one overseer tick did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub pages_flushed: usize,
    pub links_refilled: usize,
    pub links_spilled: usize,
    pub connections_released: usize,

    /// Present on ticks that emitted a metrics snapshot
    pub metrics: Option<MetricsSnapshot>,
}

pub struct Overseer {
    ctx: Arc<CrawlContext>,
    ticks: u64,
}

impl Overseer {
    pub fn new(ctx: Arc<CrawlContext>) -> Self {
        Self { ctx, ticks: 0 }
    }

    /// Ticks until shutdown is signalled
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.ctx.settings.overseer_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!("Overseer started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {}
            }

            self.tick();
        }

        debug!("Overseer stopped after {} tick(s)", self.ticks);
    }

    /// Runs one pass over both buffers
    ///
    /// Store errors are logged and the affected records stay in memory, so
    /// the next tick retries them.
    pub fn tick(&mut self) -> TickReport {
        self.ticks += 1;
        let ctx = &self.ctx;
        let settings = &ctx.settings;
        let mut report = TickReport::default();

        if ctx.content.len() > settings.content_ceiling {
            let pages = ctx.content.drain_all();
            match ctx.content_store.insert_pages(&pages) {
                Ok(count) => {
                    debug!("Flushed {} page(s) to the store", count);
                    report.pages_flushed = count;
                }
                Err(e) => {
                    error!("Failed to flush {} page(s): {}", pages.len(), e);
                    ctx.content.restore(pages);
                }
            }
        }

        if ctx.frontier.is_empty() {
            match ctx
                .frontier_store
                .take_pending(settings.refill_batch, settings.max_attempts)
            {
                Ok(records) => {
                    if !records.is_empty() {
                        debug!("Refilled frontier with {} record(s)", records.len());
                    }
                    report.links_refilled = records.len();
                    ctx.frontier.extend_back(records);
                }
                Err(e) => error!("Failed to refill frontier: {}", e),
            }
        }

        if ctx.frontier.len() > settings.frontier_ceiling {
            let spilled = ctx.frontier.trim_tail(settings.frontier_ceiling);
            match ctx.frontier_store.insert_links(&spilled) {
                Ok(count) => {
                    debug!("Spilled {} record(s) to the store", count);
                    report.links_spilled = count;
                }
                Err(e) => {
                    error!("Failed to spill {} record(s): {}", spilled.len(), e);
                    ctx.frontier.extend_back(spilled);
                }
            }
        }

        if self.ticks % settings.metrics_every == 0 {
            let snapshot = ctx.metrics.snapshot(
                ctx.frontier.len(),
                ctx.content.len(),
                ctx.limiter.snapshot(),
            );
            snapshot.log();
            report.metrics = Some(snapshot);
        }

        report.connections_released =
            ctx.frontier_store.release_idle() + ctx.content_store.release_idle();

        report
    }
}
