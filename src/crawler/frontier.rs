//! In-memory link frontier
//!
//! New discoveries enter at the head so they are processed before older
//! pending work. Records that still need a phase re-enter at the tail. The
//! overseer refills from the store when the frontier is empty and trims from
//! the tail when it grows past its ceiling.

use crate::state::LinkRecord;
use crate::{CrawlError, Result};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Shared queue of link records
///
/// Every method takes the lock once; sequences of calls are not atomic.
#[derive(Debug, Default)]
pub struct Frontier {
    queue: Mutex<VecDeque<LinkRecord>>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes the record at the head
    ///
    /// Fails with `EmptyFrontier` when nothing is in memory.
    pub fn pop_front(&self) -> Result<LinkRecord> {
        self.lock().pop_front().ok_or(CrawlError::EmptyFrontier)
    }

    pub fn push_front(&self, record: LinkRecord) {
        self.lock().push_front(record);
    }

    /// Pushes a batch to the head, keeping the batch's own order
    pub fn push_front_all(&self, records: Vec<LinkRecord>) {
        let mut queue = self.lock();
        for record in records.into_iter().rev() {
            queue.push_front(record);
        }
    }

    pub fn push_back(&self, record: LinkRecord) {
        self.lock().push_back(record);
    }

    /// Appends a batch to the tail, keeping the batch's own order
    pub fn extend_back(&self, records: Vec<LinkRecord>) {
        self.lock().extend(records);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns true if a record for `url` is queued
    pub fn contains(&self, url: &str) -> bool {
        self.lock().iter().any(|record| record.url == url)
    }

    /// Pops records from the tail until at most `ceiling` remain
    ///
    /// The removed records are returned in queue order.
    pub fn trim_tail(&self, ceiling: usize) -> Vec<LinkRecord> {
        let mut queue = self.lock();
        if queue.len() <= ceiling {
            return Vec::new();
        }
        queue.split_off(ceiling).into()
    }

    /// Empties the frontier
    pub fn drain_all(&self) -> Vec<LinkRecord> {
        self.lock().drain(..).collect()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<LinkRecord>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
