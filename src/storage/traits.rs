//! Storage traits and error types
//!
//! The engine treats persistence as two capabilities: a store for overflowing
//! frontier records and a store for scraped content. Both are synchronous and
//! take `&self`; implementations handle their own interior locking.

use crate::state::{ContentRecord, LinkRecord};
use rusqlite::types::Value;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to open database {path}: {source}")]
    Pool {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Invalid timestamp '{value}': {reason}")]
    Timestamp { value: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Predicate over persisted link records
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkFilter {
    /// Every row
    All,

    /// Rows with at least one phase outstanding
    Pending,

    /// Rows with both phases done
    Completed,

    /// Rows for one exact URL
    Url(String),

    /// Pending rows that reached the attempt limit
    Quarantined { max_attempts: u32 },
}

impl LinkFilter {
    /// Renders the filter as a SQL `WHERE` body plus its bound parameters
    pub(crate) fn to_sql(&self) -> (&'static str, Vec<Value>) {
        match self {
            Self::All => ("1 = 1", Vec::new()),
            Self::Pending => ("(links_scraped = 0 OR content_scraped = 0)", Vec::new()),
            Self::Completed => ("links_scraped = 1 AND content_scraped = 1", Vec::new()),
            Self::Url(url) => ("url = ?1", vec![Value::Text(url.clone())]),
            Self::Quarantined { max_attempts } => (
                "(links_scraped = 0 OR content_scraped = 0) AND attempts >= ?1",
                vec![Value::Integer(i64::from(*max_attempts))],
            ),
        }
    }
}

/// Durable overflow for the link frontier
pub trait FrontierStore: Send + Sync {
    /// Persists one record
    fn insert_link(&self, record: &LinkRecord) -> StorageResult<()>;

    /// Persists a batch of records in one transaction
    fn insert_links(&self, records: &[LinkRecord]) -> StorageResult<usize>;

    /// Returns up to `limit` matching records in insertion order
    fn query_links(&self, filter: &LinkFilter, limit: Option<usize>)
        -> StorageResult<Vec<LinkRecord>>;

    /// Deletes every matching record, returning how many were removed
    fn delete_links(&self, filter: &LinkFilter) -> StorageResult<usize>;

    /// Returns true if any record exists for `url`
    fn link_exists(&self, url: &str) -> StorageResult<bool>;

    /// Removes and returns up to `limit` pending records
    ///
    /// Records are ordered by parent priority, highest first. Rows whose
    /// attempts reached `max_attempts` are left in place. The read and the
    /// delete happen in one transaction and remove exactly the returned rows.
    fn take_pending(&self, limit: usize, max_attempts: Option<u32>)
        -> StorageResult<Vec<LinkRecord>>;

    fn count_links(&self, filter: &LinkFilter) -> StorageResult<u64>;

    /// Closes idle pooled connections, returning how many were closed
    fn release_idle(&self) -> usize;
}

/// Durable sink for scraped content
pub trait ContentStore: Send + Sync {
    fn insert_page(&self, record: &ContentRecord) -> StorageResult<()>;

    /// Persists a batch of pages in one transaction
    fn insert_pages(&self, records: &[ContentRecord]) -> StorageResult<usize>;

    fn count_pages(&self) -> StorageResult<u64>;

    /// Closes idle pooled connections, returning how many were closed
    fn release_idle(&self) -> usize;
}
