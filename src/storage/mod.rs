//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the crawler:
//! - SQLite schema management and a small connection pool
//! - Overflow persistence for the link frontier
//! - Persistence of scraped page content

mod pool;
mod schema;
mod sqlite;
mod traits;

pub use pool::ConnectionPool;
pub use sqlite::SqliteStore;
pub use traits::{ContentStore, FrontierStore, LinkFilter, StorageError, StorageResult};

use std::path::Path;

/// Opens or creates the store at `path`
pub fn open_store(path: &Path) -> StorageResult<SqliteStore> {
    SqliteStore::open(path)
}
