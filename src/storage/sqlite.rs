//! SQLite storage implementation
//!
//! One `SqliteStore` backs both the frontier overflow and the content sink.

use crate::state::{ContentRecord, LinkRecord};
use crate::storage::pool::ConnectionPool;
use crate::storage::traits::{
    ContentStore, FrontierStore, LinkFilter, StorageError, StorageResult,
};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::path::Path;

const LINK_COLUMNS: &str = "id, url, parent_url, parent_priority, attempts, links_scraped, \
                            content_scraped, created_at";

/// SQLite storage backend
pub struct SqliteStore {
    pool: ConnectionPool,
}

impl SqliteStore {
    /// Opens or creates the database at `path`
    pub fn open(path: &Path) -> StorageResult<Self> {
        Ok(Self {
            pool: ConnectionPool::open(path)?,
        })
    }
}

impl FrontierStore for SqliteStore {
    fn insert_link(&self, record: &LinkRecord) -> StorageResult<()> {
        self.pool.with_connection(|conn| {
            insert_link_row(conn, record)?;
            Ok(())
        })
    }

    fn insert_links(&self, records: &[LinkRecord]) -> StorageResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        self.pool.with_connection(|conn| {
            let tx = conn.transaction()?;
            for record in records {
                insert_link_row(&tx, record)?;
            }
            tx.commit()?;
            Ok(records.len())
        })
    }

    fn query_links(
        &self,
        filter: &LinkFilter,
        limit: Option<usize>,
    ) -> StorageResult<Vec<LinkRecord>> {
        let (clause, params) = filter.to_sql();
        let limit = limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));
        let sql = format!(
            "SELECT {} FROM links WHERE {} ORDER BY id ASC LIMIT {}",
            LINK_COLUMNS, clause, limit
        );

        self.pool.with_connection(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(params.iter()), link_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows.into_iter().map(|(_, record)| record).collect())
        })
    }

    fn delete_links(&self, filter: &LinkFilter) -> StorageResult<usize> {
        let (clause, params) = filter.to_sql();
        let sql = format!("DELETE FROM links WHERE {}", clause);

        self.pool
            .with_connection(|conn| Ok(conn.execute(&sql, params_from_iter(params.iter()))?))
    }

    fn link_exists(&self, url: &str) -> StorageResult<bool> {
        self.pool.with_connection(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM links WHERE url = ?1)",
                params![url],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    fn take_pending(
        &self,
        limit: usize,
        max_attempts: Option<u32>,
    ) -> StorageResult<Vec<LinkRecord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let max_attempts = max_attempts.map_or(i64::MAX, i64::from);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        self.pool.with_connection(|conn| {
            let tx = conn.transaction()?;

            let taken = {
                let mut stmt = tx.prepare(&format!(
                    "SELECT {} FROM links
                     WHERE (links_scraped = 0 OR content_scraped = 0) AND attempts < ?1
                     ORDER BY parent_priority DESC, id ASC
                     LIMIT ?2",
                    LINK_COLUMNS
                ))?;
                let rows = stmt
                    .query_map(params![max_attempts, limit], link_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            };

            {
                let mut delete = tx.prepare("DELETE FROM links WHERE id = ?1")?;
                for (id, _) in &taken {
                    delete.execute(params![id])?;
                }
            }

            tx.commit()?;
            Ok(taken.into_iter().map(|(_, record)| record).collect())
        })
    }

    fn count_links(&self, filter: &LinkFilter) -> StorageResult<u64> {
        let (clause, params) = filter.to_sql();
        let sql = format!("SELECT COUNT(*) FROM links WHERE {}", clause);

        self.pool.with_connection(|conn| {
            let count: i64 =
                conn.query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?;
            Ok(count as u64)
        })
    }

    fn release_idle(&self) -> usize {
        self.pool.release_idle()
    }
}

impl ContentStore for SqliteStore {
    fn insert_page(&self, record: &ContentRecord) -> StorageResult<()> {
        self.pool.with_connection(|conn| {
            insert_page_row(conn, record)?;
            Ok(())
        })
    }

    fn insert_pages(&self, records: &[ContentRecord]) -> StorageResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        self.pool.with_connection(|conn| {
            let tx = conn.transaction()?;
            for record in records {
                insert_page_row(&tx, record)?;
            }
            tx.commit()?;
            Ok(records.len())
        })
    }

    fn count_pages(&self) -> StorageResult<u64> {
        self.pool.with_connection(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?;
            Ok(count as u64)
        })
    }

    fn release_idle(&self) -> usize {
        self.pool.release_idle()
    }
}

fn insert_link_row(conn: &Connection, record: &LinkRecord) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO links
         (url, parent_url, parent_priority, attempts, links_scraped, content_scraped, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            record.url,
            record.parent_url,
            i64::try_from(record.parent_priority).unwrap_or(i64::MAX),
            record.attempts,
            record.links_scraped,
            record.content_scraped,
            record.timestamp.to_rfc3339(),
        ],
    )
}

fn insert_page_row(conn: &Connection, record: &ContentRecord) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO pages (url, title, heading, content, scraped_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            record.url,
            record.title,
            record.heading,
            record.content,
            record.timestamp.to_rfc3339(),
        ],
    )
}

/// Maps a row selected with `LINK_COLUMNS` to its id and record
fn link_from_row(row: &Row<'_>) -> rusqlite::Result<(i64, LinkRecord)> {
    let created_at: String = row.get(7)?;
    let timestamp = parse_timestamp(&created_at)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?;
    let parent_priority: i64 = row.get(3)?;

    Ok((
        row.get(0)?,
        LinkRecord {
            url: row.get(1)?,
            parent_url: row.get(2)?,
            parent_priority: u64::try_from(parent_priority).unwrap_or(0),
            attempts: row.get(4)?,
            links_scraped: row.get(5)?,
            content_scraped: row.get(6)?,
            timestamp,
        },
    ))
}

fn parse_timestamp(value: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Timestamp {
            value: value.to_string(),
            reason: e.to_string(),
        })
}
