//! SQLite connection pool
//!
//! Connections are opened on demand, lent out for the duration of one store
//! operation and then returned to an idle list. The overseer closes the idle
//! list on every tick so pool pressure never accumulates across ticks.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{StorageError, StorageResult};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::trace;

/// How long a connection waits on a locked database before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct ConnectionPool {
    path: PathBuf,
    idle: Mutex<Vec<Connection>>,
}

impl ConnectionPool {
    /// Opens the database at `path`, creating the file and schema if needed
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let pool = Self {
            path: path.to_path_buf(),
            idle: Mutex::new(Vec::new()),
        };

        let conn = pool.connect()?;
        initialize_schema(&conn)?;
        pool.idle_list().push(conn);

        Ok(pool)
    }

    /// Runs `f` on a pooled connection and returns the connection afterwards
    ///
    /// A connection whose operation failed is closed rather than reused.
    pub fn with_connection<T, F>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&mut Connection) -> StorageResult<T>,
    {
        let pooled = self.idle_list().pop();
        let mut conn = match pooled {
            Some(conn) => conn,
            None => self.connect()?,
        };

        let result = f(&mut conn);
        if result.is_ok() {
            self.idle_list().push(conn);
        }
        result
    }

    /// Closes every idle connection
    pub fn release_idle(&self) -> usize {
        let released: Vec<Connection> = self.idle_list().drain(..).collect();
        let count = released.len();
        drop(released);
        if count > 0 {
            trace!("Released {} idle connection(s)", count);
        }
        count
    }

    pub fn idle_count(&self) -> usize {
        self.idle_list().len()
    }

    fn idle_list(&self) -> MutexGuard<'_, Vec<Connection>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn connect(&self) -> StorageResult<Connection> {
        let conn = Connection::open(&self.path).map_err(|source| StorageError::Pool {
            path: self.path.display().to_string(),
            source,
        })?;

        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        Ok(conn)
    }
}
