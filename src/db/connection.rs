//! Database connection management
//!
//! SQLite connection pool for the local snapshot store.

use std::path::Path;
use std::sync::Arc;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use thiserror::Error;

/// Applied to every file-backed connection. The schema has no foreign keys:
/// a snapshot may reference units it does not define.
const FILE_PRAGMAS: &str = "PRAGMA journal_mode = WAL;
                            PRAGMA synchronous = NORMAL;
                            PRAGMA busy_timeout = 5000;";

/// The store is read far more than written; one importer plus a few readers
const FILE_POOL_SIZE: u32 = 4;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(#[from] r2d2::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type DbResult<T> = Result<T, DbError>;

/// Pool of connections to the snapshot store
#[derive(Clone)]
pub struct Database {
    pool: Arc<Pool<SqliteConnectionManager>>,
}

impl Database {
    /// Open (or create) the store at `path`
    pub fn new<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI;
        let manager = SqliteConnectionManager::file(path)
            .with_flags(flags)
            .with_init(|conn| conn.execute_batch(FILE_PRAGMAS));

        Self::pooled(manager, FILE_POOL_SIZE)
    }

    /// Single-connection in-memory store; every pooled connection to
    /// `:memory:` would otherwise be its own empty database
    pub fn in_memory() -> DbResult<Self> {
        Self::pooled(SqliteConnectionManager::memory(), 1)
    }

    fn pooled(manager: SqliteConnectionManager, max_size: u32) -> DbResult<Self> {
        let pool = Pool::builder().max_size(max_size).build(manager)?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    pub fn get_conn(&self) -> DbResult<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    /// Run `f` on a pooled connection
    pub fn with_conn<F, T>(&self, f: F) -> DbResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> DbResult<T>,
    {
        f(&*self.get_conn()?)
    }

    /// Run `f` inside a transaction; commits only if it returns `Ok`,
    /// otherwise the transaction is rolled back on drop
    pub fn with_transaction<F, T>(&self, f: F) -> DbResult<T>
    where
        F: FnOnce(&rusqlite::Transaction) -> DbResult<T>,
    {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        f(&tx).and_then(|value| {
            tx.commit()?;
            Ok(value)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(db: &Database) -> i64 {
        db.with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))?))
            .unwrap()
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| Ok(conn.execute_batch("CREATE TABLE t (id INTEGER)")?))
            .unwrap();

        let failed: DbResult<()> = db.with_transaction(|tx| {
            tx.execute("INSERT INTO t (id) VALUES (1)", [])?;
            tx.execute("INSERT INTO missing (id) VALUES (1)", [])?;
            Ok(())
        });
        assert!(failed.is_err());
        assert_eq!(count(&db), 0);

        db.with_transaction(|tx| Ok(tx.execute("INSERT INTO t (id) VALUES (2)", [])?))
            .unwrap();
        assert_eq!(count(&db), 1);
    }

    #[test]
    fn test_file_store_uses_wal() {
        let path = std::env::temp_dir().join(format!("grocy_units_wal_{}.db", std::process::id()));
        let db = Database::new(&path).unwrap();

        let mode: String = db
            .with_conn(|conn| Ok(conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?))
            .unwrap();
        let foreign_keys: i64 = db
            .with_conn(|conn| Ok(conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
        assert_eq!(foreign_keys, 0);

        drop(db);
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }
}
