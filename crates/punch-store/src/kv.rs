//! The ordered key-value store contract.
//!
//! A single `kv` table over `rusqlite` with a TEXT primary key. SQLite's
//! default BINARY collation compares keys bytewise, so `ORDER BY key` is
//! exactly the lexicographic order the sortable stamps rely on. Batches map
//! to transactions: every put/delete inside one batch lands atomically or
//! not at all, which is the only atomicity mechanism the entry store uses.
//!
//! # Thread Safety
//!
//! [`Store`] wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A single local process is assumed; concurrent external writers to the
//! same file are out of scope.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

use punch_core::{ParseError, ValidationError};

/// Storage-layer errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A point lookup missed.
    #[error("key not found: {key}")]
    NotFound { key: String },
    /// A target resolution found nothing to resolve against.
    #[error("no entries recorded")]
    Empty,
    /// A key or date expression failed to parse.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// A supplied replacement value was not a well-formed record.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A stored value failed to decode as an entry.
    #[error("invalid entry value under {key}: {message}")]
    InvalidEntry { key: String, message: String },
}

/// One scanned key/value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: String,
    pub value: String,
}

/// One operation inside an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    Put { key: String, value: String },
    Delete { key: String },
}

impl BatchOp {
    pub fn put(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        Self::Delete { key: key.into() }
    }
}

/// Bounds and shape of a range scan.
///
/// `gt`/`lt` are exclusive. Order, direction, and limit are pushed down into
/// the query, so a limit-1 reverse scan never materializes the full history.
#[derive(Debug, Clone)]
pub struct Scan {
    pub gt: String,
    pub lt: String,
    pub limit: Option<usize>,
    pub reverse: bool,
}

impl Scan {
    pub fn over(gt: impl Into<String>, lt: impl Into<String>) -> Self {
        Self {
            gt: gt.into(),
            lt: lt.into(),
            limit: None,
            reverse: false,
        }
    }

    #[must_use]
    pub fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Ordered key-value store over a single SQLite file.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Opens a store at the given path, creating it if necessary.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    /// Opens an in-memory store. Useful for testing; the data is destroyed
    /// when the connection closes.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    /// Initializes the schema. Idempotent.
    fn init(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Point lookup. Misses surface as [`StoreError::NotFound`].
    pub fn get(&self, key: &str) -> Result<String, StoreError> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
            })
    }

    /// Writes one key, overwriting any previous value.
    pub fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "
            INSERT INTO kv (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            ",
            params![key, value],
        )?;
        Ok(())
    }

    /// Deletes one key. Deleting an absent key is not an error.
    pub fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Applies a batch of operations as one indivisible unit.
    pub fn batch(&mut self, ops: &[BatchOp]) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        {
            let mut put_stmt = tx.prepare(
                "
                INSERT INTO kv (key, value) VALUES (?1, ?2)
                ON CONFLICT(key) DO UPDATE SET value = excluded.value
                ",
            )?;
            let mut delete_stmt = tx.prepare("DELETE FROM kv WHERE key = ?1")?;
            for op in ops {
                match op {
                    BatchOp::Put { key, value } => {
                        put_stmt.execute(params![key, value])?;
                    }
                    BatchOp::Delete { key } => {
                        delete_stmt.execute(params![key])?;
                    }
                }
            }
        }
        tx.commit()?;
        tracing::debug!(ops = ops.len(), "batch committed");
        Ok(())
    }

    /// Bounded, ordered scan in key order.
    pub fn scan(&self, scan: &Scan) -> Result<Vec<Record>, StoreError> {
        let mut sql =
            String::from("SELECT key, value FROM kv WHERE key > ?1 AND key < ?2 ORDER BY key");
        if scan.reverse {
            sql.push_str(" DESC");
        }
        if let Some(limit) = scan.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![scan.gt, scan.lt], |row| {
            Ok(Record {
                key: row.get(0)?,
                value: row.get(1)?,
            })
        })?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }
}
