//! SQLite-backed calculation history.
//!
//! One row per successful calculation, correlated to a client session by
//! an opaque token the caller supplies. The connection sits behind a
//! mutex; store calls are short blocking sections, which the async
//! handlers tolerate without a dedicated pool.

use chrono::Utc;
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("store lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A persisted calculation, shaped like its wire representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRecord {
    pub id: i64,
    pub expression: String,
    pub result: String,
    pub timestamp: String,
    pub session_id: String,
    pub error_message: Option<String>,
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS calculations (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    expression    TEXT NOT NULL,
    result        TEXT NOT NULL,
    timestamp     TEXT NOT NULL,
    session_id    TEXT NOT NULL,
    error_message TEXT
)";

pub struct HistoryStore {
    conn: Mutex<Connection>,
}

impl HistoryStore {
    /// Open (or create) the store at `path` and ensure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute(SCHEMA, [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Persist one calculation and return the stored row.
    pub fn record(
        &self,
        expression: &str,
        result: &str,
        session_id: &str,
    ) -> StoreResult<CalculationRecord> {
        let timestamp = Utc::now().to_rfc3339();
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO calculations (expression, result, timestamp, session_id)
             VALUES (?1, ?2, ?3, ?4)",
            params![expression, result, timestamp, session_id],
        )?;
        Ok(CalculationRecord {
            id: conn.last_insert_rowid(),
            expression: expression.to_string(),
            result: result.to_string(),
            timestamp,
            session_id: session_id.to_string(),
            error_message: None,
        })
    }

    /// Newest-first history for one session, bounded by `limit`.
    pub fn list(&self, session_id: &str, limit: u32) -> StoreResult<Vec<CalculationRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, expression, result, timestamp, session_id, error_message
             FROM calculations
             WHERE session_id = ?1
             ORDER BY timestamp DESC, id DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![session_id, limit], |row| {
            Ok(CalculationRecord {
                id: row.get(0)?,
                expression: row.get(1)?,
                result: row.get(2)?,
                timestamp: row.get(3)?,
                session_id: row.get(4)?,
                error_message: row.get(5)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Delete one record by id; `false` when no such row existed.
    pub fn delete(&self, id: i64) -> StoreResult<bool> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM calculations WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    /// Remove every record for a session; returns how many went away.
    pub fn clear(&self, session_id: &str) -> StoreResult<usize> {
        let conn = self.lock()?;
        Ok(conn.execute(
            "DELETE FROM calculations WHERE session_id = ?1",
            params![session_id],
        )?)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}
