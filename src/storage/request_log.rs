//! Append-only persistent request log
//!
//! The whole log is one serialized JSON array stored under a fixed key in a
//! key/value table. `append` is a read-modify-write executed entirely inside
//! one critical section, so interleaved appends from concurrent in-flight
//! calls cannot lose updates. Stored entries are never mutated: the log only
//! appends, wholesale-replaces, or clears. Growth is unbounded until the log
//! is manually cleared; there is no eviction or capacity bound.

use rusqlite::{Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{EchoError, Result};
use crate::models::RequestLogEntry;

/// Fixed key the serialized entry array lives under.
pub const STORE_KEY: &str = "netecho-request-log";

const DB_FILE: &str = "netecho_store.sqlite";

pub struct PersistentLog {
    db: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl PersistentLog {
    /// Open (or create) the store under `base_path`.
    pub fn open(base_path: &Path) -> Result<Self> {
        if !base_path.exists() {
            fs::create_dir_all(base_path)?;
        }
        let db_path = base_path.join(DB_FILE);
        let conn = Connection::open(&db_path)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            db: Mutex::new(conn),
            path: Some(db_path),
        })
    }

    /// Open a store that lives only for the process lifetime.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            db: Mutex::new(conn),
            path: None,
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    fn read_raw(conn: &Connection) -> rusqlite::Result<Option<String>> {
        conn.query_row("SELECT value FROM kv WHERE key = ?1", [STORE_KEY], |row| {
            row.get(0)
        })
        .optional()
    }

    fn write_raw(conn: &Connection, raw: &str) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            [STORE_KEY, raw],
        )?;
        Ok(())
    }

    fn parse_entries(raw: Option<String>) -> Vec<RequestLogEntry> {
        match raw {
            Some(text) => match serde_json::from_str(&text) {
                Ok(entries) => entries,
                Err(err) => {
                    // Corrupt stored data reads as an empty log, never fatal.
                    tracing::warn!(error = %err, "stored log unreadable, treating as empty");
                    Vec::new()
                }
            },
            None => Vec::new(),
        }
    }

    /// Append one finalized entry. The read, push, and write-back all happen
    /// under the store lock with no suspension point in between.
    pub fn append(&self, entry: RequestLogEntry) -> Result<()> {
        let conn = self.db.lock().expect("store mutex poisoned");
        let mut entries = Self::parse_entries(Self::read_raw(&conn)?);
        entries.push(entry);
        let raw = serde_json::to_string(&entries)?;
        Self::write_raw(&conn, &raw)?;
        tracing::debug!(total = entries.len(), "appended request log entry");
        Ok(())
    }

    /// Read every stored entry in insertion order. Corrupt or missing data
    /// yields an empty list.
    pub fn read_all(&self) -> Vec<RequestLogEntry> {
        let conn = self.db.lock().expect("store mutex poisoned");
        match Self::read_raw(&conn) {
            Ok(raw) => Self::parse_entries(raw),
            Err(err) => {
                tracing::warn!(error = %err, "store read failed, treating as empty");
                Vec::new()
            }
        }
    }

    /// The store's exact serialized content, `"[]"` when nothing is stored.
    pub fn raw_json(&self) -> String {
        let conn = self.db.lock().expect("store mutex poisoned");
        match Self::read_raw(&conn) {
            Ok(Some(raw)) => raw,
            Ok(None) => "[]".to_string(),
            Err(err) => {
                tracing::warn!(error = %err, "store read failed, treating as empty");
                "[]".to_string()
            }
        }
    }

    /// Wholesale-replace the store with the given entries.
    pub fn replace(&self, entries: &[RequestLogEntry]) -> Result<()> {
        let raw = serde_json::to_string(entries)?;
        let conn = self.db.lock().expect("store mutex poisoned");
        Self::write_raw(&conn, &raw)?;
        Ok(())
    }

    /// Wholesale-replace the store with caller-supplied JSON, written
    /// verbatim. The content must parse as JSON but no schema validation is
    /// performed; on parse failure the store is left unmodified.
    pub fn replace_raw(&self, raw: &str) -> Result<()> {
        serde_json::from_str::<serde_json::Value>(raw).map_err(EchoError::ImportParse)?;
        let conn = self.db.lock().expect("store mutex poisoned");
        Self::write_raw(&conn, raw)?;
        Ok(())
    }

    /// Remove all stored entries.
    pub fn clear(&self) -> Result<()> {
        let conn = self.db.lock().expect("store mutex poisoned");
        conn.execute("DELETE FROM kv WHERE key = ?1", [STORE_KEY])?;
        tracing::debug!("cleared request log");
        Ok(())
    }

    /// Number of readable entries.
    pub fn len(&self) -> usize {
        self.read_all().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a single entry by id.
    pub fn get_by_id(&self, id: &str) -> Option<RequestLogEntry> {
        self.read_all().into_iter().find(|entry| entry.id == id)
    }

    #[allow(dead_code)]
    pub fn db_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
