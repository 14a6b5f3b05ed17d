//! Summary cache keyed by normalized bill title.
//!
//! Callers that fetch generated bill summaries hold a `SummaryCache` instead
//! of module-level maps, so lifetime and test isolation stay explicit.

use crate::dates::{Clock, SystemClock};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};

pub trait SummaryCache {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    fn has(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Trims, lowercases and collapses whitespace so "Clean  Air Act " and
/// "clean air act" share an entry.
pub fn summary_key(title: &str) -> String {
    title
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

struct MemoryEntry {
    value: String,
    expires_at: OffsetDateTime,
}

pub struct MemoryCache {
    entries: Mutex<HashMap<String, MemoryEntry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Drops expired entries; returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize> {
        let now = self.clock.now();
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("summary cache lock poisoned"))?;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        Ok(before - entries.len())
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SummaryCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let now = self.clock.now();
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("summary cache lock poisoned"))?;
        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Ok(Some(entry.value.clone())),
            Some(_) => {
                debug!(key, "summary cache entry expired");
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let expires_at = self.clock.now() + ttl;
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("summary cache lock poisoned"))?;
        entries.insert(
            key.to_string(),
            MemoryEntry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }
}

pub struct SqliteCache {
    conn: Connection,
    clock: Arc<dyn Clock>,
}

impl SqliteCache {
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Self::from_connection(conn, Arc::new(SystemClock))
    }

    pub fn from_connection(conn: Connection, clock: Arc<dyn Clock>) -> Result<Self> {
        init(&conn)?;
        Ok(Self { conn, clock })
    }

    /// Drops expired rows; returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize> {
        let now = self.clock.now().unix_timestamp();
        let removed = self
            .conn
            .execute("DELETE FROM summaries WHERE expires_at <= ?1", params![now])?;
        Ok(removed)
    }
}

fn init(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS summaries (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL,
          expires_at INTEGER NOT NULL,
          inserted_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now'))
        );

        CREATE INDEX IF NOT EXISTS idx_summaries_expires_at ON summaries(expires_at);
        "#,
    )?;
    Ok(())
}

impl SummaryCache for SqliteCache {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String, i64)> = self
            .conn
            .query_row(
                "SELECT value, expires_at FROM summaries WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((value, expires_at)) = row else {
            return Ok(None);
        };
        if expires_at > self.clock.now().unix_timestamp() {
            return Ok(Some(value));
        }
        if let Err(err) = self
            .conn
            .execute("DELETE FROM summaries WHERE key = ?1", params![key])
        {
            warn!(error = %err, key, "failed to evict expired summary");
        }
        Ok(None)
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let expires_at = (self.clock.now() + ttl).unix_timestamp();
        self.conn.execute(
            r#"
            INSERT INTO summaries (key, value, expires_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
              value=excluded.value,
              expires_at=excluded.expires_at
            "#,
            params![key, value, expires_at],
        )?;
        Ok(())
    }
}
