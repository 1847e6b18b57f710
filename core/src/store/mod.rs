//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! Subsystems call store methods — they never execute SQL directly.

use crate::{
    error::{ExpError, ExpResult},
    event::{EventLogEntry, ExpEvent},
};
use rusqlite::{params, Connection};

mod allergen;
mod complaint;
mod customer;
mod follow_up;
mod preference;
mod survey;

pub struct ExpStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl ExpStore {
    pub fn open(path: &str) -> ExpResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> ExpResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    /// File path backing this store, if any.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> ExpResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_allergens.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/003_preferences.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/004_surveys.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/005_complaints.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/006_follow_ups.sql"))?;
        Ok(())
    }

    /// Run `f` as one unit of work. Every store call made inside `f`
    /// commits together, or none does if `f` returns an error.
    pub fn in_transaction<T>(&self, f: impl FnOnce(&Self) -> ExpResult<T>) -> ExpResult<T> {
        let tx = self.conn.unchecked_transaction()?;
        let out = f(self)?;
        tx.commit()?;
        Ok(out)
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, source: &str, event: &ExpEvent) -> ExpResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (source, event_type, payload, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                source,
                event.type_name(),
                serde_json::to_string(event)?,
                event.at(),
            ],
        )?;
        Ok(())
    }

    pub fn events(&self) -> ExpResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, source, event_type, payload, created_at
             FROM event_log ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map([], |row| {
                Ok(EventLogEntry {
                    id: Some(row.get(0)?),
                    source: row.get(1)?,
                    event_type: row.get(2)?,
                    payload: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Decode every logged payload of one event type.
    pub fn events_of_type(&self, event_type: &str) -> ExpResult<Vec<ExpEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT payload FROM event_log WHERE event_type = ?1 ORDER BY id ASC",
        )?;
        let payloads = stmt
            .query_map(params![event_type], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        payloads
            .iter()
            .map(|p| serde_json::from_str(p).map_err(ExpError::from))
            .collect()
    }

    pub fn event_count(&self) -> ExpResult<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM event_log", [], |row| row.get(0))?;
        Ok(count)
    }
}
