//! Database connection management for the embedded backend.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] behind a mutex so
//! the document store and the account registry can share it across async
//! tasks, and guarantees that migrations run before any other operation.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use crate::error::{BackendError, Result};

use super::migrations;

/// Shared handle to the embedded SQLite database.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self> {
        tracing::info!(path = %path.display(), "opening backend database");
        let conn = Connection::open(path)?;
        Self::configure(conn)
    }

    /// Open an in-memory database.  Every handle is independent, which makes
    /// this the natural choice for tests and throwaway mock sessions.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure(conn)
    }

    fn configure(conn: Connection) -> Result<Self> {
        // Recommended SQLite settings.
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run_migrations(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run `f` with exclusive access to the underlying connection.
    pub fn with<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let guard = self.conn.lock().map_err(|_| BackendError::Poisoned)?;
        f(&guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_at_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wayfarer.db");

        let db = Database::open_at(&path).expect("should open");
        db.with(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
            assert_eq!(count, 0);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn in_memory_has_schema() {
        let db = Database::in_memory().unwrap();
        db.with(|conn| {
            conn.prepare("SELECT id FROM accounts")?;
            Ok(())
        })
        .unwrap();
    }
}
