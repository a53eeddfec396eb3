//! Database connection management

use crate::error::Result;
use rusqlite::Connection;
use std::path::Path;

use super::migrations;
use super::{SqliteConflictRepository, SqliteFowlRepository, SqliteTransferRepository};

/// Database wrapper for `SQLite` connections
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open a database at the given path, creating it if it doesn't exist
    ///
    /// Runs migrations automatically.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let database = Self {
            conn: Connection::open(path)?,
        };
        database.configure(true)?;
        database.migrate()?;
        tracing::debug!("Opened database at {}", path.display());
        Ok(database)
    }

    /// Open an in-memory database (useful for testing)
    pub fn open_in_memory() -> Result<Self> {
        let database = Self {
            conn: Connection::open_in_memory()?,
        };
        database.configure(false)?;
        database.migrate()?;
        Ok(database)
    }

    /// Configure `SQLite` for optimal performance
    fn configure(&self, on_disk: bool) -> Result<()> {
        // WAL is unavailable for in-memory databases
        if on_disk {
            self.conn
                .execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")?;
        }
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(())
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        migrations::run(&self.conn)
    }

    /// Get a reference to the underlying connection
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Fowl repository over this connection
    pub const fn fowls(&self) -> SqliteFowlRepository<'_> {
        SqliteFowlRepository::new(&self.conn)
    }

    /// Transfer repository over this connection
    pub const fn transfers(&self) -> SqliteTransferRepository<'_> {
        SqliteTransferRepository::new(&self.conn)
    }

    /// Sync conflict log over this connection
    pub const fn conflicts(&self) -> SqliteConflictRepository<'_> {
        SqliteConflictRepository::new(&self.conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::FowlRepository;
    use tempfile::tempdir;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        let enabled: i32 = db
            .connection()
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_open_on_disk_uses_wal() {
        let tmp = tempdir().unwrap();
        let db = Database::open(tmp.path().join("coop.db")).unwrap();
        let mode: String = db
            .connection()
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode, "wal");
    }

    #[test]
    fn test_open_creates_parent_dirs_and_persists() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("nested").join("coop.db");

        let id = {
            let db = Database::open(&path).unwrap();
            db.fowls()
                .create("Ruby", "Silkie", "user-a", None)
                .unwrap()
                .id
        };

        let reopened = Database::open(&path).unwrap();
        assert!(reopened.fowls().get(&id).unwrap().is_some());
    }
}
