//! Fowl repository implementation

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT/OFFSET

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use super::conversion_error;
use crate::error::{Error, Result};
use crate::models::{Fowl, FowlId, SyncMetadata, SyncStatus, SyncableEntity};
use crate::sync::LocalStore;

const FOWL_COLUMNS: &str =
    "id, name, breed, owner_id, hatched_on, sync_status, created_at, updated_at";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Trait for fowl storage operations
pub trait FowlRepository {
    /// Register a new fowl
    fn create(
        &self,
        name: &str,
        breed: &str,
        owner_id: &str,
        hatched_on: Option<NaiveDate>,
    ) -> Result<Fowl>;

    /// Get a fowl by ID
    fn get(&self, id: &FowlId) -> Result<Option<Fowl>>;

    /// List fowls, most recently changed first
    fn list(&self, limit: usize, offset: usize) -> Result<Vec<Fowl>>;

    /// List fowls currently owned by `owner_id`
    fn list_by_owner(&self, owner_id: &str, limit: usize, offset: usize) -> Result<Vec<Fowl>>;

    /// IDs starting with `prefix`, for short-ID lookups
    fn list_ids_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<String>>;

    /// Insert or overwrite a fowl as given, metadata included
    fn save(&self, fowl: &Fowl) -> Result<()>;
}

/// `SQLite` implementation of `FowlRepository`
pub struct SqliteFowlRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteFowlRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a fowl from a database row
    fn parse_fowl(row: &rusqlite::Row<'_>) -> rusqlite::Result<Fowl> {
        let id: String = row.get(0)?;
        let hatched_on: Option<String> = row.get(4)?;
        let sync_status: String = row.get(5)?;

        Ok(Fowl {
            id: id.parse().map_err(|error| conversion_error(0, error))?,
            name: row.get(1)?,
            breed: row.get(2)?,
            owner_id: row.get(3)?,
            hatched_on: hatched_on
                .map(|value| NaiveDate::parse_from_str(&value, DATE_FORMAT))
                .transpose()
                .map_err(|error| conversion_error(4, error))?,
            sync: SyncMetadata {
                sync_status: sync_status
                    .parse()
                    .map_err(|error: String| conversion_error(5, error))?,
                created_at: row.get(6)?,
                updated_at: row.get(7)?,
            },
        })
    }

    fn query(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Fowl>> {
        let mut stmt = self.conn.prepare(sql)?;
        let fowls = stmt
            .query_map(params, Self::parse_fowl)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(fowls)
    }
}

fn format_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|date| date.format(DATE_FORMAT).to_string())
}

impl FowlRepository for SqliteFowlRepository<'_> {
    fn create(
        &self,
        name: &str,
        breed: &str,
        owner_id: &str,
        hatched_on: Option<NaiveDate>,
    ) -> Result<Fowl> {
        let name = name.trim();
        let owner_id = owner_id.trim();
        if name.is_empty() || owner_id.is_empty() {
            return Err(Error::InvalidInput(
                "fowl name and owner must not be empty".into(),
            ));
        }

        let mut fowl = Fowl::new(name, breed.trim(), owner_id);
        fowl.hatched_on = hatched_on;
        self.save(&fowl)?;
        Ok(fowl)
    }

    fn get(&self, id: &FowlId) -> Result<Option<Fowl>> {
        let fowl = self
            .conn
            .query_row(
                &format!("SELECT {FOWL_COLUMNS} FROM fowls WHERE id = ?"),
                params![id.as_str()],
                Self::parse_fowl,
            )
            .optional()?;
        Ok(fowl)
    }

    fn list(&self, limit: usize, offset: usize) -> Result<Vec<Fowl>> {
        self.query(
            &format!(
                "SELECT {FOWL_COLUMNS} FROM fowls ORDER BY updated_at DESC LIMIT ? OFFSET ?"
            ),
            params![limit as i64, offset as i64],
        )
    }

    fn list_by_owner(&self, owner_id: &str, limit: usize, offset: usize) -> Result<Vec<Fowl>> {
        self.query(
            &format!(
                "SELECT {FOWL_COLUMNS} FROM fowls
                 WHERE owner_id = ?
                 ORDER BY updated_at DESC
                 LIMIT ? OFFSET ?"
            ),
            params![owner_id, limit as i64, offset as i64],
        )
    }

    fn list_ids_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<String>> {
        let pattern = format!("{}%", prefix.replace(['%', '_'], ""));
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM fowls WHERE id LIKE ? ORDER BY id LIMIT ?")?;
        let ids = stmt
            .query_map(params![pattern, limit as i64], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(ids)
    }

    fn save(&self, fowl: &Fowl) -> Result<()> {
        self.conn.execute(
            "INSERT INTO fowls (id, name, breed, owner_id, hatched_on, sync_status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                breed = excluded.breed,
                owner_id = excluded.owner_id,
                hatched_on = excluded.hatched_on,
                sync_status = excluded.sync_status,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at",
            params![
                fowl.id.as_str(),
                fowl.name,
                fowl.breed,
                fowl.owner_id,
                format_date(fowl.hatched_on),
                fowl.sync.sync_status.as_str(),
                fowl.sync.created_at,
                fowl.sync.updated_at,
            ],
        )?;
        Ok(())
    }
}

impl LocalStore<Fowl> for SqliteFowlRepository<'_> {
    fn list_unsynced(&self) -> Result<Vec<Fowl>> {
        self.query(
            &format!(
                "SELECT {FOWL_COLUMNS} FROM fowls WHERE sync_status != ? ORDER BY updated_at ASC"
            ),
            params![SyncStatus::Synced.as_str()],
        )
    }

    fn set_sync_status(
        &self,
        id: &str,
        expected_updated_at: i64,
        status: SyncStatus,
    ) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE fowls SET sync_status = ? WHERE id = ? AND updated_at = ?",
            params![status.as_str(), id, expected_updated_at],
        )?;
        Ok(rows > 0)
    }

    fn replace(&self, entity: &Fowl, expected_updated_at: i64) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE fowls SET
                name = ?, breed = ?, owner_id = ?, hatched_on = ?,
                sync_status = ?, created_at = ?, updated_at = ?
             WHERE id = ? AND updated_at = ?",
            params![
                entity.name,
                entity.breed,
                entity.owner_id,
                format_date(entity.hatched_on),
                entity.sync.sync_status.as_str(),
                entity.sync.created_at,
                entity.updated_at(),
                entity.id.as_str(),
                expected_updated_at,
            ],
        )?;
        Ok(rows > 0)
    }
}
