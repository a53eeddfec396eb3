//! Transfer repository implementation

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT/OFFSET

use rusqlite::{params, Connection, OptionalExtension};

use super::conversion_error;
use crate::error::Result;
use crate::models::{
    FowlId, SyncMetadata, SyncStatus, SyncableEntity, Transfer, TransferId, VerificationDetails,
};
use crate::sync::LocalStore;

const TRANSFER_COLUMNS: &str = "id, fowl_id, giver_id, receiver_id, status, \
     verification_details, sync_status, created_at, updated_at";

/// Trait for transfer storage operations
pub trait TransferRepository {
    /// Get a transfer by ID
    fn get(&self, id: &TransferId) -> Result<Option<Transfer>>;

    /// List transfers, most recently changed first
    fn list(&self, limit: usize, offset: usize) -> Result<Vec<Transfer>>;

    /// Every transfer attempt for one fowl, newest first
    fn list_for_fowl(&self, fowl_id: &FowlId) -> Result<Vec<Transfer>>;

    /// IDs starting with `prefix`, for short-ID lookups
    fn list_ids_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<String>>;

    /// Insert or overwrite a transfer as given, metadata included
    fn save(&self, transfer: &Transfer) -> Result<()>;
}

/// `SQLite` implementation of `TransferRepository`
pub struct SqliteTransferRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteTransferRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a transfer from a database row
    fn parse_transfer(row: &rusqlite::Row<'_>) -> rusqlite::Result<Transfer> {
        let id: String = row.get(0)?;
        let fowl_id: String = row.get(1)?;
        let status: String = row.get(4)?;
        let details: String = row.get(5)?;
        let sync_status: String = row.get(6)?;

        Ok(Transfer {
            id: id.parse().map_err(|error| conversion_error(0, error))?,
            fowl_id: fowl_id.parse().map_err(|error| conversion_error(1, error))?,
            giver_id: row.get(2)?,
            receiver_id: row.get(3)?,
            status: status
                .parse()
                .map_err(|error: String| conversion_error(4, error))?,
            verification_details: serde_json::from_str::<VerificationDetails>(&details)
                .map_err(|error| conversion_error(5, error))?,
            sync: SyncMetadata {
                sync_status: sync_status
                    .parse()
                    .map_err(|error: String| conversion_error(6, error))?,
                created_at: row.get(7)?,
                updated_at: row.get(8)?,
            },
        })
    }

    fn query(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Transfer>> {
        let mut stmt = self.conn.prepare(sql)?;
        let transfers = stmt
            .query_map(params, Self::parse_transfer)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(transfers)
    }
}

impl TransferRepository for SqliteTransferRepository<'_> {
    fn get(&self, id: &TransferId) -> Result<Option<Transfer>> {
        let transfer = self
            .conn
            .query_row(
                &format!("SELECT {TRANSFER_COLUMNS} FROM transfers WHERE id = ?"),
                params![id.as_str()],
                Self::parse_transfer,
            )
            .optional()?;
        Ok(transfer)
    }

    fn list(&self, limit: usize, offset: usize) -> Result<Vec<Transfer>> {
        self.query(
            &format!(
                "SELECT {TRANSFER_COLUMNS} FROM transfers ORDER BY updated_at DESC LIMIT ? OFFSET ?"
            ),
            params![limit as i64, offset as i64],
        )
    }

    fn list_for_fowl(&self, fowl_id: &FowlId) -> Result<Vec<Transfer>> {
        self.query(
            &format!(
                "SELECT {TRANSFER_COLUMNS} FROM transfers WHERE fowl_id = ? ORDER BY created_at DESC"
            ),
            params![fowl_id.as_str()],
        )
    }

    fn list_ids_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<String>> {
        let pattern = format!("{}%", prefix.replace(['%', '_'], ""));
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM transfers WHERE id LIKE ? ORDER BY id LIMIT ?")?;
        let ids = stmt
            .query_map(params![pattern, limit as i64], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(ids)
    }

    fn save(&self, transfer: &Transfer) -> Result<()> {
        let details = serde_json::to_string(&transfer.verification_details)?;
        self.conn.execute(
            "INSERT INTO transfers (id, fowl_id, giver_id, receiver_id, status, verification_details, sync_status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                fowl_id = excluded.fowl_id,
                giver_id = excluded.giver_id,
                receiver_id = excluded.receiver_id,
                status = excluded.status,
                verification_details = excluded.verification_details,
                sync_status = excluded.sync_status,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at",
            params![
                transfer.id.as_str(),
                transfer.fowl_id.as_str(),
                transfer.giver_id,
                transfer.receiver_id,
                transfer.status.as_str(),
                details,
                transfer.sync.sync_status.as_str(),
                transfer.sync.created_at,
                transfer.sync.updated_at,
            ],
        )?;
        Ok(())
    }
}

impl LocalStore<Transfer> for SqliteTransferRepository<'_> {
    fn list_unsynced(&self) -> Result<Vec<Transfer>> {
        self.query(
            &format!(
                "SELECT {TRANSFER_COLUMNS} FROM transfers WHERE sync_status != ? ORDER BY updated_at ASC"
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
            "UPDATE transfers SET sync_status = ? WHERE id = ? AND updated_at = ?",
            params![status.as_str(), id, expected_updated_at],
        )?;
        Ok(rows > 0)
    }

    fn replace(&self, entity: &Transfer, expected_updated_at: i64) -> Result<bool> {
        let details = serde_json::to_string(&entity.verification_details)?;
        let rows = self.conn.execute(
            "UPDATE transfers SET
                fowl_id = ?, giver_id = ?, receiver_id = ?, status = ?,
                verification_details = ?, sync_status = ?, created_at = ?, updated_at = ?
             WHERE id = ? AND updated_at = ?",
            params![
                entity.fowl_id.as_str(),
                entity.giver_id,
                entity.receiver_id,
                entity.status.as_str(),
                details,
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
