//! Sync conflict log

#![allow(clippy::cast_possible_wrap)]

use rusqlite::{params, Connection};

use crate::error::Result;
use crate::models::SyncConflict;
use crate::sync::ConflictLog;

/// `SQLite` log of resolved sync conflicts
pub struct SqliteConflictRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteConflictRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Most recent conflicts first
    pub fn list(&self, limit: usize) -> Result<Vec<SyncConflict>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, entity_kind, entity_id, local_updated_at, remote_updated_at,
                    resolved_at, winner, strategy
             FROM sync_conflicts
             ORDER BY resolved_at DESC, id DESC
             LIMIT ?",
        )?;

        let conflicts = stmt
            .query_map(params![limit as i64], |row| {
                Ok(SyncConflict {
                    id: row.get(0)?,
                    entity_kind: row.get(1)?,
                    entity_id: row.get(2)?,
                    local_updated_at: row.get(3)?,
                    remote_updated_at: row.get(4)?,
                    resolved_at: row.get(5)?,
                    winner: row.get(6)?,
                    strategy: row.get(7)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(conflicts)
    }
}

impl ConflictLog for SqliteConflictRepository<'_> {
    fn record(&self, conflict: &SyncConflict) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO sync_conflicts (
                entity_kind, entity_id, local_updated_at, remote_updated_at,
                resolved_at, winner, strategy
            ) VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                conflict.entity_kind,
                conflict.entity_id,
                conflict.local_updated_at,
                conflict.remote_updated_at,
                conflict.resolved_at,
                conflict.winner,
                conflict.strategy,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }
}
