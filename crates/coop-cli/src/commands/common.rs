use std::env;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use coop_core::db::{Database, FowlRepository, TransferRepository};
use coop_core::{Fowl, FowlId, SyncConflict, Transfer, TransferId, VerificationDetails};
use serde::Serialize;

use crate::error::CliError;

const SHORT_ID_LEN: usize = 13;
const PREFIX_MATCH_LIMIT: usize = 3;

#[derive(Debug, Serialize)]
pub struct FowlListItem {
    pub id: String,
    pub name: String,
    pub breed: String,
    pub owner_id: String,
    pub hatched_on: Option<String>,
    pub age_days: Option<i64>,
    pub sync_status: String,
    pub updated_at: i64,
    pub relative_time: String,
}

#[derive(Debug, Serialize)]
pub struct TransferListItem {
    pub id: String,
    pub fowl_id: String,
    pub giver_id: String,
    pub receiver_id: String,
    pub status: String,
    pub verification_details: VerificationDetails,
    pub sync_status: String,
    pub updated_at: i64,
    pub relative_time: String,
}

#[derive(Debug, Serialize)]
pub struct SyncConflictItem {
    pub id: i64,
    pub entity_kind: String,
    pub entity_id: String,
    pub local_updated_at: i64,
    pub remote_updated_at: i64,
    pub resolved_at: i64,
    pub resolved_at_iso: String,
    pub winner: String,
    pub strategy: String,
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("COOP_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("coop")
        .join("coop.db")
}

pub fn open_database(path: &Path) -> Result<Database, CliError> {
    Ok(Database::open(path)?)
}

pub fn resolve_fowl(query: &str, db: &Database) -> Result<Fowl, CliError> {
    let fowls = db.fowls();
    resolve_by_prefix(
        query,
        "fowl",
        |id| match id.parse::<FowlId>() {
            Ok(id) => Ok(fowls.get(&id)?),
            Err(_) => Ok(None),
        },
        |prefix| Ok(fowls.list_ids_by_prefix(prefix, PREFIX_MATCH_LIMIT)?),
    )
}

pub fn resolve_transfer(query: &str, db: &Database) -> Result<Transfer, CliError> {
    let transfers = db.transfers();
    resolve_by_prefix(
        query,
        "transfer",
        |id| match id.parse::<TransferId>() {
            Ok(id) => Ok(transfers.get(&id)?),
            Err(_) => Ok(None),
        },
        |prefix| Ok(transfers.list_ids_by_prefix(prefix, PREFIX_MATCH_LIMIT)?),
    )
}

/// Look a record up by full ID, falling back to a unique ID prefix.
fn resolve_by_prefix<T>(
    query: &str,
    kind: &'static str,
    get: impl Fn(&str) -> Result<Option<T>, CliError>,
    ids_by_prefix: impl Fn(&str) -> Result<Vec<String>, CliError>,
) -> Result<T, CliError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(CliError::EmptyId);
    }

    if let Some(found) = get(query)? {
        return Ok(found);
    }

    let not_found = || CliError::NotFound {
        kind,
        id: query.to_string(),
    };
    let matching_ids = ids_by_prefix(query)?;

    match matching_ids.as_slice() {
        [] => Err(not_found()),
        [only] => get(only.as_str())?.ok_or_else(not_found),
        _ => {
            let options = matching_ids
                .iter()
                .map(|id| short_id(id))
                .collect::<Vec<_>>()
                .join(", ");

            Err(CliError::AmbiguousId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn short_id(id: &str) -> String {
    id.chars().take(SHORT_ID_LEN).collect()
}

/// Parse repeated `--detail key=value` arguments.
pub fn parse_details(raw: &[String]) -> Result<VerificationDetails, CliError> {
    raw.iter()
        .map(|entry| {
            let (key, value) = entry
                .split_once('=')
                .ok_or_else(|| CliError::InvalidDetail(entry.clone()))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(CliError::InvalidDetail(entry.clone()));
            }
            Ok((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, CliError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| CliError::InvalidDate(raw.to_string()))
}

pub fn fowl_to_list_item(fowl: &Fowl) -> FowlListItem {
    let now_ms = Utc::now().timestamp_millis();
    FowlListItem {
        id: fowl.id.to_string(),
        name: fowl.name.clone(),
        breed: fowl.breed.clone(),
        owner_id: fowl.owner_id.clone(),
        hatched_on: fowl.hatched_on.map(|date| date.to_string()),
        age_days: fowl.age_in_days(Utc::now().date_naive()),
        sync_status: fowl.sync.sync_status.as_str().to_string(),
        updated_at: fowl.sync.updated_at,
        relative_time: format_relative_time(fowl.sync.updated_at, now_ms),
    }
}

pub fn transfer_to_list_item(transfer: &Transfer) -> TransferListItem {
    let now_ms = Utc::now().timestamp_millis();
    TransferListItem {
        id: transfer.id.to_string(),
        fowl_id: transfer.fowl_id.to_string(),
        giver_id: transfer.giver_id.clone(),
        receiver_id: transfer.receiver_id.clone(),
        status: transfer.status.as_str().to_string(),
        verification_details: transfer.verification_details.clone(),
        sync_status: transfer.sync.sync_status.as_str().to_string(),
        updated_at: transfer.sync.updated_at,
        relative_time: format_relative_time(transfer.sync.updated_at, now_ms),
    }
}

pub fn sync_conflict_to_item(conflict: &SyncConflict) -> SyncConflictItem {
    SyncConflictItem {
        id: conflict.id,
        entity_kind: conflict.entity_kind.clone(),
        entity_id: conflict.entity_id.clone(),
        local_updated_at: conflict.local_updated_at,
        remote_updated_at: conflict.remote_updated_at,
        resolved_at: conflict.resolved_at,
        resolved_at_iso: format_sync_timestamp(conflict.resolved_at),
        winner: conflict.winner.clone(),
        strategy: conflict.strategy.clone(),
    }
}

pub fn format_fowl_lines(fowls: &[Fowl]) -> Vec<String> {
    let now = Utc::now();
    let now_ms = now.timestamp_millis();
    fowls
        .iter()
        .map(|fowl| {
            let age = fowl
                .age_in_days(now.date_naive())
                .map_or_else(|| "-".to_string(), |days| format!("{days}d"));
            format!(
                "{:<13}  {:<20}  {:<20}  owner={:<12}  age={:<6}  {}",
                short_id(&fowl.id.to_string()),
                fowl.name,
                fowl.breed,
                fowl.owner_id,
                age,
                format_relative_time(fowl.sync.updated_at, now_ms)
            )
        })
        .collect()
}

pub fn format_transfer_lines(transfers: &[Transfer]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    transfers
        .iter()
        .map(|transfer| {
            format!(
                "{:<13}  {:<8}  fowl={}  {} -> {}  {}",
                short_id(&transfer.id.to_string()),
                transfer.status,
                short_id(&transfer.fowl_id.to_string()),
                transfer.giver_id,
                transfer.receiver_id,
                format_relative_time(transfer.sync.updated_at, now_ms)
            )
        })
        .collect()
}

pub fn format_transfer_detail(transfer: &Transfer) -> Vec<String> {
    let mut lines = vec![
        format!("id:       {}", transfer.id),
        format!("fowl:     {}", transfer.fowl_id),
        format!("giver:    {}", transfer.giver_id),
        format!("receiver: {}", transfer.receiver_id),
        format!("status:   {}", transfer.status),
        format!("sync:     {}", transfer.sync.sync_status.as_str()),
        format!("updated:  {}", format_sync_timestamp(transfer.sync.updated_at)),
    ];
    for (key, value) in &transfer.verification_details {
        lines.push(format!("detail:   {key}={value}"));
    }
    lines
}

pub fn format_sync_conflict_lines(conflicts: &[SyncConflict]) -> Vec<String> {
    conflicts
        .iter()
        .map(|conflict| {
            format!(
                "{}  {:<4}  {}={}  local={} remote={}  kept={}",
                format_sync_timestamp(conflict.resolved_at),
                conflict.strategy,
                conflict.entity_kind,
                short_id(&conflict.entity_id),
                conflict.local_updated_at,
                conflict.remote_updated_at,
                conflict.winner
            )
        })
        .collect()
}

pub fn format_sync_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < year {
        format!("{}w ago", diff / week)
    } else {
        format!("{}y ago", diff / year)
    }
}
