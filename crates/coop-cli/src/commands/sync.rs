use std::path::{Path, PathBuf};

use coop_core::db::{Database, SqliteRemoteStore};
use coop_core::sync::{SyncReport, Synchronizer};
use coop_core::{Fowl, Transfer};

use crate::cli::SyncCommands;
use crate::commands::common::{format_sync_conflict_lines, open_database, sync_conflict_to_item};
use crate::config::CliConfig;
use crate::error::CliError;

pub async fn run(
    command: Option<SyncCommands>,
    remote: Option<PathBuf>,
    db_path: &Path,
) -> Result<(), CliError> {
    match command {
        None => sync_now(remote, db_path).await,
        Some(SyncCommands::Conflicts { limit, json }) => list_conflicts(limit, json, db_path),
    }
}

async fn sync_now(remote: Option<PathBuf>, db_path: &Path) -> Result<(), CliError> {
    let config = CliConfig::load().map_err(CliError::Config)?;
    let remote_path = config
        .resolve_remote_path(remote)
        .ok_or(CliError::SyncNotConfigured)?;

    let db = open_database(db_path)?;
    let remote = SqliteRemoteStore::open(&remote_path)?;
    let report = sync_all(&db, &remote, &config).await?;

    tracing::info!(remote = %remote_path.display(), ?report, "Sync finished");
    println!("{}", format_report(&report));
    if report.failed > 0 {
        println!("Records that failed stay queued and are retried on the next sync.");
    }
    Ok(())
}

/// Reconcile fowl before transfers so ownership lands ahead of the handover records.
pub async fn sync_all(
    db: &Database,
    remote: &SqliteRemoteStore,
    config: &CliConfig,
) -> Result<SyncReport, CliError> {
    let conflicts = db.conflicts();
    let synchronizer = Synchronizer::new(config.sync_config()).with_conflict_log(&conflicts);

    let mut report = synchronizer
        .sync_kind::<Fowl, _, _>(&db.fowls(), remote)
        .await?;
    report += synchronizer
        .sync_kind::<Transfer, _, _>(&db.transfers(), remote)
        .await?;
    Ok(report)
}

pub fn format_report(report: &SyncReport) -> String {
    if report.examined == 0 {
        return "Already in sync.".to_string();
    }
    format!(
        "Synced {} record(s): {} uploaded, {} downloaded, {} failed, {} deferred",
        report.examined, report.uploaded, report.downloaded, report.failed, report.deferred
    )
}

fn list_conflicts(limit: usize, json: bool, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let conflicts = db.conflicts().list(limit)?;

    if json {
        let items = conflicts
            .iter()
            .map(sync_conflict_to_item)
            .collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if conflicts.is_empty() {
        println!("No sync conflicts recorded.");
        return Ok(());
    }

    for line in format_sync_conflict_lines(&conflicts) {
        println!("{line}");
    }
    Ok(())
}
