use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use coop_core::db::{Database, FowlRepository, SqliteRemoteStore, TransferRepository};
use coop_core::sync::RemoteStore;
use coop_core::transfer::TransferService;
use coop_core::{Fowl, SyncStatus, SyncableEntity, TransferStateMachine};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use crate::cli::{Cli, Commands, CompletionShell, FowlCommands, SyncCommands, TransferCommands};
use crate::commands::common::{
    format_fowl_lines, format_relative_time, format_sync_timestamp, fowl_to_list_item, parse_date,
    parse_details, resolve_fowl, resolve_transfer, short_id,
};
use crate::commands::{completions, config as config_command, fowl, sync};
use crate::config::CliConfig;
use crate::error::CliError;

fn temp_db() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("coop.db");
    (dir, path)
}

#[test]
fn parses_transfer_verify_with_details() {
    let cli = Cli::try_parse_from([
        "coop",
        "transfer",
        "verify",
        "0192",
        "--detail",
        "leg_band=RIR-0042",
        "--detail",
        "vet=ok",
    ])
    .unwrap();

    match cli.command {
        Commands::Transfer {
            command: TransferCommands::Verify { id, details },
        } => {
            assert_eq!(id, "0192");
            assert_eq!(details, vec!["leg_band=RIR-0042", "vet=ok"]);
        }
        _ => panic!("expected transfer verify"),
    }
}

#[test]
fn parses_sync_conflicts_and_global_db_path() {
    let cli = Cli::try_parse_from([
        "coop",
        "sync",
        "conflicts",
        "--limit",
        "5",
        "--json",
        "--db-path",
        "/tmp/coop.db",
    ])
    .unwrap();

    assert_eq!(cli.db_path, Some(PathBuf::from("/tmp/coop.db")));
    assert!(matches!(
        cli.command,
        Commands::Sync {
            remote: None,
            command: Some(SyncCommands::Conflicts {
                limit: 5,
                json: true
            })
        }
    ));
}

#[test]
fn fowl_add_requires_owner() {
    assert!(Cli::try_parse_from(["coop", "fowl", "add", "Ruby"]).is_err());
}

#[test]
fn parse_details_splits_on_first_equals() {
    let details = parse_details(&["note=a=b".to_string(), " band = 7 ".to_string()]).unwrap();

    assert_eq!(details["note"], "a=b");
    assert_eq!(details["band"], "7");
}

#[test]
fn parse_details_rejects_missing_key() {
    assert!(matches!(
        parse_details(&["=value".to_string()]),
        Err(CliError::InvalidDetail(_))
    ));
    assert!(matches!(
        parse_details(&["novalue".to_string()]),
        Err(CliError::InvalidDetail(_))
    ));
}

#[test]
fn parse_date_accepts_iso_dates_only() {
    assert_eq!(parse_date("2026-03-14").unwrap().to_string(), "2026-03-14");
    assert!(matches!(
        parse_date("14/03/2026"),
        Err(CliError::InvalidDate(_))
    ));
}

#[test]
fn format_relative_time_units() {
    let now = 10_000_000_000;
    assert_eq!(format_relative_time(now - 30_000, now), "just now");
    assert_eq!(format_relative_time(now - 5 * 60_000, now), "5m ago");
    assert_eq!(format_relative_time(now - 3 * 3_600_000, now), "3h ago");
    assert_eq!(format_relative_time(now - 2 * 86_400_000, now), "2d ago");
}

#[test]
fn format_sync_timestamp_is_utc() {
    assert_eq!(format_sync_timestamp(0), "1970-01-01 00:00:00 UTC");
}

#[test]
fn fowl_add_and_resolve_by_prefix() {
    let (_dir, db_path) = temp_db();

    fowl::run(
        FowlCommands::Add {
            name: "Ruby".to_string(),
            breed: "Silkie".to_string(),
            owner: "alice".to_string(),
            hatched: Some("2026-03-14".to_string()),
        },
        &db_path,
    )
    .unwrap();

    let db = Database::open(&db_path).unwrap();
    let stored = db.fowls().list(10, 0).unwrap();
    assert_eq!(stored.len(), 1);

    let id = stored[0].id.to_string();
    let resolved = resolve_fowl(&short_id(&id), &db).unwrap();
    assert_eq!(resolved, stored[0]);
}

#[test]
fn fowl_add_rejects_bad_hatch_date() {
    let (_dir, db_path) = temp_db();

    let error = fowl::run(
        FowlCommands::Add {
            name: "Ruby".to_string(),
            breed: String::new(),
            owner: "alice".to_string(),
            hatched: Some("soon".to_string()),
        },
        &db_path,
    )
    .unwrap_err();

    assert!(matches!(error, CliError::InvalidDate(_)));
}

#[test]
fn fowl_add_treats_blank_hatch_date_as_unknown() {
    let (_dir, db_path) = temp_db();

    fowl::run(
        FowlCommands::Add {
            name: "Pearl".to_string(),
            breed: "Silkie".to_string(),
            owner: "alice".to_string(),
            hatched: Some("   ".to_string()),
        },
        &db_path,
    )
    .unwrap();

    let db = Database::open(&db_path).unwrap();
    let stored = db.fowls().list(10, 0).unwrap();
    assert_eq!(stored[0].hatched_on, None);
    assert_eq!(fowl_to_list_item(&stored[0]).age_days, None);
}

#[test]
fn fowl_list_item_reports_age() {
    let hatched = chrono::Utc::now().date_naive() - chrono::Days::new(10);
    let fowl = Fowl::new("Ruby", "Silkie", "alice").with_hatched_on(hatched);

    let item = fowl_to_list_item(&fowl);
    assert_eq!(item.age_days, Some(10));
    assert!(format_fowl_lines(&[fowl])[0].contains("age=10d"));
}

#[test]
fn resolve_reports_missing_and_empty_ids() {
    let db = Database::open_in_memory().unwrap();

    assert!(matches!(resolve_fowl("  ", &db), Err(CliError::EmptyId)));
    assert!(matches!(
        resolve_transfer("0000", &db),
        Err(CliError::NotFound {
            kind: "transfer",
            ..
        })
    ));
}

#[test]
fn cli_config_round_trips_and_normalizes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("coop").join("cli-config.json");

    let mut config = CliConfig::default();
    config_command::apply(
        &mut config,
        Some(PathBuf::from("/srv/coop/remote.db")),
        Some(2_500),
        None,
    )
    .unwrap();
    config.save_to_path(&path).unwrap();

    let loaded = CliConfig::load_from_path(&path).unwrap();
    assert_eq!(loaded, config);

    let sync = loaded.sync_config();
    assert_eq!(sync.fetch_timeout, Duration::from_millis(2_500));
    assert_eq!(sync.max_attempts, 3);
}

#[test]
fn cli_config_missing_file_is_default() {
    let dir = TempDir::new().unwrap();
    let loaded = CliConfig::load_from_path(&dir.path().join("absent.json")).unwrap();
    assert_eq!(loaded, CliConfig::default());
}

#[test]
fn config_apply_rejects_zero_values() {
    let mut config = CliConfig::default();
    assert!(config_command::apply(&mut config, None, Some(0), None).is_err());
    assert!(config_command::apply(&mut config, None, None, Some(0)).is_err());
    assert_eq!(config, CliConfig::default());
}

#[test]
fn bash_completions_name_the_binary() {
    let script = String::from_utf8(completions::render(CompletionShell::Bash)).unwrap();
    assert!(script.contains("coop"));
    assert!(script.contains("transfer"));
}

#[tokio::test]
async fn sync_all_uploads_local_changes() {
    let db = Database::open_in_memory().unwrap();
    let remote = SqliteRemoteStore::open_in_memory().unwrap();
    let fowl = db.fowls().create("Ruby", "Silkie", "alice", None).unwrap();

    let service = TransferService::<SqliteRemoteStore>::new(&db, None);
    let machine = TransferStateMachine::new();
    let transfer = service
        .initiate(&machine, &fowl.id, "alice", "bob")
        .await
        .unwrap();

    let report = sync::sync_all(&db, &remote, &CliConfig::default())
        .await
        .unwrap();
    assert_eq!(report.examined, 2);
    assert_eq!(report.uploaded, 2);
    assert!(sync::format_report(&report).contains("2 uploaded"));

    let local = db.transfers().get(&transfer.id).unwrap().unwrap();
    assert_eq!(local.sync.sync_status, SyncStatus::Synced);
    let remote_fowl = RemoteStore::<Fowl>::fetch(&remote, &fowl.id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(remote_fowl.owner_id, "alice");

    let again = sync::sync_all(&db, &remote, &CliConfig::default())
        .await
        .unwrap();
    assert_eq!(sync::format_report(&again), "Already in sync.");
}

#[tokio::test]
async fn sync_all_takes_newer_remote_copy() {
    let db = Database::open_in_memory().unwrap();
    let remote = SqliteRemoteStore::open_in_memory().unwrap();
    let fowl = db.fowls().create("Ruby", "Silkie", "alice", None).unwrap();

    let mut newer = fowl.clone();
    newer.reassign_owner("carol");
    newer.sync.updated_at = fowl.sync.updated_at + 1_000;
    RemoteStore::<Fowl>::put(&remote, &newer).await.unwrap();

    let report = sync::sync_all(&db, &remote, &CliConfig::default())
        .await
        .unwrap();
    assert_eq!(report.downloaded, 1);

    let local = db.fowls().get(&fowl.id).unwrap().unwrap();
    assert_eq!(local.owner_id, "carol");
    assert_eq!(local.sync.sync_status, SyncStatus::Synced);

    let conflicts = db.conflicts().list(10).unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].winner, "remote");
    assert_eq!(conflicts[0].entity_id, fowl.id.to_string());
}
