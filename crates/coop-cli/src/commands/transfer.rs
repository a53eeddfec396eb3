use std::path::Path;

use coop_core::db::{SqliteRemoteStore, TransferRepository};
use coop_core::transfer::TransferService;
use coop_core::{Transfer, TransferStateMachine};

use crate::cli::TransferCommands;
use crate::commands::common::{
    format_transfer_detail, format_transfer_lines, open_database, parse_details, resolve_fowl,
    resolve_transfer, short_id, transfer_to_list_item,
};
use crate::config::CliConfig;
use crate::error::CliError;

pub async fn run(command: TransferCommands, db_path: &Path) -> Result<(), CliError> {
    match command {
        TransferCommands::Initiate { fowl, to } => initiate(&fowl, &to, db_path).await,
        TransferCommands::Verify { id, details } => verify(&id, &details, db_path).await,
        TransferCommands::Reject { id } => reject(&id, db_path).await,
        TransferCommands::Show { id, json } => show(&id, json, db_path),
        TransferCommands::List { limit, json } => list(limit, json, db_path),
    }
}

/// Remote replica for write-through, when one is configured.
fn open_remote(config: &CliConfig) -> Result<Option<SqliteRemoteStore>, CliError> {
    Ok(config
        .resolve_remote_path(None)
        .map(SqliteRemoteStore::open)
        .transpose()?)
}

async fn initiate(fowl_query: &str, receiver: &str, db_path: &Path) -> Result<(), CliError> {
    let config = CliConfig::load().map_err(CliError::Config)?;
    let db = open_database(db_path)?;
    let remote = open_remote(&config)?;
    let fowl = resolve_fowl(fowl_query, &db)?;

    let service = TransferService::new(&db, remote.as_ref()).with_config(config.sync_config());
    let machine = TransferStateMachine::new();
    let transfer = service
        .initiate(&machine, &fowl.id, &fowl.owner_id, receiver)
        .await?;

    println!(
        "Transfer {} of {} to {} is {}",
        short_id(&transfer.id.to_string()),
        fowl.name,
        transfer.receiver_id,
        transfer.status
    );
    Ok(())
}

async fn verify(query: &str, raw_details: &[String], db_path: &Path) -> Result<(), CliError> {
    let details = parse_details(raw_details)?;
    let config = CliConfig::load().map_err(CliError::Config)?;
    let db = open_database(db_path)?;
    let remote = open_remote(&config)?;
    let transfer = resolve_transfer(query, &db)?;

    let service = TransferService::new(&db, remote.as_ref()).with_config(config.sync_config());
    let machine = TransferStateMachine::resume(transfer.clone());
    let verified = service.verify(&machine, &transfer, details).await?;

    print_outcome(&verified);
    Ok(())
}

async fn reject(query: &str, db_path: &Path) -> Result<(), CliError> {
    let config = CliConfig::load().map_err(CliError::Config)?;
    let db = open_database(db_path)?;
    let remote = open_remote(&config)?;
    let transfer = resolve_transfer(query, &db)?;

    let service = TransferService::new(&db, remote.as_ref()).with_config(config.sync_config());
    let machine = TransferStateMachine::resume(transfer.clone());
    let rejected = service.reject(&machine, &transfer).await?;

    print_outcome(&rejected);
    Ok(())
}

fn print_outcome(transfer: &Transfer) {
    println!(
        "Transfer {} is {} ({})",
        short_id(&transfer.id.to_string()),
        transfer.status,
        transfer.sync.sync_status.as_str()
    );
}

fn show(query: &str, json: bool, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let transfer = resolve_transfer(query, &db)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&transfer_to_list_item(&transfer))?
        );
        return Ok(());
    }

    for line in format_transfer_detail(&transfer) {
        println!("{line}");
    }
    Ok(())
}

fn list(limit: usize, json: bool, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let transfers = db.transfers().list(limit, 0)?;

    if json {
        let items = transfers
            .iter()
            .map(transfer_to_list_item)
            .collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if transfers.is_empty() {
        println!("No transfers found.");
        return Ok(());
    }

    for line in format_transfer_lines(&transfers) {
        println!("{line}");
    }
    Ok(())
}
