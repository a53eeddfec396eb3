use std::path::Path;

use coop_core::db::FowlRepository;
use coop_core::util::non_blank;

use crate::cli::FowlCommands;
use crate::commands::common::{
    format_fowl_lines, fowl_to_list_item, open_database, parse_date, short_id,
};
use crate::error::CliError;

pub fn run(command: FowlCommands, db_path: &Path) -> Result<(), CliError> {
    match command {
        FowlCommands::Add {
            name,
            breed,
            owner,
            hatched,
        } => add(&name, &breed, &owner, non_blank(hatched.as_deref()), db_path),
        FowlCommands::List { owner, limit, json } => {
            list(non_blank(owner.as_deref()), limit, json, db_path)
        }
    }
}

fn add(
    name: &str,
    breed: &str,
    owner: &str,
    hatched: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    let hatched_on = hatched.map(parse_date).transpose()?;
    let db = open_database(db_path)?;
    let fowl = db.fowls().create(name, breed, owner, hatched_on)?;

    tracing::debug!(fowl_id = %fowl.id, owner = %fowl.owner_id, "Registered fowl");
    println!("Registered {} ({})", fowl.name, short_id(&fowl.id.to_string()));
    Ok(())
}

fn list(owner: Option<&str>, limit: usize, json: bool, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let fowls = match owner {
        Some(owner) => db.fowls().list_by_owner(owner, limit, 0)?,
        None => db.fowls().list(limit, 0)?,
    };

    if json {
        let items = fowls.iter().map(fowl_to_list_item).collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if fowls.is_empty() {
        println!("No fowl found.");
        return Ok(());
    }

    for line in format_fowl_lines(&fowls) {
        println!("{line}");
    }
    Ok(())
}
