use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "coop")]
#[command(about = "Track fowl, hand them over, and sync the flock book")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register and list fowl
    Fowl {
        #[command(subcommand)]
        command: FowlCommands,
    },
    /// Hand a fowl over to another user
    Transfer {
        #[command(subcommand)]
        command: TransferCommands,
    },
    /// Reconcile local records with the remote replica
    Sync {
        /// Remote replica database (overrides configuration)
        #[arg(long, value_name = "PATH")]
        remote: Option<PathBuf>,
        #[command(subcommand)]
        command: Option<SyncCommands>,
    },
    /// Show or change CLI configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum FowlCommands {
    /// Register a new fowl
    #[command(alias = "new")]
    Add {
        /// Name or ring number
        name: String,
        /// Breed label
        #[arg(long, default_value = "")]
        breed: String,
        /// Owner's user id
        #[arg(long)]
        owner: String,
        /// Hatch date (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        hatched: Option<String>,
    },
    /// List fowl
    List {
        /// Only fowl owned by this user
        #[arg(long)]
        owner: Option<String>,
        /// Number of fowl to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum TransferCommands {
    /// Start handing a fowl over to another user
    Initiate {
        /// Fowl ID or unique ID prefix
        fowl: String,
        /// Receiving user's id
        #[arg(long)]
        to: String,
    },
    /// Accept a pending transfer
    Verify {
        /// Transfer ID or unique ID prefix
        id: String,
        /// Evidence to attach, as key=value (repeatable)
        #[arg(long = "detail", value_name = "KEY=VALUE")]
        details: Vec<String>,
    },
    /// Decline a pending transfer
    Reject {
        /// Transfer ID or unique ID prefix
        id: String,
    },
    /// Show one transfer
    Show {
        /// Transfer ID or unique ID prefix
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List recent transfers
    List {
        /// Number of transfers to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum SyncCommands {
    /// List recently resolved sync conflicts
    Conflicts {
        /// Number of conflicts to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Update configuration values
    Set {
        /// Remote replica database path
        #[arg(long, value_name = "PATH")]
        remote: Option<PathBuf>,
        /// Per-call remote timeout in milliseconds
        #[arg(long, value_name = "MS")]
        fetch_timeout_ms: Option<u64>,
        /// Attempts per remote call
        #[arg(long, value_name = "N")]
        max_attempts: Option<u32>,
    },
}
