//! Tally CLI - personal finance ledger in your terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{account, auth, clear, export, import, logs, status, sync, total, tx};

/// Tally - personal finance ledger in your terminal
#[derive(Parser)]
#[command(name = "tally", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage accounts
    Account {
        #[command(subcommand)]
        command: account::AccountCommands,
    },

    /// Manage transactions
    Tx {
        #[command(subcommand)]
        command: tx::TxCommands,
    },

    /// Show the sum of all account balances
    Total {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export the ledger to a JSON file
    Export {
        /// Output file (defaults to tally-backup-YYYY-MM-DD.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print to stdout instead of writing a file
        #[arg(long, conflicts_with = "output")]
        stdout: bool,
    },

    /// Replace the ledger with an exported JSON file
    Import {
        /// Path to the JSON file
        file: PathBuf,
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete all accounts and transactions
    Clear {
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Sign in and mirror the ledger to the remote backend
    Login {
        /// Remote user id
        #[arg(long)]
        user_id: String,
        /// Access token for the remote backend
        #[arg(long, env = "TALLY_ACCESS_TOKEN", hide_env_values = true)]
        token: String,
        /// Email shown in status output
        #[arg(long)]
        email: Option<String>,
        /// Remote URL (saved to settings)
        #[arg(long)]
        url: Option<String>,
        /// Remote API key (saved to settings)
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Sign out; local data is kept
    Logout,

    /// Reload from or push to the remote mirror
    Sync {
        #[command(subcommand)]
        command: sync::SyncCommands,
    },

    /// Show ledger summary and sync mode
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// View and manage application logs
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Account { command } => account::run(command),
        Commands::Tx { command } => tx::run(command),
        Commands::Total { json } => total::run(json),
        Commands::Export { output, stdout } => export::run(output, stdout),
        Commands::Import { file, force, json } => import::run(&file, force, json),
        Commands::Clear { force } => clear::run(force),
        Commands::Login {
            user_id,
            token,
            email,
            url,
            api_key,
        } => auth::login(user_id, token, email, url, api_key),
        Commands::Logout => auth::logout(),
        Commands::Sync { command } => sync::run(command),
        Commands::Status { json } => status::run(json),
        Commands::Logs { command } => logs::run(command),
    }
}
