//! Sync commands - reload from or push to the remote mirror

use anyhow::{bail, Result};
use clap::Subcommand;
use colored::Colorize;
use tally_core::OperationResult;

use super::get_context;
use crate::output;

#[derive(Subcommand)]
pub enum SyncCommands {
    /// Reload the ledger from the remote copy
    Pull {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Upload every local account and transaction
    Push {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(command: SyncCommands) -> Result<()> {
    match command {
        SyncCommands::Pull { json } => {
            let mut ctx = get_context("sync pull")?;
            if ctx.ledger.identity().is_none() {
                bail!("Not signed in. Run 'tally login' first.");
            }

            ctx.ledger.reload()?;
            let accounts = ctx.ledger.accounts().len();
            let transactions = ctx.ledger.transactions(&Default::default()).len();

            if json {
                println!(
                    "{}",
                    serde_json::json!({"accounts": accounts, "transactions": transactions})
                );
            } else {
                output::success(&format!(
                    "Loaded {} account(s) and {} transaction(s)",
                    accounts, transactions
                ));
            }
        }
        SyncCommands::Push { json } => {
            let ctx = get_context("sync push")?;
            if ctx.ledger.identity().is_none() {
                bail!("Not signed in. Run 'tally login' first.");
            }

            let report = ctx.ledger.push_to_remote();

            if json {
                let result = if report.is_clean() {
                    OperationResult::ok(report)
                } else {
                    let mut failed = OperationResult::fail(report.failures.join("; "));
                    failed.data = Some(report);
                    failed
                };
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(());
            }

            println!(
                "Pushed {} account(s) and {} transaction(s)",
                report.accounts_pushed, report.transactions_pushed
            );
            if !report.is_clean() {
                println!("{}", "Some uploads failed:".red().bold());
                for failure in &report.failures {
                    println!("  {}", failure);
                }
                bail!("Push incomplete");
            }
        }
    }

    Ok(())
}
