//! Account commands - create, list and delete accounts

use anyhow::{bail, Result};
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;

use super::{get_context, parse_amount, resolve_account, short_id};
use crate::output;

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create an account
    Add {
        /// Account name
        name: String,
        /// Opening balance
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        balance: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List accounts with their balances
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete an account (its transactions are kept)
    Delete {
        /// Account id, id prefix, or name
        account: String,
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

pub fn run(command: AccountCommands) -> Result<()> {
    match command {
        AccountCommands::Add { name, balance, json } => {
            let mut ctx = get_context("account add")?;
            let account = ctx.ledger.create_account(&name, parse_amount(&balance))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&account)?);
            } else {
                output::success(&format!(
                    "Created account '{}' ({}) with balance {}",
                    account.name,
                    short_id(&account.id),
                    output::format_money(account.balance)
                ));
            }
        }
        AccountCommands::List { json } => {
            let ctx = get_context("account list")?;
            let accounts = ctx.ledger.accounts();

            if json {
                println!("{}", serde_json::to_string_pretty(accounts)?);
                return Ok(());
            }
            if accounts.is_empty() {
                println!("No accounts yet. Create one with 'tally account add <name>'.");
                return Ok(());
            }

            let mut table = output::create_table();
            table.set_header(vec!["ID", "Name", "Balance", "Created"]);
            for account in accounts {
                table.add_row(vec![
                    short_id(&account.id),
                    account.name.clone(),
                    output::colored_money(account.balance),
                    account.created_at.format("%Y-%m-%d").to_string(),
                ]);
            }
            println!("{}", table);
            println!(
                "{} {}",
                "Total:".bold(),
                output::colored_money(ctx.ledger.total_balance()?)
            );
        }
        AccountCommands::Delete { account, force } => {
            let mut ctx = get_context("account delete")?;
            let id = resolve_account(&ctx.ledger, &account)?;
            let Some(name) = ctx.ledger.account(id).map(|a| a.name.clone()) else {
                bail!("Account '{}' not found", account);
            };

            if !force {
                println!(
                    "\n{}",
                    format!("This will delete the account '{}'.", name).yellow()
                );
                println!("{}\n", "Its transactions will remain in the ledger.".dimmed());
                if !Confirm::new()
                    .with_prompt("Are you sure?")
                    .default(false)
                    .interact()?
                {
                    println!("{}", "Cancelled".dimmed());
                    return Ok(());
                }
            }

            if ctx.ledger.delete_account(id)? {
                output::success(&format!("Deleted account '{}'", name));
            } else {
                bail!("Account '{}' not found", account);
            }
        }
    }

    Ok(())
}
