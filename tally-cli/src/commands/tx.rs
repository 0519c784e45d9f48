//! Transaction commands - add, list, edit and delete transactions

use anyhow::{bail, Result};
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;
use tally_core::{TransactionFilter, TransactionType, TransactionUpdate};

use super::{get_context, parse_amount, parse_date, resolve_account, resolve_transaction, short_id};
use crate::output;

#[derive(Subcommand)]
pub enum TxCommands {
    /// Record an income or expense
    Add {
        /// income or expense
        #[arg(long = "type", short = 't')]
        kind: TransactionType,
        /// Amount (unsigned)
        #[arg(long, short)]
        amount: String,
        /// Account id, id prefix, or name
        #[arg(long)]
        account: String,
        /// Description
        #[arg(long, short, default_value = "")]
        description: String,
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
        /// Category (expenses only)
        #[arg(long, short)]
        category: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List transactions, newest first
    List {
        /// Only this account (id, id prefix, or name)
        #[arg(long)]
        account: Option<String>,
        /// Only income or only expense
        #[arg(long = "type", short = 't')]
        kind: Option<TransactionType>,
        /// Earliest date, inclusive (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// Latest date, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
        /// Maximum number of rows
        #[arg(short, long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change fields of a transaction
    Edit {
        /// Transaction id or id prefix
        id: String,
        #[arg(long = "type", short = 't')]
        kind: Option<TransactionType>,
        #[arg(long, short)]
        amount: Option<String>,
        #[arg(long)]
        account: Option<String>,
        #[arg(long, short)]
        description: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long, short, conflicts_with = "clear_category")]
        category: Option<String>,
        /// Remove the category
        #[arg(long)]
        clear_category: bool,
    },
    /// Delete a transaction and reverse its effect
    Delete {
        /// Transaction id or id prefix
        id: String,
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

pub fn run(command: TxCommands) -> Result<()> {
    match command {
        TxCommands::Add {
            kind,
            amount,
            account,
            description,
            date,
            category,
            json,
        } => {
            let mut ctx = get_context("tx add")?;
            let account_id = resolve_account(&ctx.ledger, &account)?;
            let date = date.as_deref().map(parse_date).transpose()?;

            let Some(tx) = ctx.ledger.add_transaction(
                kind,
                parse_amount(&amount),
                &description,
                account_id,
                date,
                category,
            )?
            else {
                bail!("Account '{}' not found", account);
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&tx)?);
            } else {
                output::success(&format!(
                    "Recorded {} of {} on '{}' ({}), balance now {}",
                    tx.kind,
                    output::format_money(tx.amount),
                    tx.account_name,
                    short_id(&tx.id),
                    output::format_money(tx.balance_after)
                ));
            }
        }
        TxCommands::List {
            account,
            kind,
            from,
            to,
            limit,
            json,
        } => {
            let ctx = get_context("tx list")?;
            let filter = TransactionFilter {
                account_id: account
                    .as_deref()
                    .map(|a| resolve_account(&ctx.ledger, a))
                    .transpose()?,
                kind,
                date_start: from.as_deref().map(parse_date).transpose()?,
                date_end: to.as_deref().map(parse_date).transpose()?,
            };

            let mut transactions = ctx.ledger.transactions(&filter);
            if let Some(limit) = limit {
                transactions.truncate(limit);
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&transactions)?);
                return Ok(());
            }
            if transactions.is_empty() {
                println!("No transactions found.");
                return Ok(());
            }

            let mut table = output::create_table();
            table.set_header(vec![
                "ID", "Date", "Account", "Description", "Category", "Amount", "Balance",
            ]);
            for tx in &transactions {
                table.add_row(vec![
                    short_id(&tx.id),
                    tx.date.to_string(),
                    tx.account_name.clone(),
                    tx.description.clone(),
                    tx.category.clone().unwrap_or_default(),
                    output::colored_money(tx.signed_amount()),
                    output::format_money(tx.balance_after),
                ]);
            }
            println!("{}", table);
            println!("{}", format!("{} transaction(s)", transactions.len()).dimmed());
        }
        TxCommands::Edit {
            id,
            kind,
            amount,
            account,
            description,
            date,
            category,
            clear_category,
        } => {
            let mut ctx = get_context("tx edit")?;
            let tx_id = resolve_transaction(&ctx.ledger, &id)?;

            let update = TransactionUpdate {
                kind,
                amount: amount.as_deref().map(parse_amount),
                description,
                account_id: account
                    .as_deref()
                    .map(|a| resolve_account(&ctx.ledger, a))
                    .transpose()?,
                date: date.as_deref().map(parse_date).transpose()?,
                category: if clear_category { Some(None) } else { category.map(Some) },
            };
            if update.is_empty() {
                output::warning("Nothing to change.");
                return Ok(());
            }

            if !ctx.ledger.update_transaction(tx_id, update)? {
                bail!("Transaction or target account not found");
            }
            if let Some(tx) = ctx.ledger.transaction(tx_id) {
                output::success(&format!(
                    "Updated transaction {}, '{}' balance now {}",
                    short_id(&tx.id),
                    tx.account_name,
                    output::format_money(tx.balance_after)
                ));
            }
        }
        TxCommands::Delete { id, force } => {
            let mut ctx = get_context("tx delete")?;
            let tx_id = resolve_transaction(&ctx.ledger, &id)?;

            if !force {
                if let Some(tx) = ctx.ledger.transaction(tx_id) {
                    println!(
                        "\n{}\n",
                        format!(
                            "This will delete the {} of {} on {} ('{}').",
                            tx.kind,
                            output::format_money(tx.amount),
                            tx.date,
                            tx.description
                        )
                        .yellow()
                    );
                }
                if !Confirm::new()
                    .with_prompt("Are you sure?")
                    .default(false)
                    .interact()?
                {
                    println!("{}", "Cancelled".dimmed());
                    return Ok(());
                }
            }

            if ctx.ledger.delete_transaction(tx_id)? {
                output::success(&format!("Deleted transaction {}", short_id(&tx_id)));
            } else {
                bail!("Transaction '{}' not found", id);
            }
        }
    }

    Ok(())
}
