//! Status command - show ledger summary and sync mode

use anyhow::Result;
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use serde::Serialize;
use tally_core::LEDGER_DB_FILE;

use super::get_context;
use crate::output;

#[derive(Serialize)]
struct StatusSummary {
    accounts: usize,
    transactions: usize,
    total_balance: rust_decimal::Decimal,
    earliest: Option<String>,
    latest: Option<String>,
    mode: &'static str,
    signed_in_as: Option<String>,
    remote_url: Option<String>,
    database_path: String,
    database_size_bytes: u64,
}

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context("status")?;
    let transactions = ctx.ledger.transactions(&Default::default());
    let db_path = ctx.data_dir().join(LEDGER_DB_FILE);

    let status = StatusSummary {
        accounts: ctx.ledger.accounts().len(),
        transactions: transactions.len(),
        total_balance: ctx.ledger.total_balance()?,
        // Listing is newest first
        earliest: transactions.last().map(|t| t.date.to_string()),
        latest: transactions.first().map(|t| t.date.to_string()),
        mode: if ctx.ledger.identity().is_some() {
            "mirrored"
        } else {
            "local"
        },
        signed_in_as: ctx.ledger.identity().map(|i| i.display_name()),
        remote_url: ctx.config.remote_endpoint().map(|r| r.url.clone()),
        database_size_bytes: std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0),
        database_path: db_path.to_string_lossy().to_string(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}", "Ledger Status".bold());
    println!();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.add_row(vec!["Accounts".to_string(), status.accounts.to_string()]);
    table.add_row(vec!["Transactions".to_string(), status.transactions.to_string()]);
    table.add_row(vec![
        "Total balance".to_string(),
        output::format_money(status.total_balance),
    ]);
    table.add_row(vec![
        "Database".to_string(),
        format!(
            "{} ({})",
            status.database_path,
            output::format_size(status.database_size_bytes)
        ),
    ]);
    println!("{}", table);
    println!();

    if let (Some(earliest), Some(latest)) = (&status.earliest, &status.latest) {
        println!("Date range: {} to {}", earliest, latest);
        println!();
    }

    match &status.signed_in_as {
        Some(name) => println!(
            "{} signed in as {} ({})",
            "Mirrored:".bold(),
            name.green(),
            status.remote_url.as_deref().unwrap_or("-")
        ),
        None => println!("{} local only", "Mode:".bold()),
    }

    Ok(())
}
