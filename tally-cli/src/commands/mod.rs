//! CLI command implementations

pub mod account;
pub mod auth;
pub mod clear;
pub mod export;
pub mod import;
pub mod logs;
pub mod status;
pub mod sync;
pub mod total;
pub mod tx;

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_core::domain::amount::coerce_decimal;
use tally_core::services::{EntryPoint, Ledger, LogEvent};
use tally_core::services::logging::record;
use tally_core::TallyContext;
use uuid::Uuid;

/// Get the tally directory from environment or default
pub fn get_tally_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("TALLY_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".tally"))
        .ok_or_else(|| anyhow!("Could not find home directory; set TALLY_DIR"))
}

/// Open the tally context and record which command is running
pub fn get_context(command: &str) -> Result<TallyContext> {
    let tally_dir = get_tally_dir()?;
    let ctx = TallyContext::new(&tally_dir, EntryPoint::Cli)
        .with_context(|| format!("Failed to open ledger in {}", tally_dir.display()))?;
    record(
        ctx.logger.as_deref(),
        LogEvent::new("command_executed").with_operation(command),
    );
    Ok(ctx)
}

/// Parse a user-entered amount; unreadable input counts as zero
pub fn parse_amount(input: &str) -> Decimal {
    coerce_decimal(input)
}

pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", input))
}

/// Resolve an account by id, id prefix, or case-insensitive name
pub fn resolve_account(ledger: &Ledger, query: &str) -> Result<Uuid> {
    let query = query.trim();
    if query.is_empty() {
        bail!("Account name or id cannot be empty");
    }
    if let Ok(id) = Uuid::parse_str(query) {
        return Ok(id);
    }

    let lower = query.to_lowercase();
    let matches: Vec<_> = ledger
        .accounts()
        .iter()
        .filter(|a| a.name.to_lowercase() == lower || a.id.to_string().starts_with(&lower))
        .collect();

    match matches.as_slice() {
        [account] => Ok(account.id),
        [] => bail!("Account '{}' not found", query),
        _ => bail!("'{}' matches {} accounts, use the full id", query, matches.len()),
    }
}

/// Resolve a transaction by id or unique id prefix
pub fn resolve_transaction(ledger: &Ledger, query: &str) -> Result<Uuid> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        bail!("Transaction id cannot be empty");
    }
    if let Ok(id) = Uuid::parse_str(&query) {
        return Ok(id);
    }

    let matches: Vec<Uuid> = ledger
        .transactions(&Default::default())
        .iter()
        .map(|t| t.id)
        .filter(|id| id.to_string().starts_with(&query))
        .collect();

    match matches.as_slice() {
        [id] => Ok(*id),
        [] => bail!("Transaction '{}' not found", query),
        _ => bail!("'{}' matches {} transactions, use the full id", query, matches.len()),
    }
}

/// First eight characters of an id, for tables
pub fn short_id(id: &Uuid) -> String {
    id.to_string().chars().take(8).collect()
}
