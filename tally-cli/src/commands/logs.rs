//! Logs command - inspect ledger and mirror events

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;
use tally_core::services::{EntryPoint, LogEntry, LoggingService};

use super::get_tally_dir;
use crate::output;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Show recent ledger events
    List {
        /// Number of entries to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Show only failed operations
        #[arg(long, conflicts_with = "event")]
        errors: bool,
        /// Show only one event, e.g. remote_sync_failed
        #[arg(long)]
        event: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete old log entries
    Clear {
        /// Delete entries older than N days
        #[arg(long, default_value = "30")]
        older_than_days: u64,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Count events by name and remote failures by table
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn open_logs() -> Result<LoggingService> {
    let tally_dir = get_tally_dir()?;
    std::fs::create_dir_all(&tally_dir)?;
    LoggingService::new(&tally_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION"))
}

fn format_timestamp(timestamp_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}

/// Event name, colored by what it means for the ledger
fn styled_event(entry: &LogEntry) -> String {
    match entry.event.as_str() {
        "remote_sync_failed" | "remote_load_failed" => entry.event.red().to_string(),
        "import_rejected" => entry.event.yellow().to_string(),
        "data_imported" | "data_cleared" => entry.event.cyan().to_string(),
        _ if entry.error_message.is_some() => entry.event.red().to_string(),
        _ => entry.event.clone(),
    }
}

fn print_entries(entries: &[LogEntry]) {
    let mut table = output::create_table();
    table.set_header(vec!["Time", "Event", "Operation", "Table", "Error"]);
    for entry in entries {
        table.add_row(vec![
            format_timestamp(entry.timestamp),
            styled_event(entry),
            entry.operation.clone().unwrap_or_default(),
            entry.remote_table.clone().unwrap_or_default(),
            entry.error_message.clone().unwrap_or_default(),
        ]);
    }
    println!("{}", table);
}

fn print_remote_failures(failures: &[(String, u64)]) {
    if failures.is_empty() {
        return;
    }
    println!();
    println!("{}", "Remote mirror failures:".red().bold());
    for (table, count) in failures {
        println!("  {:<14} {}", table, count);
    }
    println!(
        "  {}",
        "Local data is unaffected; `tally sync push` re-uploads it.".dimmed()
    );
}

pub fn run(command: LogsCommands) -> Result<()> {
    let service = open_logs()?;

    match command {
        LogsCommands::List {
            limit,
            errors,
            event,
            json,
        } => {
            let entries = match (&event, errors) {
                (Some(name), _) => service.get_by_event(name, limit)?,
                (None, true) => service.get_errors(limit)?,
                (None, false) => service.get_recent(limit)?,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }
            if entries.is_empty() {
                println!("No log entries found.");
                return Ok(());
            }

            print_entries(&entries);
            if event.is_none() {
                print_remote_failures(&service.remote_failures_by_table()?);
            }
        }
        LogsCommands::Clear {
            older_than_days,
            force,
            json,
        } => {
            let days = i64::try_from(older_than_days).unwrap_or(i64::MAX);
            let cutoff = Utc::now()
                .timestamp_millis()
                .saturating_sub(days.saturating_mul(DAY_MS));

            if !force
                && !json
                && !Confirm::new()
                    .with_prompt(format!("Delete log entries older than {} days?", older_than_days))
                    .default(false)
                    .interact()?
            {
                println!("Cancelled.");
                return Ok(());
            }

            let deleted = service.delete_before(cutoff)?;
            if json {
                println!("{}", serde_json::json!({ "deleted": deleted }));
            } else {
                output::success(&format!("Deleted {} log entries", deleted));
            }
        }
        LogsCommands::Stats { json } => {
            let total = service.count()?;
            let events = service.event_counts()?;
            let failures = service.remote_failures_by_table()?;
            let db_path = service.db_path().to_path_buf();
            let size_bytes = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

            if json {
                let to_map = |pairs: &[(String, u64)]| {
                    pairs
                        .iter()
                        .map(|(k, v)| (k.clone(), serde_json::json!(v)))
                        .collect::<serde_json::Map<_, _>>()
                };
                println!(
                    "{}",
                    serde_json::json!({
                        "total_entries": total,
                        "events": to_map(&events),
                        "remote_failures": to_map(&failures),
                        "database_path": db_path.to_string_lossy(),
                        "database_size_bytes": size_bytes
                    })
                );
                return Ok(());
            }

            println!("{}", "Log statistics".bold());
            println!("  Entries: {}", total);
            println!("  Database: {} ({})", db_path.display(), output::format_size(size_bytes));

            if !events.is_empty() {
                let mut table = output::create_table();
                table.set_header(vec!["Event", "Count"]);
                for (event, count) in &events {
                    table.add_row(vec![event.clone(), count.to_string()]);
                }
                println!("{}", table);
            }
            print_remote_failures(&failures);
        }
    }

    Ok(())
}
