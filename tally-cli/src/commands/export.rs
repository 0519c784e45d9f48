//! Export command - write the whole ledger to a JSON file

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use tally_core::domain::export::export_file_name;

use super::get_context;
use crate::output;

pub fn run(output_path: Option<PathBuf>, stdout: bool) -> Result<()> {
    let ctx = get_context("export")?;
    let data = ctx.ledger.export_data();
    let content = serde_json::to_string_pretty(&data)?;

    if stdout {
        println!("{}", content);
        return Ok(());
    }

    let path = output_path
        .unwrap_or_else(|| PathBuf::from(export_file_name(Local::now().date_naive())));
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    output::success(&format!(
        "Exported {} account(s) and {} transaction(s) to {}",
        data.accounts.len(),
        data.transactions.len(),
        path.display()
    ));
    Ok(())
}
