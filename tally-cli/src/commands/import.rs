//! Import command - replace the ledger with an exported JSON file

use std::path::Path;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use dialoguer::Confirm;
use tally_core::{ImportOutcome, OperationResult};

use super::get_context;
use crate::output;

pub fn run(file: &Path, force: bool, json: bool) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    // Unparseable JSON is an import rejection like any other malformed payload
    let payload: serde_json::Value = match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            let outcome = ImportOutcome::Rejected {
                reason: format!("not valid JSON: {}", e),
            };
            return report(&outcome, json);
        }
    };

    let mut ctx = get_context("import")?;

    if !force && !json {
        println!(
            "\n{}",
            "Importing replaces every account and transaction in the ledger.".yellow()
        );
        if !Confirm::new()
            .with_prompt("Continue?")
            .default(false)
            .interact()?
        {
            println!("{}", "Cancelled".dimmed());
            return Ok(());
        }
    }

    let outcome = ctx.ledger.import_data(&payload)?;
    report(&outcome, json)
}

fn report(outcome: &ImportOutcome, json: bool) -> Result<()> {
    if json {
        let result = match outcome {
            ImportOutcome::Imported { .. } => OperationResult::ok(outcome.clone()),
            ImportOutcome::Rejected { reason } => OperationResult::fail(reason.clone()),
        };
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    match outcome {
        ImportOutcome::Imported {
            accounts,
            transactions,
        } => {
            output::success(&format!(
                "Imported {} account(s) and {} transaction(s)",
                accounts, transactions
            ));
            Ok(())
        }
        ImportOutcome::Rejected { reason } => bail!("Import rejected: {}", reason),
    }
}
