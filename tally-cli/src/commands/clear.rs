//! Clear command - remove all accounts and transactions

use anyhow::Result;
use colored::Colorize;
use dialoguer::Confirm;

use super::get_context;
use crate::output;

pub fn run(force: bool) -> Result<()> {
    let mut ctx = get_context("clear")?;

    if !force {
        println!(
            "\n{}",
            format!(
                "This will delete {} account(s) and {} transaction(s).",
                ctx.ledger.accounts().len(),
                ctx.ledger.transactions(&Default::default()).len()
            )
            .red()
        );
        println!("{}\n", "Consider running 'tally export' first.".dimmed());
        if !Confirm::new()
            .with_prompt("Are you sure?")
            .default(false)
            .interact()?
        {
            println!("{}", "Cancelled".dimmed());
            return Ok(());
        }
    }

    ctx.ledger.clear_all()?;
    output::success("All data cleared");
    Ok(())
}
