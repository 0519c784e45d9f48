//! Total command - sum of all account balances

use anyhow::Result;
use colored::Colorize;

use super::get_context;
use crate::output;

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context("total")?;
    let total = ctx.ledger.total_balance()?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "total": total,
                "accounts": ctx.ledger.accounts().len()
            })
        );
    } else {
        println!("{} {}", "Total balance:".bold(), output::colored_money(total));
    }

    Ok(())
}
