//! Transaction command - look up one transaction

use anyhow::Result;
use colored::Colorize;

use super::get_context;
use crate::output;

pub fn run(id: &str, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let tx = ctx.transactions.get(id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tx)?);
        return Ok(());
    }

    let amount = output::format_amount(tx.amount, &tx.currency_code);
    let amount = if tx.is_debit() {
        amount.red().to_string()
    } else {
        amount.green().to_string()
    };
    let date = tx
        .transaction_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-".to_string());

    let mut table = output::create_table();
    table.add_row(vec!["ID".to_string(), tx.id.clone()]);
    table.add_row(vec!["Date".to_string(), date]);
    table.add_row(vec!["Type".to_string(), tx.transaction_type.clone()]);
    table.add_row(vec!["Amount".to_string(), amount]);
    table.add_row(vec![
        "Description".to_string(),
        tx.description.clone().unwrap_or_default(),
    ]);
    table.add_row(vec!["Account".to_string(), tx.account_id.clone()]);
    println!("{}", table);

    Ok(())
}
