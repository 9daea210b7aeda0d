//! Sync command - run the aggregation pipeline

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use colored::Colorize;

use bankhub_core::adapters::memory::MemorySink;
use bankhub_core::TransactionWindow;

use super::get_context;
use crate::output;

pub fn run(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let window = match from {
        Some(from) => {
            let to = to.unwrap_or_else(|| Utc::now().date_naive());
            TransactionWindow::range(from, to)?
        }
        None => TransactionWindow::All,
    };

    let ctx = get_context()?;
    let aggregate = if dry_run {
        ctx.pipeline.run_and_store(window, &MemorySink::new())?
    } else {
        ctx.pipeline.run_and_store(window, &ctx.snapshots)?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&aggregate)?);
        return Ok(());
    }

    if dry_run {
        println!("{}", "DRY RUN - No snapshot written".yellow());
        println!();
    }

    if aggregate.institutions.is_empty() {
        output::warning("No supported institutions found in the aggregator catalog.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec![
        "Institution",
        "Connection",
        "Accounts",
        "Transactions",
        "Status",
    ]);
    for record in &aggregate.institutions {
        let connection = record
            .connection
            .as_ref()
            .map(|c| c.status.clone())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            record.institution.name.clone(),
            connection,
            record.accounts.len().to_string(),
            record.transactions.len().to_string(),
            output::stage_label(record.stage, record.skipped.as_ref()),
        ]);
    }
    println!("{}", table);

    for record in &aggregate.institutions {
        if let Some(skipped) = &record.skipped {
            println!(
                "{} {} - {}",
                "Skipped:".red(),
                record.institution.name,
                skipped.reason
            );
        }
        for warning in &record.warnings {
            println!("{} {} - {}", "Warning:".yellow(), record.institution.name, warning);
        }
    }

    let summary = aggregate.summary();
    println!();
    output::success(&format!(
        "Synced {} institutions: {} accounts, {} transactions",
        summary.institutions, summary.accounts, summary.transactions
    ));
    if !dry_run {
        println!("  Snapshot: {}", ctx.snapshots.dir().display());
    }

    Ok(())
}
