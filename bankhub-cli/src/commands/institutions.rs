//! Institutions command - list supported institutions

use anyhow::Result;
use colored::Colorize;

use super::get_context;
use crate::output;

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let institutions = ctx.catalog.list_institutions()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&institutions)?);
        return Ok(());
    }

    if institutions.is_empty() {
        output::warning("None of the configured institutions are offered by the aggregator.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Institution", "ID", "Health", "Connection"]);
    for inst in &institutions {
        table.add_row(vec![
            inst.name.clone(),
            inst.id.clone(),
            inst.health_status.clone(),
            inst.connection_id().unwrap_or("-").to_string(),
        ]);
    }
    println!("{}", table);

    let unlinked = institutions.iter().filter(|i| !i.has_connection()).count();
    if unlinked > 0 {
        println!(
            "{}",
            format!("{} institution(s) have no connection and will be skipped", unlinked).dimmed()
        );
    }

    Ok(())
}
