//! Config command - show the effective configuration

use anyhow::Result;
use colored::Colorize;
use serde_json::json;

use bankhub_core::config::Config;

use super::get_bankhub_dir;
use crate::output;

pub fn run(json: bool) -> Result<()> {
    let bankhub_dir = get_bankhub_dir()?;
    let config = Config::load(&bankhub_dir)?;
    let secret = if config.client_secret.is_some() {
        "<set>"
    } else {
        "<not set>"
    };

    if json {
        let value = json!({
            "directory": bankhub_dir,
            "baseUrl": config.base_url,
            "clientId": config.client_id,
            "clientSecret": secret,
            "timeoutSecs": config.timeout.as_secs(),
            "credentialTtlMinutes": config.credential_ttl_minutes,
            "pageSize": config.page_size,
            "demoMode": config.demo_mode,
            "allowList": config.allow_list,
            "connections": config.pinned_connections,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let mut table = output::create_table();
    table.add_row(vec!["Directory".to_string(), bankhub_dir.display().to_string()]);
    table.add_row(vec!["Base URL".to_string(), config.base_url.clone()]);
    table.add_row(vec![
        "Client ID".to_string(),
        config.client_id.clone().unwrap_or_else(|| "<not set>".to_string()),
    ]);
    table.add_row(vec!["Client secret".to_string(), secret.to_string()]);
    table.add_row(vec![
        "Timeout".to_string(),
        format!("{}s", config.timeout.as_secs()),
    ]);
    table.add_row(vec![
        "Token validity".to_string(),
        format!("{} min", config.credential_ttl_minutes),
    ]);
    table.add_row(vec!["Page size".to_string(), config.page_size.to_string()]);
    table.add_row(vec![
        "Demo mode".to_string(),
        if config.demo_mode { "on" } else { "off" }.to_string(),
    ]);
    table.add_row(vec!["Institutions".to_string(), config.allow_list.join(", ")]);
    for (name, connection) in &config.pinned_connections {
        table.add_row(vec![format!("  {} connection", name), connection.clone()]);
    }
    println!("{}", table);

    if let Err(e) = config.validate() {
        println!("{} {}", "Invalid:".red(), e);
    }

    Ok(())
}
