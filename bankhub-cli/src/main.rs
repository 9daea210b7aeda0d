//! Bankhub CLI - Open-banking aggregation in your terminal

use std::process::ExitCode;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{config, demo, institutions, sync, transaction};

/// Environment variable holding the log filter
const LOG_ENV: &str = "BANKHUB_LOG";

/// Bankhub - aggregate accounts and transactions from your banks
#[derive(Parser)]
#[command(name = "bankhub", version, about, long_about = None)]
struct Cli {
    /// Log progress to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch institutions, accounts and transactions
    Sync {
        /// First day of the transaction window (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day of the transaction window (YYYY-MM-DD, defaults to today)
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
        /// Fetch without writing a snapshot
        #[arg(long)]
        dry_run: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List supported institutions and their connections
    Institutions {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a single transaction
    Transaction {
        /// Transaction identifier
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage demo mode
    Demo {
        #[command(subcommand)]
        command: Option<demo::DemoCommands>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Sync {
            from,
            to,
            dry_run,
            json,
        } => sync::run(from, to, dry_run, json),
        Commands::Institutions { json } => institutions::run(json),
        Commands::Transaction { id, json } => transaction::run(&id, json),
        Commands::Config { json } => config::run(json),
        Commands::Demo { command } => demo::run(command),
    }
}
