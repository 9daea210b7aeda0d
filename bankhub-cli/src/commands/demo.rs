//! Demo command - manage demo mode

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use bankhub_core::config::Config;

use super::get_bankhub_dir;

#[derive(Subcommand)]
pub enum DemoCommands {
    /// Enable demo mode
    #[command(name = "on")]
    On,
    /// Disable demo mode
    #[command(name = "off")]
    Off,
    /// Show demo mode status
    Status,
}

pub fn run(command: Option<DemoCommands>) -> Result<()> {
    let bankhub_dir = get_bankhub_dir()?;
    std::fs::create_dir_all(&bankhub_dir)?;

    match command {
        Some(DemoCommands::On) => {
            let mut config = Config::load_file(&bankhub_dir)?;
            config.enable_demo_mode();
            config.save(&bankhub_dir)?;
            println!("{}", "Demo mode enabled".green());
            println!("Run 'bankhub sync' to aggregate the sample institutions.");
            Ok(())
        }
        Some(DemoCommands::Off) => {
            let mut config = Config::load_file(&bankhub_dir)?;
            config.disable_demo_mode();
            config.save(&bankhub_dir)?;
            println!("{}", "Demo mode disabled".yellow());
            Ok(())
        }
        Some(DemoCommands::Status) | None => {
            if Config::load(&bankhub_dir)?.demo_mode {
                println!("Demo mode is {}", "ON".green());
            } else {
                println!("Demo mode is {}", "OFF".yellow());
            }
            Ok(())
        }
    }
}
