//! Inspect and initialise the local configuration file

use crate::config::{Config, ConfigManager};
use crate::error::Result;
use crate::graph::auth::{REQUIRED_SCOPES, TOKEN_ENV_VAR};
use clap::{Args, Subcommand};
use colored::Colorize;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Print the configuration file path
    Path,

    /// Write a configuration file populated with defaults
    Init(InitArgs),
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing configuration file
    #[arg(long)]
    pub force: bool,
}

pub async fn show() -> Result<()> {
    let manager = ConfigManager::new()?;
    let config = manager.load_config()?;
    let file = manager.config_file();

    println!("\n{}", "Configuration:".bold());
    println!("{}", "─".repeat(60));
    if file.exists() {
        println!("  File:                {}", file.display());
    } else {
        println!("  File:                {} {}", file.display(), "(not found, defaults)".dimmed());
    }
    print_config(&config);

    println!("\n{}", "Graph permissions (read-only):".bold());
    for scope in REQUIRED_SCOPES {
        println!("  • {}", scope);
    }
    println!(
        "\n{} Token from --token, {} or 'az login'",
        "→".cyan(),
        TOKEN_ENV_VAR.bold()
    );
    Ok(())
}

fn print_config(config: &Config) {
    println!("  Graph base URL:      {}", config.graph_base_url.cyan());
    println!("  Output path:         {}", config.output_path.display());
    println!("  Intune device URL:   {}", config.intune_device_url);
    println!("  Entra device URL:    {}", config.entra_device_url);
    println!(
        "  Primary users:       {}",
        if config.include_primary_users {
            "enabled".green()
        } else {
            "disabled".yellow()
        }
    );
    if !config.log_level.is_empty() {
        println!("  Log level:           {}", config.log_level);
    }
}

pub async fn path() -> Result<()> {
    println!("{}", ConfigManager::new()?.config_file().display());
    Ok(())
}

pub async fn init(args: InitArgs) -> Result<()> {
    let manager = ConfigManager::new()?;
    let file = manager.config_file();

    if file.exists() && !args.force {
        println!(
            "{} Configuration already exists at {}",
            "!".yellow(),
            file.display()
        );
        println!("\n{} Use {} to overwrite it", "→".cyan(), "--force".bold());
        return Ok(());
    }

    manager.save_config(&Config::default())?;
    println!("{} Wrote {}", "✓".green().bold(), file.display());
    Ok(())
}
