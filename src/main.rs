use clap::{Parser, Subcommand};
use colored::Colorize;
use inv365::cmd;
use inv365::cmd::config::ConfigCommands;
use inv365::cmd::devices::DevicesCommands;
use inv365::config::ConfigManager;
use inv365::error;

#[derive(Parser, Debug)]
#[command(
    name = "inv365",
    about = "Reconcile Autopilot, Intune and Entra device inventories",
    version,
    long_about = "Read-only Microsoft 365 device inventory reporting\n\n\
                  Joins Windows Autopilot registrations with Intune managed devices and\n\
                  Entra directory devices, and renders an interactive HTML report."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Report on Autopilot devices and their Intune / Entra counterparts
    #[command(subcommand)]
    Devices(DevicesCommands),

    /// Inspect local configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> error::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("inv365=debug")
            .init();
    } else if let Some(level) = configured_log_level() {
        tracing_subscriber::fmt()
            .with_env_filter(format!("inv365={}", level))
            .init();
    }

    match cli.command {
        Commands::Devices(devices_cmd) => match devices_cmd {
            DevicesCommands::Report(args) => cmd::devices::report(args).await?,
            DevicesCommands::List(args) => cmd::devices::list(args).await?,
        },
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Show => cmd::config::show().await?,
            ConfigCommands::Path => cmd::config::path().await?,
            ConfigCommands::Init(args) => cmd::config::init(args).await?,
        },
    }

    Ok(())
}

/// `log_level` from config.toml; unreadable config leaves logging off
fn configured_log_level() -> Option<String> {
    let config = ConfigManager::new().ok()?.load_config().ok()?;
    Some(config.log_level).filter(|level| !level.is_empty())
}
