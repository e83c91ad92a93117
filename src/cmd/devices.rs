//! Device inventory commands
//!
//! `devices report` runs the whole pipeline and writes the interactive HTML
//! report; `devices list` prints the same reconciliation to the terminal.

use crate::cmd::progress::{self, Outcome};
use crate::config::{Config, ConfigManager};
use crate::error::Result;
use crate::graph::GraphClient;
use crate::graph::auth::resolve_access_token;
use crate::inventory::fetch::{fetch_inventory, fetch_primary_users};
use crate::inventory::{InventorySummary, PrimaryUsers, ReconciledRow};
use crate::report::columns::{ENROLLED_TEXT, NOT_ENROLLED_TEXT};
use crate::report::export_rows_csv;
use crate::report::html::{ReportMetadata, generate_html_report};
use crate::report::projector::{LinkTemplates, project_all};
use clap::{Args, Subcommand};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Subcommand, Debug)]
pub enum DevicesCommands {
    /// Generate the interactive Autopilot / Intune / Entra HTML report
    Report(ReportArgs),

    /// Print the reconciled device inventory
    List(ListArgs),
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Output path for the HTML report (default from config, then DeviceReport.html)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also write every row as CSV to this path
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Bearer token for Microsoft Graph (otherwise INV365_ACCESS_TOKEN or the Azure CLI session)
    #[arg(long)]
    pub token: Option<String>,

    /// Skip the per-device primary user lookups
    #[arg(long)]
    pub no_users: bool,

    /// Report title
    #[arg(long, default_value = "Autopilot Device Report")]
    pub title: String,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Bearer token for Microsoft Graph
    #[arg(long)]
    pub token: Option<String>,

    /// Only show devices with this group tag
    #[arg(short, long)]
    pub group_tag: Option<String>,

    /// Only show devices Intune does not know
    #[arg(long)]
    pub not_enrolled: bool,

    /// Skip the per-device primary user lookups
    #[arg(long)]
    pub no_users: bool,
}

/// Reconciled rows plus the number of degraded primary-user lookups
struct Collected {
    rows: Vec<ReconciledRow>,
    degraded: usize,
}

async fn collect(config: &Config, token: Option<&str>, include_users: bool) -> Result<Collected> {
    let (access_token, source) = resolve_access_token(token).await?;
    println!("→ Token source: {}", source.as_str().cyan());
    println!("→ Graph endpoint: {}", config.graph_base_url.cyan());

    let graph = GraphClient::with_base_url(access_token, &config.graph_base_url);

    let spinner = progress::listing_spinner("Fetching Autopilot, Intune and Entra devices...");
    let inventory = match fetch_inventory(&graph).await {
        Ok(inventory) => {
            progress::finish(
                &spinner,
                Outcome::Complete,
                &format!("Fetched {} Autopilot devices", inventory.device_count()),
            );
            inventory
        }
        Err(e) => {
            progress::finish(&spinner, Outcome::Failed, "Device listing failed");
            return Err(e);
        }
    };

    let mut users = PrimaryUsers::new();
    let mut degraded = 0;

    if include_users {
        let targets = inventory.primary_user_targets();
        let bar = progress::lookup_bar(targets.len());
        let lookup = fetch_primary_users(&graph, &targets, |_| bar.inc(1)).await;
        degraded = lookup.failed.len();
        if degraded > 0 {
            let message = format!(
                "Primary users: {} found, {} lookup(s) failed",
                lookup.users.len(),
                degraded
            );
            progress::finish(&bar, Outcome::Degraded, &message);
        } else {
            let message = format!("Primary users: {} found", lookup.users.len());
            progress::finish(&bar, Outcome::Complete, &message);
        }
        users = lookup.users;
    }

    Ok(Collected {
        rows: inventory.reconcile(&users),
        degraded,
    })
}

fn print_summary(summary: &InventorySummary, degraded: usize) {
    println!("\n{} Summary:", "→".cyan().bold());
    println!("  Autopilot devices:  {}", summary.devices.to_string().bold());
    println!("  Intune enrolled:    {}", summary.enrolled.to_string().green());
    println!(
        "  Not enrolled:       {}",
        (summary.devices - summary.enrolled).to_string().yellow()
    );
    println!("  Entra matched:      {}", summary.directory_matched);
    println!("  With primary user:  {}", summary.with_primary_user);
    if degraded > 0 {
        println!(
            "  {} {} primary user lookup(s) failed; those rows show no user",
            "⚠".yellow().bold(),
            degraded
        );
    }
}

fn write_output(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, contents)?;
    Ok(())
}

/// Generate the HTML device report
pub async fn report(args: ReportArgs) -> Result<()> {
    println!("{} device inventory report...", "Generating".cyan().bold());

    let config = ConfigManager::new()?.load_config()?;
    let include_users = config.include_primary_users && !args.no_users;

    let collected = collect(&config, args.token.as_deref(), include_users).await?;
    let summary = InventorySummary::from_rows(&collected.rows);

    let links = LinkTemplates::from_config(&config);
    let metadata = ReportMetadata {
        title: args.title.clone(),
        generated_at: chrono::Local::now(),
        summary,
        degraded_lookups: collected.degraded,
    };
    let html = generate_html_report(&metadata, &project_all(&collected.rows, &links));

    let output = args.output.unwrap_or(config.output_path);
    write_output(&output, &html)?;
    println!(
        "\n{} Report written to: {}",
        "✓".green().bold(),
        output.display()
    );

    if let Some(csv_path) = &args.csv {
        write_output(csv_path, &export_rows_csv(&collected.rows)?)?;
        println!("{} CSV written to: {}", "✓".green().bold(), csv_path.display());
    }

    print_summary(&summary, collected.degraded);
    Ok(())
}

fn display(value: &Option<String>) -> &str {
    value.as_deref().filter(|v| !v.is_empty()).unwrap_or("-")
}

/// Print the reconciled inventory
pub async fn list(args: ListArgs) -> Result<()> {
    println!("{} reconciled devices...", "Listing".cyan().bold());

    let config = ConfigManager::new()?.load_config()?;
    let include_users = config.include_primary_users && !args.no_users;
    let collected = collect(&config, args.token.as_deref(), include_users).await?;

    let rows: Vec<&ReconciledRow> = collected
        .rows
        .iter()
        .filter(|r| !args.not_enrolled || !r.enrolled)
        .filter(|r| match &args.group_tag {
            Some(tag) => r
                .group_tag
                .as_deref()
                .is_some_and(|t| t.eq_ignore_ascii_case(tag)),
            None => true,
        })
        .collect();

    if rows.is_empty() {
        println!("\n{} No devices match", "ℹ".blue());
        return Ok(());
    }

    println!("\n{} {} devices", "→".cyan(), rows.len());
    println!(
        "\n{:<20} {:<14} {:<22} {:<22} {:<30} {:<15}",
        "Serial Number", "Status", "Intune Name", "Entra Name", "Primary User", "Group Tag"
    );
    println!("{}", "─".repeat(128));

    for row in rows {
        let status = if row.enrolled {
            format!("{:<14}", ENROLLED_TEXT).green()
        } else {
            format!("{:<14}", NOT_ENROLLED_TEXT).yellow()
        };
        println!(
            "{:<20} {} {:<22} {:<22} {:<30} {:<15}",
            display(&row.serial_number),
            status,
            display(&row.intune_device_name),
            display(&row.entra_device_name),
            display(&row.user_principal_name),
            display(&row.group_tag),
        );
    }

    print_summary(&InventorySummary::from_rows(&collected.rows), collected.degraded);
    Ok(())
}
