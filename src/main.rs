use clap::{Parser, Subcommand};
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;

use refdata::api::{ApiClient, ApiConfig};
use refdata::diag;

#[derive(Parser)]
#[command(name = "refdata", about = "Connectivity diagnostics for the reporting backend")]
struct Cli {
    /// Backend base URL (the /exec and /procedure parent); falls back to
    /// REFDATA_BASE_URL
    #[arg(long)]
    base_url: Option<String>,

    /// API token; falls back to REFDATA_TOKEN
    #[arg(long)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe the server for any responding endpoint
    Probe {
        /// Server root to probe (defaults to the base URL without /api)
        #[arg(long)]
        server_root: Option<String>,
    },
    /// Run a full connectivity check (probe + query round trip)
    Check,
}

fn setup_logging() -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("refdata")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("refdata.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn build_config(cli: &Cli) -> ApiConfig {
    let mut config = ApiConfig::default();
    if let Some(base_url) = cli
        .base_url
        .clone()
        .or_else(|| std::env::var("REFDATA_BASE_URL").ok())
    {
        config.base_url = base_url;
    }
    if let Some(token) = cli.token.clone().or_else(|| std::env::var("REFDATA_TOKEN").ok()) {
        config.token = token;
    }
    config
}

/// Server root for probing: the base URL with a trailing /api stripped
fn server_root(base_url: &str) -> String {
    base_url
        .trim_end_matches('/')
        .trim_end_matches("/api")
        .to_string()
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let cli = Cli::parse();
    let config = build_config(&cli);
    let client = ApiClient::new(config.clone()).context("Failed to build API client")?;

    match &cli.command {
        Commands::Probe { server_root: root } => {
            let root = root.clone().unwrap_or_else(|| server_root(&config.base_url));
            println!("{} {}", "Probing".cyan(), root);
            let report = diag::probe_server(&root).await;
            if report.available {
                println!("{} {}", "✓".green(), report);
            } else {
                println!("{} {}", "✗".red(), report);
                std::process::exit(1);
            }
        }
        Commands::Check => {
            let root = server_root(&config.base_url);
            println!("{} {}", "Checking".cyan(), config.base_url);
            let report = diag::connectivity_report(&client, &root).await;
            println!("{}", report);
            if !report.connection.connected {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
