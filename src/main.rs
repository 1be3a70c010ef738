mod commands;
mod render;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use staybook_core::{Marketplace, StaybookConfig};

#[derive(Parser)]
#[command(name = "staybook")]
#[command(about = "Manage rental availability, iCal feeds and bookings from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every property with its status and bookable night count
    Properties,
    /// Show the bookable dates of a property
    Availability {
        property: String,

        /// First date to show (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last date to show (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Refetch iCal feeds and recompute availability
    Refresh {
        /// Only refresh this property
        #[arg(short, long)]
        property: Option<String>,
    },
    /// Fetch an iCal feed and print its events
    Feed { url: String },
    /// Write a property's bookings as an iCal calendar
    Export {
        property: String,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Cancel unpaid holds older than the configured hold TTL
    ExpireHolds,
    /// Show config and data paths
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "staybook=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = StaybookConfig::load().context("Failed to load config")?;
    tracing::debug!(data_dir = %config.data_path().display(), "config loaded");

    if let Commands::Config = cli.command {
        return commands::config::run(&config);
    }

    let market = Marketplace::from_config(&config)
        .await
        .context("Failed to open the data directory")?;

    match cli.command {
        Commands::Properties => commands::properties::run(&market).await,
        Commands::Availability { property, from, to } => {
            commands::availability::run(&market, &property, from, to).await
        }
        Commands::Refresh { property } => commands::refresh::run(&market, property.as_deref()).await,
        Commands::Feed { url } => commands::feed::run(&market, &url).await,
        Commands::Export { property, output } => {
            commands::export::run(&market, &property, output.as_deref()).await
        }
        Commands::ExpireHolds => commands::expire::run(&market).await,
        Commands::Config => commands::config::run(&config),
    }
}
