mod cli;
mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use torrentdb_core::{load_config_or_default, validate_config};

use cli::{Cli, Command};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config_or_default(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("Failed to load config from {:?}", path),
        None => "Failed to load configuration".to_string(),
    })?;
    validate_config(&config).context("Configuration validation failed")?;

    match cli.command {
        Command::Ingest(args) => {
            let summary = commands::ingest(config, args)?;
            info!(
                "Processed {} torrents ({} new, {} updated), rejected {}, store holds {}",
                summary.processed(),
                summary.new,
                summary.updated,
                summary.rejected,
                summary.total()
            );
        }
        Command::Query(args) => println!("{}", commands::query(config, args).await?),
        Command::Parse(args) => println!("{}", commands::parse(args)?),
        Command::Scrape(args) => println!("{}", commands::scrape(args)?),
    }

    Ok(())
}
