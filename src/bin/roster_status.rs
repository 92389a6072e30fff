//! Roster status probe
//!
//! Loads a client configuration, asks any reachable roster node for its
//! status and prints the reply. Handy for checking a roster file before
//! pointing an application at it.

use anyhow::{Context, Result};
use clap::Parser;
use roster_client::{Config, RosterLedgerClient};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "roster-status", about = "Query the status of a ledger roster")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml", env = "ROSTER_CONFIG")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config =
        Config::load(&args.config).with_context(|| format!("loading {}", args.config))?;
    let roster = config.roster();
    info!(nodes = roster.len(), "probing roster");

    let mut client = RosterLedgerClient::new(&roster).context("building ledger client")?;
    client.set_timeout(config.timeout());

    let status = client.status().await.context("status request failed")?;
    println!("node:             {}", status.node);
    println!("protocol version: {}", status.protocol_version);
    Ok(())
}
