//! Command-line interface for apiseed
//!
//! # Usage Examples
//!
//! ```bash
//! # Resolve every host of a deployment addressed by cluster and namespace
//! apiseed cluster1 ns1 hosts
//!
//! # Resolve the v6 gateway endpoint from API_HOST
//! API_HOST=https://manager.ns1.cluster1.example.com apiseed hosts v6GatewayEndpoint
//!
//! # Sign into the manager app and send 100 requests, 20 at a time
//! apiseed traffic manager /api/orgs --calls 100 --limit 20 \
//!   --username alice --password "$PASSWORD"
//! ```

mod args;
mod commands;

use anyhow::Context;
use apiseed_domain::SharedOptions;
use apiseed_infra::{config, init_logging};
use clap::Parser;

use crate::args::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = config::load(cli.options.into_seed_options())
        .context("Failed to load configuration")?;
    let _logging = init_logging(&SharedOptions::from_options(&config.options))?;
    let source = config::host_source(cli.cluster, cli.namespace);

    match cli.command {
        Commands::Hosts { target, reset } => commands::hosts(&config, source, target, reset).await,
        Commands::Traffic(args) => commands::traffic(&config, source, args).await,
    }
}
