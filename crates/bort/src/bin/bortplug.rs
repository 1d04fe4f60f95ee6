//! The bort plugin host.
//!
//! Builds the registry from the built-in plugins, runs their setup and
//! serves the bridge until interrupted.
//!
//! ```bash
//! bortplug -a :1234 -c bort.toml
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use bort_runtime::logging::LoggingBuilder;
use bort_runtime::{ConfigLoader, PluginHost, shutdown_signal};
use clap::Parser;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "bortplug", version, about = "bort plugin host")]
struct Cli {
    /// Address the bridge listens on
    #[arg(short = 'a', long)]
    address: Option<String>,

    /// Configuration file
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::new()
        .maybe_file(cli.config.as_ref())
        .set_opt("bridge.address", cli.address)
        .load()
        .context("failed to load configuration")?;

    LoggingBuilder::from_config(&config.logging).init();

    let host = PluginHost::from_config(&config);
    let failed = bort_plugins::register_all(host.registry(), host.outbox_sender());
    if !failed.is_empty() {
        warn!(failed = failed.len(), "Continuing without plugins that failed to register");
    }
    host.setup_from_config(&config);

    info!(address = %config.bridge.address, "Starting plugin host");
    host.serve(&config.bridge.address, shutdown_signal()).await?;
    Ok(())
}
