//! The bort front-end.
//!
//! Keeps one IRC connection in one channel and forwards everything to the
//! plugin host. Restarting the plugin host does not drop the connection.
//!
//! ```bash
//! bort -n bort -s irc.libera.chat:6667 -a :1234 '#bort'
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use bort_adapter_irc::IrcConnector;
use bort_runtime::config::validate_frontend;
use bort_runtime::logging::LoggingBuilder;
use bort_runtime::{ConfigLoader, Supervisor, shutdown_signal};
use clap::Parser;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "bort", version, about = "bort IRC front-end")]
struct Cli {
    /// Nick of the bot
    #[arg(short = 'n', long)]
    nick: Option<String>,

    /// IRC server, host:port
    #[arg(short = 's', long)]
    server: Option<String>,

    /// Address of the plugin host
    #[arg(short = 'a', long)]
    address: Option<String>,

    /// Command prefix
    #[arg(short = 'p', long)]
    prefix: Option<String>,

    /// Configuration file
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Channel to join
    channel: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::new()
        .maybe_file(cli.config.as_ref())
        .set_opt("irc.nick", cli.nick)
        .set_opt("irc.server", cli.server)
        .set_opt("irc.prefix", cli.prefix)
        .set_opt("irc.channel", cli.channel)
        .set_opt("bridge.address", cli.address)
        .load()
        .context("failed to load configuration")?;
    validate_frontend(&config)?;

    LoggingBuilder::from_config(&config.logging).init();

    info!(
        server = %config.irc.server,
        nick = %config.irc.nick,
        channel = %config.irc.channel,
        plugin_host = %config.bridge.address,
        "Starting front-end"
    );
    let supervisor = Supervisor::from_config(IrcConnector::from_config(&config.irc), &config);
    supervisor.run_until(shutdown_signal()).await;
    Ok(())
}
