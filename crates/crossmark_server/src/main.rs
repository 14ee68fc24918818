//! Crossmark - match server binary.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Command::Serve {
            config,
            host,
            port,
            timer_mode,
            client_timeout,
        } => {
            let config = cli::resolve_config(config, host, port, timer_mode, client_timeout)?;
            info!(addr = %config.bind_addr(), "Starting crossmark match server");
            crossmark_server::serve(config).await
        }
    }
}
