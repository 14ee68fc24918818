//! Command-line interface for crossmark.

use clap::{Parser, Subcommand};
use crossmark_server::{ClientTimeoutPolicy, ConfigError, ServerConfig, TimerMode};
use std::path::PathBuf;
use tracing::{debug, instrument};

/// Crossmark - two-seat tic-tac-toe match server
#[derive(Parser, Debug)]
#[command(name = "crossmark")]
#[command(about = "Two-seat tic-tac-toe match server over WebSocket", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the match server
    Serve {
        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Deadline enforcement mode (overrides config)
        #[arg(long, value_enum)]
        timer_mode: Option<TimerMode>,

        /// Treatment of client turn timeout reports (overrides config)
        #[arg(long, value_enum)]
        client_timeout: Option<ClientTimeoutPolicy>,
    },
}

/// Builds the server config: file (or defaults), then flag overrides.
#[instrument(skip_all)]
pub fn resolve_config(
    config: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    timer_mode: Option<TimerMode>,
    client_timeout: Option<ClientTimeoutPolicy>,
) -> Result<ServerConfig, ConfigError> {
    let mut resolved = match config {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };

    if let Some(host) = host {
        resolved = resolved.with_host(host);
    }
    if let Some(port) = port {
        resolved = resolved.with_port(port);
    }
    if let Some(mode) = timer_mode {
        let session = resolved.session().clone().with_timer_mode(mode);
        resolved = resolved.with_session(session);
    }
    if let Some(policy) = client_timeout {
        let session = resolved.session().clone().with_client_timeout(policy);
        resolved = resolved.with_session(session);
    }

    debug!(?resolved, "Resolved server config");
    Ok(resolved)
}
