//! metricd: runtime metrics daemon.
//!
//! One binary, two roles:
//! - `server`: accepts metric updates over HTTP, serves queries, and
//!   persists the store to an append-only journal
//! - `agent`: samples process/host runtime statistics and reports them to
//!   a server
//!
//! # Usage
//!
//! ```text
//! metricd server -a localhost:8080 -i 300s -f /tmp/devops-metrics-db.json -r
//! metricd agent -a localhost:8080 -p 2s -r 10s
//! ```

mod agent_mode;
mod config;
mod server;

use clap::Parser;
use tracing::{error, info};

use crate::config::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,metricd=debug")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Server(args) => server::run_server(args).await,
        Command::Agent(args) => agent_mode::run_agent(args).await,
    }
}

/// Resolve on Ctrl-C or, on Unix, SIGTERM.
pub(crate) async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown signal received");
}
