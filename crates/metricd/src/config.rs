//! Command-line and environment configuration.
//!
//! Every flag falls back to an environment variable, so the daemon can be
//! configured either way.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "metricd", about = "Runtime metrics server and agent")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the metric server (ingest, query, persistence).
    Server(ServerArgs),
    /// Run the agent (sample runtime statistics and report them).
    Agent(AgentArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Address to listen on.
    #[arg(short = 'a', long, env = "ADDRESS", default_value = "localhost:8080")]
    pub address: String,

    /// Interval between journal snapshots; 0 writes every update through.
    #[arg(short = 'i', long, env = "STORE_INTERVAL", default_value = "300s", value_parser = parse_duration)]
    pub store_interval: Duration,

    /// Journal file; empty disables persistence.
    #[arg(short = 'f', long, env = "STORE_FILE", default_value = "/tmp/devops-metrics-db.json")]
    pub store_file: String,

    /// Replay the journal before serving.
    #[arg(short = 'r', long, env = "RESTORE", default_value_t = false, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub restore: bool,
}

impl ServerArgs {
    /// The journal path, if persistence is enabled.
    pub fn journal_path(&self) -> Option<PathBuf> {
        let trimmed = self.store_file.trim();
        (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
    }
}

#[derive(Args, Debug, Clone)]
pub struct AgentArgs {
    /// Server address to report to.
    #[arg(short = 'a', long, env = "ADDRESS", default_value = "localhost:8080")]
    pub address: String,

    /// Interval between runtime samples.
    #[arg(short = 'p', long, env = "POLL_INTERVAL", default_value = "2s", value_parser = parse_duration)]
    pub poll_interval: Duration,

    /// Interval between reports to the server.
    #[arg(short = 'r', long, env = "REPORT_INTERVAL", default_value = "10s", value_parser = parse_duration)]
    pub report_interval: Duration,
}

/// Parse a duration string like "10s", "500ms", "5m", or bare seconds.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let parsed = if let Some(ms) = s.strip_suffix("ms") {
        ms.parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>().ok().map(|m| Duration::from_secs(m * 60))
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    };
    parsed.ok_or_else(|| format!("invalid duration {s:?} (expected e.g. 10s, 500ms, 5m)"))
}
