//! Agent mode: sample runtime statistics and report them to a server.

use tokio::sync::watch;
use tracing::info;

use metricd_agent::{Agent, Reporter, RuntimeSampler};

use crate::config::AgentArgs;

/// Run the agent until a shutdown signal arrives.
pub async fn run_agent(args: AgentArgs) -> anyhow::Result<()> {
    anyhow::ensure!(!args.poll_interval.is_zero(), "poll interval must be greater than zero");
    anyhow::ensure!(!args.report_interval.is_zero(), "report interval must be greater than zero");

    info!(
        server = %args.address,
        poll_interval = ?args.poll_interval,
        report_interval = ?args.report_interval,
        "metricd agent starting"
    );

    let agent = Agent::new(
        RuntimeSampler::new(),
        Reporter::new(args.address),
        args.poll_interval,
        args.report_interval,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(agent.run(shutdown_rx));

    crate::shutdown_signal().await;
    let _ = shutdown_tx.send(true);
    handle.await?;

    info!("metricd agent stopped");
    Ok(())
}
