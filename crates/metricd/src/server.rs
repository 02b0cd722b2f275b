//! Server mode: restore, serve, persist.
//!
//! Startup order matters: the journal is replayed before the listener is
//! bound, and a corrupt journal aborts startup rather than serving a
//! partially restored store.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing::info;

use metricd_api::{MetricService, build_router};
use metricd_store::{Journal, MetricStore, PersistMode, Snapshotter, restore};

use crate::config::ServerArgs;

/// Run the metric server until a shutdown signal arrives.
pub async fn run_server(args: ServerArgs) -> anyhow::Result<()> {
    info!(
        address = %args.address,
        store_interval = ?args.store_interval,
        store_file = %args.store_file,
        restore = args.restore,
        "metricd server starting"
    );

    let journal_path = args.journal_path();

    // ── Restore ────────────────────────────────────────────────

    let store = match &journal_path {
        Some(path) if args.restore => restore(path)
            .with_context(|| format!("failed to restore metrics from {}", path.display()))?,
        _ => MetricStore::new(),
    };
    info!(metrics = store.len(), "metric store ready");

    // ── Persistence ────────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut snapshot_handle = None;

    let service = match journal_path {
        Some(path) => {
            let journal = Arc::new(
                Journal::open(&path)
                    .with_context(|| format!("failed to open journal {}", path.display()))?,
            );
            let mode = PersistMode::from_interval(args.store_interval);
            if let PersistMode::Interval(interval) = mode {
                let snapshotter = Snapshotter::new(store.clone(), journal.clone(), interval);
                let rx = shutdown_rx.clone();
                snapshot_handle = Some(tokio::spawn(async move {
                    snapshotter.run(rx).await;
                }));
            }
            info!(path = ?path, ?mode, "journal persistence enabled");
            MetricService::with_journal(store, journal, mode)
        }
        None => {
            info!("persistence disabled");
            MetricService::new(store)
        }
    };

    // ── API server ─────────────────────────────────────────────

    let router = build_router(service);
    let listener = tokio::net::TcpListener::bind(&args.address)
        .await
        .with_context(|| format!("failed to bind {}", args.address))?;
    info!(addr = %listener.local_addr()?, "API server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            crate::shutdown_signal().await;
            let _ = shutdown_tx.send(true);
        })
        .await?;

    // Wait for the final snapshot.
    if let Some(handle) = snapshot_handle {
        let _ = handle.await;
    }

    info!("metricd server stopped");
    Ok(())
}
