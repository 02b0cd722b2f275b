//! Persistence modes and the batched snapshot writer.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::error::StoreResult;
use crate::journal::Journal;
use crate::store::MetricStore;

/// How updates reach the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistMode {
    /// No journal configured.
    Disabled,
    /// Append the post-update entry on every update.
    WriteThrough,
    /// Append a full snapshot every interval.
    Interval(Duration),
}

impl PersistMode {
    /// A zero interval means write-through.
    pub fn from_interval(interval: Duration) -> Self {
        if interval.is_zero() {
            PersistMode::WriteThrough
        } else {
            PersistMode::Interval(interval)
        }
    }

    pub fn is_write_through(&self) -> bool {
        matches!(self, PersistMode::WriteThrough)
    }
}

/// Periodically appends the full store contents to the journal.
pub struct Snapshotter {
    store: MetricStore,
    journal: Arc<Journal>,
    interval: Duration,
}

impl Snapshotter {
    pub fn new(store: MetricStore, journal: Arc<Journal>, interval: Duration) -> Self {
        Self {
            store,
            journal,
            interval,
        }
    }

    /// Write one snapshot now. Returns the number of records written.
    pub fn flush(&self) -> StoreResult<usize> {
        let snapshot = self.store.get_all();
        let written = self.journal.append_snapshot(&snapshot)?;
        debug!(records = written, "store snapshot persisted");
        Ok(written)
    }

    /// Run the snapshot loop until shutdown signal.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.interval.as_secs_f64(),
            path = ?self.journal.path(),
            "snapshot writer started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.flush() {
                        error!(error = %e, "store snapshot failed");
                    }
                }
                _ = shutdown.changed() => {
                    info!("snapshot writer shutting down");
                    // Final snapshot before exit.
                    if let Err(e) = self.flush() {
                        error!(error = %e, "final store snapshot failed");
                    }
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metricd_core::Metric;

    #[test]
    fn zero_interval_is_write_through() {
        assert_eq!(
            PersistMode::from_interval(Duration::ZERO),
            PersistMode::WriteThrough
        );
        assert_eq!(
            PersistMode::from_interval(Duration::from_secs(300)),
            PersistMode::Interval(Duration::from_secs(300))
        );
        assert!(!PersistMode::Disabled.is_write_through());
    }

    #[test]
    fn flush_writes_current_totals() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");
        let store = MetricStore::new();
        store.update(Metric::counter("hits", 4)).unwrap();
        store.update(Metric::counter("hits", 6)).unwrap();

        let journal = Arc::new(Journal::open(&path).unwrap());
        let snapshotter = Snapshotter::new(store, journal, Duration::from_secs(60));
        assert_eq!(snapshotter.flush().unwrap(), 1);

        let restored = crate::restore(&path).unwrap();
        assert_eq!(restored.get("hits").unwrap().delta(), Some(10));
    }

    #[tokio::test]
    async fn shutdown_writes_final_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");
        let store = MetricStore::new();
        store.update(Metric::gauge("load", 0.9)).unwrap();

        let journal = Arc::new(Journal::open(&path).unwrap());
        let snapshotter = Snapshotter::new(store, journal, Duration::from_secs(3600));

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move { snapshotter.run(rx).await });
        tx.send(true).unwrap();
        handle.await.unwrap();

        let restored = crate::restore(&path).unwrap();
        assert_eq!(restored.get("load").unwrap().gauge_value(), Some(0.9));
    }
}
