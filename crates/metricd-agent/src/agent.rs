//! Agent: runs the poll loop and the report loop as independent tasks.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::buffer::PendingBuffer;
use crate::reporter::Reporter;
use crate::sampler::Sampler;

/// Outcome of one report pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub sent: usize,
    pub failed: usize,
    /// Metrics left unsent because shutdown was signalled mid-pass.
    pub skipped: usize,
}

/// The producing side: samples on one interval, reports on another.
pub struct Agent {
    sampler: Box<dyn Sampler>,
    buffer: Arc<PendingBuffer>,
    reporter: Reporter,
    poll_interval: Duration,
    report_interval: Duration,
}

impl Agent {
    pub fn new(
        sampler: impl Sampler + 'static,
        reporter: Reporter,
        poll_interval: Duration,
        report_interval: Duration,
    ) -> Self {
        Self {
            sampler: Box::new(sampler),
            buffer: Arc::new(PendingBuffer::new()),
            reporter,
            poll_interval,
            report_interval,
        }
    }

    /// Shared handle to the pending buffer.
    pub fn buffer(&self) -> Arc<PendingBuffer> {
        self.buffer.clone()
    }

    /// Run both loops until shutdown signal.
    ///
    /// A panic in one loop is logged and does not stop the other.
    pub async fn run(self, shutdown: watch::Receiver<bool>) {
        let Agent {
            sampler,
            buffer,
            reporter,
            poll_interval,
            report_interval,
        } = self;

        info!(
            server = reporter.address(),
            poll_ms = poll_interval.as_millis() as u64,
            report_ms = report_interval.as_millis() as u64,
            "agent started"
        );

        let poll = tokio::spawn(poll_loop(
            sampler,
            buffer.clone(),
            poll_interval,
            shutdown.clone(),
        ));
        let report = tokio::spawn(report_loop(reporter, buffer, report_interval, shutdown));

        let (poll, report) = tokio::join!(poll, report);
        if let Err(e) = poll {
            error!(error = %e, "poll task aborted");
        }
        if let Err(e) = report {
            error!(error = %e, "report task aborted");
        }
        info!("agent stopped");
    }
}

fn ticker(period: Duration) -> tokio::time::Interval {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

async fn poll_loop(
    mut sampler: Box<dyn Sampler>,
    buffer: Arc<PendingBuffer>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = ticker(period);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let batch = sampler.sample();
                buffer.absorb(batch).await;
            }
            _ = shutdown.changed() => {
                debug!("poll loop shutting down");
                break;
            }
        }
    }
}

async fn report_loop(
    reporter: Reporter,
    buffer: Arc<PendingBuffer>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = ticker(period);
    // The first tick completes immediately; wait a full period for samples.
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let summary = report_once(&reporter, &buffer, &shutdown).await;
                if summary.failed > 0 {
                    warn!(sent = summary.sent, failed = summary.failed, "report incomplete");
                } else {
                    debug!(sent = summary.sent, "report complete");
                }
            }
            _ = shutdown.changed() => {
                debug!("report loop shutting down");
                break;
            }
        }
    }
}

/// Send every pending metric once, checking for shutdown between sends.
pub async fn report_once(
    reporter: &Reporter,
    buffer: &PendingBuffer,
    shutdown: &watch::Receiver<bool>,
) -> ReportSummary {
    let pending = buffer.snapshot().await;
    let mut summary = ReportSummary::default();

    for (i, metric) in pending.iter().enumerate() {
        if *shutdown.borrow() {
            summary.skipped = pending.len() - i;
            break;
        }
        match reporter.send(metric).await {
            Ok(()) => {
                buffer.acknowledge(metric).await;
                summary.sent += 1;
            }
            Err(e) => {
                // Dropped for this tick; the next report supersedes it.
                warn!(id = %metric.id, error = %e, "metric dropped");
                summary.failed += 1;
            }
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use metricd_api::{MetricService, build_router};
    use metricd_core::Metric;
    use metricd_store::MetricStore;

    struct FixedSampler {
        polls: Arc<AtomicUsize>,
    }

    impl Sampler for FixedSampler {
        fn sample(&mut self) -> Vec<Metric> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            vec![Metric::counter("PollCount", 1), Metric::gauge("Load", 0.5)]
        }
    }

    async fn spawn_server() -> (String, MetricStore) {
        let store = MetricStore::new();
        let router = build_router(MetricService::new(store.clone()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (addr, store)
    }

    fn closed_port() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        addr.to_string()
    }

    fn fast_reporter(address: String) -> Reporter {
        Reporter::new(address).with_retry(Duration::from_millis(500), 2, Duration::from_millis(10))
    }

    #[tokio::test]
    async fn report_once_delivers_and_acknowledges() {
        let (addr, store) = spawn_server().await;
        let reporter = fast_reporter(addr);
        let buffer = PendingBuffer::new();
        buffer
            .absorb(vec![Metric::counter("PollCount", 3), Metric::gauge("Load", 0.25)])
            .await;

        let (_tx, rx) = watch::channel(false);
        let summary = report_once(&reporter, &buffer, &rx).await;

        assert_eq!(summary, ReportSummary { sent: 2, failed: 0, skipped: 0 });
        assert_eq!(store.get("PollCount"), Some(Metric::counter("PollCount", 3)));
        assert_eq!(store.get("Load"), Some(Metric::gauge("Load", 0.25)));
        // The delivered counter delta is cleared; the gauge stays for the next report.
        assert_eq!(buffer.snapshot().await, vec![Metric::gauge("Load", 0.25)]);
    }

    #[tokio::test]
    async fn failed_counter_is_superseded_by_next_report() {
        let reporter = fast_reporter(closed_port());
        let buffer = PendingBuffer::new();
        buffer.absorb(vec![Metric::counter("PollCount", 1)]).await;

        let (_tx, rx) = watch::channel(false);
        let summary = report_once(&reporter, &buffer, &rx).await;
        assert_eq!(summary.failed, 1);

        buffer.absorb(vec![Metric::counter("PollCount", 1)]).await;
        assert_eq!(buffer.snapshot().await, vec![Metric::counter("PollCount", 2)]);
    }

    #[tokio::test]
    async fn shutdown_stops_report_between_sends() {
        let reporter = fast_reporter(closed_port());
        let buffer = PendingBuffer::new();
        buffer
            .absorb(vec![Metric::gauge("A", 1.0), Metric::gauge("B", 2.0)])
            .await;

        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();
        let summary = report_once(&reporter, &buffer, &rx).await;

        assert_eq!(summary, ReportSummary { sent: 0, failed: 0, skipped: 2 });
    }

    #[tokio::test]
    async fn run_delivers_every_poll_exactly_once() {
        let (addr, store) = spawn_server().await;
        let polls = Arc::new(AtomicUsize::new(0));
        let agent = Agent::new(
            FixedSampler {
                polls: polls.clone(),
            },
            fast_reporter(addr),
            Duration::from_millis(10),
            Duration::from_millis(40),
        );
        let buffer = agent.buffer();

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(agent.run(rx));
        tokio::time::sleep(Duration::from_millis(250)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        let delivered = store.get("PollCount").and_then(|m| m.delta()).unwrap_or(0);
        let pending = buffer
            .snapshot()
            .await
            .iter()
            .find(|m| m.id == "PollCount")
            .and_then(Metric::delta)
            .unwrap_or(0);

        assert!(delivered > 0, "at least one report should have landed");
        assert_eq!((delivered + pending) as usize, polls.load(Ordering::SeqCst));
        assert_eq!(store.get("Load"), Some(Metric::gauge("Load", 0.5)));
    }
}
