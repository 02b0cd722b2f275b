//! Pending buffer: metrics sampled but not yet delivered.
//!
//! Gauges keep only the latest reading. Counters accumulate until a report
//! is acknowledged, so a failed send is superseded by the next report's
//! larger delta instead of being lost.

use std::collections::HashMap;

use metricd_core::{Metric, MetricValue};
use tokio::sync::Mutex;

#[derive(Default)]
pub struct PendingBuffer {
    entries: Mutex<HashMap<String, Metric>>,
}

impl PendingBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a freshly sampled batch.
    pub async fn absorb(&self, batch: Vec<Metric>) {
        let mut entries = self.entries.lock().await;
        for metric in batch {
            match (entries.get_mut(&metric.id), metric.value) {
                (
                    Some(Metric {
                        value: MetricValue::Counter(pending),
                        ..
                    }),
                    MetricValue::Counter(delta),
                ) => *pending = pending.saturating_add(delta),
                _ => {
                    entries.insert(metric.id.clone(), metric);
                }
            }
        }
    }

    /// Copy of everything pending, ordered by id.
    pub async fn snapshot(&self) -> Vec<Metric> {
        let mut all: Vec<Metric> = self.entries.lock().await.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Mark `sent` as delivered.
    ///
    /// For counters the delivered delta is subtracted, keeping anything that
    /// accumulated while the send was in flight. Gauges stay so the latest
    /// reading is re-sent every report.
    pub async fn acknowledge(&self, sent: &Metric) {
        let MetricValue::Counter(delivered) = sent.value else {
            return;
        };
        let mut entries = self.entries.lock().await;
        if let Some(Metric {
            value: MetricValue::Counter(pending),
            ..
        }) = entries.get_mut(&sent.id)
        {
            *pending = pending.saturating_sub(delivered);
            if *pending == 0 {
                entries.remove(&sent.id);
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
