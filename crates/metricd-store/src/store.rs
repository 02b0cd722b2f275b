//! MetricStore: the process-wide metric map.
//!
//! Owns the only mutable mapping from metric id to current value. All access
//! goes through [`MetricStore::update`], [`MetricStore::get`] and
//! [`MetricStore::get_all`]; each call holds the lock for the duration of a
//! single map operation and hands back owned copies.
//! [`MetricStore::update_with`] additionally runs a commit hook under the
//! lock, which is how write-through persistence keeps the journal in update
//! order.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use metricd_core::{Metric, MetricValue};
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Thread-safe metric store.
#[derive(Clone, Default)]
pub struct MetricStore {
    entries: Arc<Mutex<HashMap<String, Metric>>>,
}

impl MetricStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with restored entries.
    pub(crate) fn from_entries(entries: HashMap<String, Metric>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(entries)),
        }
    }

    // Every mutation is a single insert, so a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Metric>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply an update and return a copy of the resulting entry.
    ///
    /// Counters accumulate onto an existing counter with the same id; gauges
    /// replace. An update whose kind differs from the stored kind is rejected
    /// and leaves the entry untouched, as is a counter total that would
    /// overflow `i64`.
    pub fn update(&self, metric: Metric) -> StoreResult<Metric> {
        self.update_with(metric, |_| Ok(()))
    }

    /// Apply an update, running `commit` on the resulting entry before it
    /// becomes visible.
    ///
    /// `commit` runs while the store lock is held, so commits for the same
    /// store happen in the same order as the updates they describe. If it
    /// fails, the map is left unchanged and its error is returned.
    pub fn update_with<F>(&self, metric: Metric, commit: F) -> StoreResult<Metric>
    where
        F: FnOnce(&Metric) -> StoreResult<()>,
    {
        if metric.id.is_empty() {
            return Err(StoreError::InvalidMetric("empty metric id".to_string()));
        }
        if let MetricValue::Gauge(v) = metric.value {
            if !v.is_finite() {
                return Err(StoreError::InvalidMetric(format!(
                    "gauge {:?} has a non-finite value",
                    metric.id
                )));
            }
        }

        let mut entries = self.lock();
        let stored = match (entries.get(&metric.id).map(|m| m.value), metric.value) {
            (Some(MetricValue::Counter(total)), MetricValue::Counter(delta)) => {
                let sum = total
                    .checked_add(delta)
                    .ok_or_else(|| StoreError::CounterOverflow {
                        id: metric.id.clone(),
                    })?;
                Metric::counter(metric.id, sum)
            }
            (Some(existing), incoming) if existing.kind() != incoming.kind() => {
                return Err(StoreError::KindConflict {
                    id: metric.id,
                    stored: existing.kind(),
                    incoming: incoming.kind(),
                });
            }
            _ => metric,
        };
        commit(&stored)?;
        entries.insert(stored.id.clone(), stored.clone());
        drop(entries);

        debug!(id = %stored.id, kind = %stored.kind(), value = %stored.render_value(), "metric updated");
        Ok(stored)
    }

    /// Look up a metric by id.
    pub fn get(&self, id: &str) -> Option<Metric> {
        self.lock().get(id).cloned()
    }

    /// Copy out every stored metric, ordered by id.
    pub fn get_all(&self) -> Vec<Metric> {
        let mut all: Vec<Metric> = self.lock().values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Number of stored metrics.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
