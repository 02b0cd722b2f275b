//! MetricService: the ingest/query facade the HTTP layer calls into.
//!
//! Owns no state of its own: it decodes with the codec, applies updates to
//! the [`MetricStore`], and appends to the [`Journal`] when write-through
//! persistence is active.

use std::sync::Arc;

use metricd_core::{Metric, MetricKind, decode, encode, encode_all, parse_path};
use metricd_store::{Journal, MetricStore, PersistMode};
use tracing::{debug, error};

use crate::error::{ServiceError, ServiceResult};

/// Facade over the store and its journal.
#[derive(Clone)]
pub struct MetricService {
    store: MetricStore,
    journal: Option<Arc<Journal>>,
    mode: PersistMode,
}

impl MetricService {
    /// A service without persistence.
    pub fn new(store: MetricStore) -> Self {
        Self {
            store,
            journal: None,
            mode: PersistMode::Disabled,
        }
    }

    /// A service backed by a journal in the given mode.
    pub fn with_journal(store: MetricStore, journal: Arc<Journal>, mode: PersistMode) -> Self {
        Self {
            store,
            journal: Some(journal),
            mode,
        }
    }

    pub fn store(&self) -> &MetricStore {
        &self.store
    }

    pub fn mode(&self) -> PersistMode {
        self.mode
    }

    /// Apply a decoded metric and persist the resulting entry if write-through.
    ///
    /// In write-through mode the append happens under the store lock and
    /// before the entry is committed: journal order matches update order,
    /// and an update whose append fails is not applied.
    pub fn apply(&self, metric: Metric) -> ServiceResult<Metric> {
        let journal = match &self.journal {
            Some(journal) if self.mode.is_write_through() => journal,
            _ => return Ok(self.store.update(metric)?),
        };
        // The stored copy carries the running total, not the raw delta.
        let stored = self.store.update_with(metric, |stored| {
            journal.append(stored).inspect_err(|e| {
                error!(id = %stored.id, error = %e, "write-through append failed");
            })
        })?;
        Ok(stored)
    }

    /// Ingest a single encoded record.
    pub fn ingest(&self, raw: &[u8]) -> ServiceResult<Metric> {
        let metric = decode(raw)?;
        self.apply(metric)
    }

    /// Ingest the path-parameter form `/{type}/{id}/{value}`.
    pub fn ingest_path(&self, kind: &str, id: &str, value: &str) -> ServiceResult<Metric> {
        let metric = parse_path(kind, id, value)?;
        self.apply(metric)
    }

    /// Ingest newline-delimited records.
    ///
    /// Every line is decoded before any update is applied, so a malformed
    /// line rejects the whole batch. Application then stops at the first
    /// update the store refuses; earlier records stay applied.
    pub fn ingest_batch(&self, raw: &[u8]) -> ServiceResult<usize> {
        let mut metrics = Vec::new();
        for (idx, line) in raw.split(|b| *b == b'\n').enumerate() {
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            let metric = decode(line).map_err(|source| ServiceError::BatchRecord {
                line: idx + 1,
                source,
            })?;
            metrics.push(metric);
        }

        let count = metrics.len();
        for metric in metrics {
            self.apply(metric)?;
        }
        debug!(records = count, "batch ingested");
        Ok(count)
    }

    /// Look up a metric, requiring the stored kind to match `kind`.
    pub fn lookup(&self, id: &str, kind: MetricKind) -> ServiceResult<Metric> {
        self.store
            .get(id)
            .filter(|m| m.kind() == kind)
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))
    }

    /// Encoded record for one metric.
    pub fn query_one(&self, id: &str) -> ServiceResult<Vec<u8>> {
        let metric = self
            .store
            .get(id)
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;
        Ok(encode(&metric)?)
    }

    /// Encoded JSON array of every stored metric; `[]` when empty.
    pub fn query_all(&self) -> ServiceResult<Vec<u8>> {
        Ok(encode_all(&self.store.get_all())?)
    }

    /// Copy of every stored metric, ordered by id.
    pub fn snapshot(&self) -> Vec<Metric> {
        self.store.get_all()
    }
}
