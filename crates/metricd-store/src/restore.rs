//! Restore: rebuild a store by replaying the journal in file order.
//!
//! Replay is a straight overwrite: each record already carries the running
//! total (counters) or latest reading (gauges) at the time it was written,
//! so the last record for an id wins and nothing is re-accumulated.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;

use metricd_core::decode;
use tracing::info;

use crate::error::{StoreError, StoreResult};
use crate::store::MetricStore;

/// Replay the journal at `path` into a fresh store.
///
/// A missing or empty journal yields an empty store. Any record that fails
/// to decode aborts the restore with [`StoreError::CorruptRecord`].
pub fn restore(path: &Path) -> StoreResult<MetricStore> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!(?path, "no journal to restore, starting empty");
            return Ok(MetricStore::new());
        }
        Err(e) => return Err(StoreError::Open(e.to_string())),
    };
    let store = replay(BufReader::new(file))?;
    info!(?path, metrics = store.len(), "journal restored");
    Ok(store)
}

/// Replay newline-delimited records from any buffered reader.
///
/// Lines are decoded as raw bytes, so a line that is not valid UTF-8 is
/// reported as a corrupt record with its line number.
pub fn replay<R: BufRead>(reader: R) -> StoreResult<MetricStore> {
    let mut entries = HashMap::new();
    for (idx, line) in reader.split(b'\n').enumerate() {
        let line = line.map_err(|e| StoreError::Read(e.to_string()))?;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        let metric = decode(&line).map_err(|source| StoreError::CorruptRecord {
            line: idx + 1,
            source,
        })?;
        entries.insert(metric.id.clone(), metric);
    }
    Ok(MetricStore::from_entries(entries))
}
