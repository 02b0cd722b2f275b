//! Journal: append-only, newline-delimited metric records on disk.
//!
//! Every append is written and synced before returning, so a record that was
//! acknowledged survives a crash. A failed append is truncated away, leaving
//! no partial line behind. The file is otherwise never rewritten in place.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use metricd_core::{Metric, encode};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};

/// Convert any `Display` error into a `StoreError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StoreError::$variant(e.to_string())
    };
}

/// Append-only writer for metric records.
pub struct Journal {
    path: PathBuf,
    file: Mutex<File>,
}

impl Journal {
    /// Open (or create) a journal for appending.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(map_err!(Open))?;
        debug!(?path, "journal opened");
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a single record and flush it to disk.
    pub fn append(&self, metric: &Metric) -> StoreResult<()> {
        let record = encode(metric)?;
        self.write_records(std::slice::from_ref(&record))?;
        debug!(id = %metric.id, "journal record appended");
        Ok(())
    }

    /// Append a full store snapshot, one record per metric, with a single sync.
    ///
    /// All records are encoded before anything is written, so an encode
    /// failure leaves the journal untouched.
    pub fn append_snapshot(&self, metrics: &[Metric]) -> StoreResult<usize> {
        let records = metrics
            .iter()
            .map(encode)
            .collect::<Result<Vec<_>, _>>()?;
        self.write_records(&records)?;
        debug!(records = records.len(), "journal snapshot appended");
        Ok(records.len())
    }

    fn write_records(&self, records: &[Vec<u8>]) -> StoreResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        let mut buf = Vec::with_capacity(records.iter().map(|r| r.len() + 1).sum());
        for record in records {
            buf.extend_from_slice(record);
            buf.push(b'\n');
        }

        let mut file = self
            .file
            .lock()
            .map_err(|_| StoreError::Write("journal writer poisoned".to_string()))?;
        let start = file.metadata().map_err(map_err!(Write))?.len();
        let written = file
            .write_all(&buf)
            .and_then(|()| file.sync_data())
            .map_err(map_err!(Write));
        if written.is_err() {
            if let Err(e) = file.set_len(start) {
                warn!(path = ?self.path, error = %e, "could not roll back partial journal write");
            }
        }
        written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn append_writes_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");
        let journal = Journal::open(&path).unwrap();

        journal.append(&Metric::counter("hits", 5)).unwrap();
        journal.append(&Metric::gauge("load", 0.5)).unwrap();

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"id":"hits","type":"counter","delta":5}"#);
        assert_eq!(lines[1], r#"{"id":"load","type":"gauge","value":0.5}"#);
    }

    #[test]
    fn reopen_appends_instead_of_truncating() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");

        Journal::open(&path)
            .unwrap()
            .append(&Metric::counter("a", 1))
            .unwrap();
        Journal::open(&path)
            .unwrap()
            .append(&Metric::counter("a", 2))
            .unwrap();

        assert_eq!(read_lines(&path).len(), 2);
    }

    #[test]
    fn snapshot_is_all_or_nothing_on_encode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");
        let journal = Journal::open(&path).unwrap();

        let result = journal.append_snapshot(&[
            Metric::counter("ok", 1),
            Metric::gauge("bad", f64::INFINITY),
        ]);
        assert!(matches!(result, Err(StoreError::Encode(_))));
        assert!(read_lines(&path).is_empty());

        let written = journal
            .append_snapshot(&[Metric::counter("a", 1), Metric::gauge("b", 2.0)])
            .unwrap();
        assert_eq!(written, 2);
        assert_eq!(read_lines(&path).len(), 2);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn append_to_full_device_is_a_write_error() {
        let journal = Journal::open(Path::new("/dev/full")).unwrap();
        assert!(matches!(
            journal.append(&Metric::counter("hits", 1)),
            Err(StoreError::Write(_))
        ));
    }

    #[test]
    fn open_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("metrics.json");
        assert!(matches!(Journal::open(&path), Err(StoreError::Open(_))));
    }
}
