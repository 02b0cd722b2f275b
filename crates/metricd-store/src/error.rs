//! Error types for the metric store and its journal.

use metricd_core::{CodecError, MetricKind};
use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store, journal, or restore operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid metric: {0}")]
    InvalidMetric(String),

    #[error("metric {id:?} is stored as a {stored}, cannot apply a {incoming} update")]
    KindConflict {
        id: String,
        stored: MetricKind,
        incoming: MetricKind,
    },

    #[error("counter {id:?} would overflow a signed 64-bit total")]
    CounterOverflow { id: String },

    #[error("failed to open journal: {0}")]
    Open(String),

    #[error("journal write error: {0}")]
    Write(String),

    #[error("journal read error: {0}")]
    Read(String),

    #[error("encode error: {0}")]
    Encode(#[from] CodecError),

    #[error("corrupt journal record at line {line}: {source}")]
    CorruptRecord { line: usize, source: CodecError },
}
