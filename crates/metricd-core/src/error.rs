//! Error types for the record codec.

use thiserror::Error;

/// Result type alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors raised while encoding or decoding metric records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The `type` discriminant names neither `counter` nor `gauge`.
    #[error("unknown metric kind: {0:?}")]
    UnknownKind(String),

    /// The record is not valid for the kind it declares.
    #[error("malformed record: {0}")]
    Malformed(String),

    /// Gauge values must be finite to be representable in JSON.
    #[error("gauge {id:?} has a non-finite value")]
    NonFinite { id: String },
}
