//! Service errors and their HTTP mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use metricd_core::CodecError;
use metricd_store::StoreError;
use thiserror::Error;
use tracing::{debug, error};

/// Result type alias for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by the ingest/query facade.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("batch line {line}: {source}")]
    BatchRecord { line: usize, source: CodecError },

    #[error("metric {0:?} not found")]
    NotFound(String),
}

impl ServiceError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Codec(e) | Self::BatchRecord { source: e, .. } => codec_status(e),
            Self::Store(e) => match e {
                StoreError::InvalidMetric(_) | StoreError::CounterOverflow { .. } => {
                    StatusCode::BAD_REQUEST
                }
                StoreError::KindConflict { .. } => StatusCode::CONFLICT,
                StoreError::Encode(e) => codec_status(e),
                StoreError::Open(_)
                | StoreError::Write(_)
                | StoreError::Read(_)
                | StoreError::CorruptRecord { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

fn codec_status(e: &CodecError) -> StatusCode {
    match e {
        CodecError::UnknownKind(_) => StatusCode::NOT_IMPLEMENTED,
        CodecError::Malformed(_) | CodecError::NonFinite { .. } => StatusCode::BAD_REQUEST,
    }
}

/// Error body, mirroring the success/error envelope.
#[derive(serde::Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED {
            error!(error = %self, "request failed");
        } else {
            debug!(error = %self, %status, "request rejected");
        }
        (
            status,
            Json(ErrorBody {
                success: false,
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
