//! Error types for the agent.

use metricd_core::CodecError;
use thiserror::Error;

/// Result type alias for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;

/// Errors that can occur while reporting metrics.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("encode error: {0}")]
    Encode(#[from] CodecError),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("server responded with status {0}")]
    Status(u16),

    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl AgentError {
    /// Whether another attempt could succeed.
    ///
    /// Client errors and `501 Not Implemented` are permanent answers about
    /// the record itself; encode failures never reach the network.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Encode(_) => false,
            Self::Status(status) => !(400..500).contains(status) && *status != 501,
            Self::Connect(_) | Self::Request(_) | Self::Timeout(_) => true,
        }
    }
}
