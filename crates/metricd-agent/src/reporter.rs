//! Reporter: delivers encoded records to the server over HTTP/1.1.
//!
//! Each attempt is bounded by a timeout; a failed attempt is retried after a
//! fixed backoff up to a small attempt budget. Responses that reject the
//! record itself (4xx, 501) are not retried.
//!
//! Counter updates are not idempotent. An attempt that times out after the
//! server already applied it is still retried, and the delta is then counted
//! twice on the server.

use std::time::Duration;

use bytes::Bytes;
use http_body_util::Full;
use metricd_core::{Metric, encode};
use tracing::{debug, warn};

use crate::error::{AgentError, AgentResult};

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);
/// Default total attempts per metric.
pub const DEFAULT_ATTEMPTS: u32 = 3;
/// Default pause between attempts.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

const UPDATE_PATH: &str = "/update/";

/// Posts metric records to `http://{address}/update/`.
#[derive(Debug, Clone)]
pub struct Reporter {
    address: String,
    timeout: Duration,
    attempts: u32,
    backoff: Duration,
}

impl Reporter {
    /// Create a reporter with the default timeout and retry budget.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            timeout: DEFAULT_TIMEOUT,
            attempts: DEFAULT_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }

    /// Override the retry policy.
    pub fn with_retry(mut self, timeout: Duration, attempts: u32, backoff: Duration) -> Self {
        self.timeout = timeout;
        self.attempts = attempts.max(1);
        self.backoff = backoff;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Send one metric, retrying on failure.
    pub async fn send(&self, metric: &Metric) -> AgentResult<()> {
        let body = Bytes::from(encode(metric)?);

        let mut attempt = 1;
        loop {
            match self.post_once(body.clone()).await {
                Ok(()) => {
                    debug!(id = %metric.id, attempt, "metric delivered");
                    return Ok(());
                }
                Err(e) if e.is_retryable() && attempt < self.attempts => {
                    warn!(id = %metric.id, attempt, error = %e, "send failed, retrying");
                    tokio::time::sleep(self.backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn post_once(&self, body: Bytes) -> AgentResult<()> {
        match tokio::time::timeout(self.timeout, self.post(body)).await {
            Ok(result) => result,
            Err(_) => Err(AgentError::Timeout(self.timeout)),
        }
    }

    async fn post(&self, body: Bytes) -> AgentResult<()> {
        let address = self.address.as_str();

        let stream = tokio::net::TcpStream::connect(address)
            .await
            .map_err(|e| AgentError::Connect(e.to_string()))?;

        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| AgentError::Connect(e.to_string()))?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            let _ = conn.await;
        });

        let req = http::Request::builder()
            .method("POST")
            .uri(UPDATE_PATH)
            .header("host", address)
            .header("content-type", "application/json")
            .header("user-agent", "metricd-agent/0.1")
            .body(Full::new(body))
            .map_err(|e| AgentError::Request(e.to_string()))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| AgentError::Request(e.to_string()))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(AgentError::Status(resp.status().as_u16()))
        }
    }
}
