use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// A failed replica call.
///
/// The dispatcher treats every variant identically when deciding to retry
/// or blacklist; the split exists for logging and metrics. In particular a
/// client-caused rejection consumes retry budget just like a network fault
/// does, mirroring the behavior of the system this gateway replaces.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The replica rejected the request (HTTP 4xx equivalent).
    #[error("replica rejected request: {0}")]
    Client(String),

    /// The replica failed to process the request (HTTP 5xx equivalent).
    #[error("replica error: {0}")]
    Server(String),

    /// Connection-level failure: refused, reset, unreadable body.
    #[error("network error: {0}")]
    Network(String),

    /// The per-attempt timeout elapsed before a response arrived.
    #[error("attempt timed out after {0}ms")]
    Timeout(u64),
}

/// Abstract replica call supplied by the endpoint layer.
///
/// The dispatcher is transport-agnostic: it hands an address, an operation
/// name and a JSON payload to this seam and interprets any error uniformly.
/// The gateway plugs in an HTTP+JSON implementation; tests plug in scripted
/// fakes.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Executes `operation` with `payload` against the replica at
    /// `address`, returning its JSON result.
    async fn call(
        &self,
        address: &str,
        operation: &str,
        payload: &Value,
    ) -> Result<Value, TransportError>;
}
