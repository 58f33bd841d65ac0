//! HTTP transport toward backend replicas.

use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::Request;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use ridegate_dispatch::{Transport, TransportError};
use ridegate_metrics::GatewayMetricsCollector;
use serde_json::Value;

/// `Transport` implementation that speaks HTTP+JSON to replicas.
///
/// An operation is executed as `POST {address}/{operation}` with the payload
/// as the JSON body. A 2xx response body is parsed as the JSON result; 4xx
/// and 5xx statuses map to the client/server error categories, and
/// connection or body failures to the network category. Per-attempt
/// timeouts are enforced by the dispatcher, not here.
///
/// One pooled hyper client is shared by all calls; every forwarded attempt
/// is recorded against the target replica's metrics.
pub struct HttpReplicaTransport {
    client: Client<HttpConnector, Full<Bytes>>,
    metrics: GatewayMetricsCollector,
}

impl HttpReplicaTransport {
    pub fn new(metrics: GatewayMetricsCollector) -> Self {
        let client = Client::builder(TokioExecutor::new()).build_http();
        Self { client, metrics }
    }
}

#[async_trait]
impl Transport for HttpReplicaTransport {
    async fn call(
        &self,
        address: &str,
        operation: &str,
        payload: &Value,
    ) -> Result<Value, TransportError> {
        self.metrics.record_replica_request(address);

        let url = format!("{}/{}", address.trim_end_matches('/'), operation);
        let body = serde_json::to_vec(payload)
            .map_err(|e| TransportError::Client(format!("failed to encode payload: {}", e)))?;

        let request = Request::builder()
            .method("POST")
            .uri(&url)
            .header("Content-Type", "application/json")
            .body(Full::new(Bytes::from(body)))
            .map_err(|e| TransportError::Network(format!("failed to build request: {}", e)))?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| TransportError::Network(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| TransportError::Network(format!("failed to read response: {}", e)))?
            .to_bytes();

        if status.is_client_error() {
            return Err(TransportError::Client(format!(
                "{}: {}",
                status,
                String::from_utf8_lossy(&body)
            )));
        }
        if !status.is_success() {
            return Err(TransportError::Server(format!(
                "{}: {}",
                status,
                String::from_utf8_lossy(&body)
            )));
        }

        serde_json::from_slice(&body).map_err(|e| {
            TransportError::Server(format!("replica returned invalid JSON: {}", e))
        })
    }
}
