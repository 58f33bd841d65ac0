use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Gateway build and uptime information, served at `/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayInfo {
    pub status: String,
    pub version: String,
    pub uptime_ms: u64,
}

impl GatewayInfo {
    pub fn new(uptime_ms: u64) -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_ms,
        }
    }
}

/// Metrics for a single gateway operation (e.g. `make_order`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationMetrics {
    pub call_count: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub avg_latency_us: u64,
    pub p50_latency_us: u64,
    pub p95_latency_us: u64,
    pub p99_latency_us: u64,
}

/// Forwarding metrics for a single backend replica.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicaMetrics {
    pub address: String,
    pub request_count: u64,
    pub last_request_ms: u64,
}

/// Complete metrics snapshot, serialized at `/metrics`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub uptime_ms: u64,
    pub operations: HashMap<String, OperationMetrics>,
    /// Keyed by replica address
    pub replicas: HashMap<String, ReplicaMetrics>,
}
