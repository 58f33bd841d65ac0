use std::sync::Arc;
use std::time::Instant;

use crate::registry::MetricsRegistry;
use crate::snapshot::{GatewayInfo, MetricsSnapshot};

/// Metrics facade used by the gateway.
///
/// Wraps the registry with the `Instant`-based recording interface the
/// request handlers want, and produces the `/status` and `/metrics`
/// payloads. Cheap to clone; all clones share one registry.
#[derive(Clone)]
pub struct GatewayMetricsCollector {
    registry: Arc<MetricsRegistry>,
}

impl GatewayMetricsCollector {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(MetricsRegistry::new()),
        }
    }

    /// Records a completed operation with its latency and outcome.
    ///
    /// `start_time` is the instant the inbound request reached its handler.
    pub fn record_operation(&self, operation: &str, start_time: Instant, success: bool) {
        let latency_us = start_time.elapsed().as_micros() as u64;
        self.registry.record_operation(operation, latency_us, success);
    }

    /// Records that a request was forwarded to a replica.
    pub fn record_replica_request(&self, address: &str) {
        self.registry.record_replica_request(address);
    }

    /// The `/metrics` payload.
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.registry.snapshot()
    }

    /// The `/status` payload.
    pub fn info(&self) -> GatewayInfo {
        GatewayInfo::new(self.registry.uptime_ms())
    }
}

impl Default for GatewayMetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_snapshot() {
        let collector = GatewayMetricsCollector::new();

        let start = Instant::now();
        collector.record_operation("make_order", start, true);
        collector.record_operation("make_order", start, false);
        collector.record_replica_request("http://a:1");

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.total_requests, 2);
        assert_eq!(snapshot.successful_requests, 1);
        assert_eq!(snapshot.failed_requests, 1);
        assert_eq!(
            snapshot.replicas.get("http://a:1").unwrap().request_count,
            1
        );
    }

    #[test]
    fn test_info_reports_version() {
        let collector = GatewayMetricsCollector::new();
        let info = collector.info();
        assert_eq!(info.status, "ok");
        assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_clones_share_registry() {
        let collector = GatewayMetricsCollector::new();
        let clone = collector.clone();

        clone.record_operation("pay_ride", Instant::now(), true);
        assert_eq!(collector.snapshot().total_requests, 1);
    }
}
