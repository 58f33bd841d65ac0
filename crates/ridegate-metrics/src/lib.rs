//! Request metrics for the ridegate gateway.
//!
//! Lock-free counters and a logarithmic latency histogram feed a
//! serializable snapshot: global request totals, per-operation latency
//! percentiles (P50/P95/P99) and per-replica forwarding counts. The
//! gateway records one operation sample per inbound request and one
//! replica sample per forwarded attempt, and serves the snapshot at
//! `/metrics`.

mod collector;
mod registry;
mod snapshot;

pub use collector::GatewayMetricsCollector;
pub use registry::MetricsRegistry;
pub use snapshot::{GatewayInfo, MetricsSnapshot, OperationMetrics, ReplicaMetrics};
