use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Instant, SystemTime};

use crate::snapshot::{MetricsSnapshot, OperationMetrics, ReplicaMetrics};

const NUM_HISTOGRAM_BINS: usize = 100;

/// Wall-clock milliseconds since the Unix epoch, 0 if the clock is broken.
fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Logarithmic latency histogram for percentile estimation.
///
/// 100 bins cover 1us to ~1s: each power-of-ten decade is split into 10
/// equal subdivisions, with everything past the last bin clamped into it.
/// Recording is lock-free and O(1); percentile estimation is a linear scan
/// over the bins with interpolation inside the winning bin, accurate to a
/// few percent for typical latency distributions.
#[derive(Debug)]
struct LatencyHistogram {
    bins: [AtomicU64; NUM_HISTOGRAM_BINS],
    total_latency: AtomicU64,
    sample_count: AtomicU64,
}

impl LatencyHistogram {
    fn new() -> Self {
        Self {
            bins: std::array::from_fn(|_| AtomicU64::new(0)),
            total_latency: AtomicU64::new(0),
            sample_count: AtomicU64::new(0),
        }
    }

    fn record(&self, latency_us: u64) {
        let bin = Self::bin_for(latency_us);
        self.bins[bin].fetch_add(1, Ordering::Relaxed);
        self.total_latency.fetch_add(latency_us, Ordering::Relaxed);
        self.sample_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Maps a latency to its bin: decade index times ten plus the leading
    /// digit.
    fn bin_for(latency_us: u64) -> usize {
        if latency_us == 0 {
            return 0;
        }
        let decade = latency_us.ilog10() as usize;
        let leading = (latency_us / 10u64.pow(decade as u32)) as usize;
        (decade * 10 + leading).min(NUM_HISTOGRAM_BINS - 1)
    }

    /// Lower bound of a bin's latency range.
    fn bin_floor(bin: usize) -> u64 {
        let decade = (bin / 10) as u32;
        let leading = (bin % 10).max(1) as u64;
        10u64.pow(decade) * leading
    }

    fn estimate_percentile(&self, percentile: u64) -> u64 {
        let total = self.sample_count.load(Ordering::Relaxed);
        if total == 0 {
            return 0;
        }

        let target = (total * percentile) / 100;
        let mut seen = 0;

        for (bin, counter) in self.bins.iter().enumerate() {
            let count = counter.load(Ordering::Relaxed);
            if seen + count >= target {
                let floor = Self::bin_floor(bin);
                let ceil = Self::bin_floor(bin + 1);
                if count == 0 {
                    return (floor + ceil) / 2;
                }
                // Interpolate within the bin.
                let fraction = (target - seen) as f64 / count as f64;
                return (floor as f64 + fraction * (ceil - floor) as f64) as u64;
            }
            seen += count;
        }

        Self::bin_floor(NUM_HISTOGRAM_BINS)
    }

    /// (avg, p50, p95, p99) in microseconds; zeroes with no samples.
    fn percentiles(&self) -> (u64, u64, u64, u64) {
        let total = self.sample_count.load(Ordering::Relaxed);
        if total == 0 {
            return (0, 0, 0, 0);
        }
        let avg = self.total_latency.load(Ordering::Relaxed) / total;
        (
            avg,
            self.estimate_percentile(50),
            self.estimate_percentile(95),
            self.estimate_percentile(99),
        )
    }
}

/// Per-operation counters and latency samples.
///
/// All fields are atomics, so updates after entry creation are lock-free.
/// Relaxed ordering is fine throughout: counters are independent and
/// snapshots are eventually consistent by design.
#[derive(Debug)]
struct OperationStats {
    call_count: AtomicU64,
    success_count: AtomicU64,
    failure_count: AtomicU64,
    latencies: LatencyHistogram,
}

impl OperationStats {
    fn new() -> Self {
        Self {
            call_count: AtomicU64::new(0),
            success_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
            latencies: LatencyHistogram::new(),
        }
    }

    fn record(&self, latency_us: u64, success: bool) {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if success {
            self.success_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failure_count.fetch_add(1, Ordering::Relaxed);
        }
        self.latencies.record(latency_us);
    }

    fn snapshot(&self) -> OperationMetrics {
        let (avg_latency_us, p50_latency_us, p95_latency_us, p99_latency_us) =
            self.latencies.percentiles();
        OperationMetrics {
            call_count: self.call_count.load(Ordering::Relaxed),
            success_count: self.success_count.load(Ordering::Relaxed),
            failure_count: self.failure_count.load(Ordering::Relaxed),
            avg_latency_us,
            p50_latency_us,
            p95_latency_us,
            p99_latency_us,
        }
    }
}

/// Per-replica forwarding counters.
#[derive(Debug)]
struct ReplicaStats {
    address: String,
    request_count: AtomicU64,
    last_request_ms: AtomicU64,
}

impl ReplicaStats {
    fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            request_count: AtomicU64::new(0),
            last_request_ms: AtomicU64::new(0),
        }
    }

    fn record(&self) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        self.last_request_ms.store(unix_millis(), Ordering::Relaxed);
    }

    fn snapshot(&self) -> ReplicaMetrics {
        ReplicaMetrics {
            address: self.address.clone(),
            request_count: self.request_count.load(Ordering::Relaxed),
            last_request_ms: self.last_request_ms.load(Ordering::Relaxed),
        }
    }
}

/// Thread-safe metrics storage for the gateway.
///
/// Hot-path updates (counter increments, histogram samples) are lock-free
/// atomics; the operation and replica maps are behind `RwLock`s that are
/// only write-locked when a new entry appears. Both key sets are closed in
/// practice — the gateway has a fixed route table and the replica set is
/// fixed at startup — so the maps stop growing almost immediately and no
/// eviction is needed.
#[derive(Debug)]
pub struct MetricsRegistry {
    total_requests: AtomicU64,
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
    operations: RwLock<HashMap<String, Arc<OperationStats>>>,
    replicas: RwLock<HashMap<String, Arc<ReplicaStats>>>,
    start_time: Instant,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            successful_requests: AtomicU64::new(0),
            failed_requests: AtomicU64::new(0),
            operations: RwLock::new(HashMap::new()),
            replicas: RwLock::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Records one completed gateway operation.
    pub fn record_operation(&self, operation: &str, latency_us: u64, success: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }

        let stats = {
            let operations = self.operations.read().unwrap();
            operations.get(operation).cloned()
        };
        let stats = match stats {
            Some(stats) => stats,
            None => {
                let mut operations = self.operations.write().unwrap();
                Arc::clone(
                    operations
                        .entry(operation.to_string())
                        .or_insert_with(|| Arc::new(OperationStats::new())),
                )
            }
        };

        stats.record(latency_us, success);
    }

    /// Records one request forwarded to a replica.
    pub fn record_replica_request(&self, address: &str) {
        let stats = {
            let replicas = self.replicas.read().unwrap();
            replicas.get(address).cloned()
        };
        let stats = match stats {
            Some(stats) => stats,
            None => {
                let mut replicas = self.replicas.write().unwrap();
                Arc::clone(
                    replicas
                        .entry(address.to_string())
                        .or_insert_with(|| Arc::new(ReplicaStats::new(address))),
                )
            }
        };

        stats.record();
    }

    /// Milliseconds since the registry was created.
    pub fn uptime_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    /// A point-in-time copy of all metrics. Eventually consistent: counters
    /// read while other threads are recording may be off by in-flight
    /// increments.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let operations = {
            let guard = self.operations.read().unwrap();
            guard
                .iter()
                .map(|(name, stats)| (name.clone(), stats.snapshot()))
                .collect()
        };
        let replicas = {
            let guard = self.replicas.read().unwrap();
            guard
                .iter()
                .map(|(key, stats)| (key.clone(), stats.snapshot()))
                .collect()
        };

        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            uptime_ms: self.uptime_ms(),
            operations,
            replicas,
        }
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_counter_increments() {
        let registry = MetricsRegistry::new();

        registry.record_operation("make_order", 100, true);
        registry.record_operation("make_order", 200, true);
        registry.record_operation("pay_ride", 50, false);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.total_requests, 3);
        assert_eq!(snapshot.successful_requests, 2);
        assert_eq!(snapshot.failed_requests, 1);

        let make_order = snapshot.operations.get("make_order").unwrap();
        assert_eq!(make_order.call_count, 2);
        assert_eq!(make_order.success_count, 2);
        assert_eq!(make_order.avg_latency_us, 150);

        let pay_ride = snapshot.operations.get("pay_ride").unwrap();
        assert_eq!(pay_ride.failure_count, 1);
    }

    #[test]
    fn test_replica_request_tracking() {
        let registry = MetricsRegistry::new();

        registry.record_replica_request("http://a:1");
        registry.record_replica_request("http://a:1");
        registry.record_replica_request("http://b:2");

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.replicas.len(), 2);

        let a = snapshot.replicas.get("http://a:1").unwrap();
        assert_eq!(a.request_count, 2);
        assert_eq!(a.address, "http://a:1");
        assert!(a.last_request_ms > 0);

        let b = snapshot.replicas.get("http://b:2").unwrap();
        assert_eq!(b.request_count, 1);
    }

    #[test]
    fn test_percentile_estimation() {
        let registry = MetricsRegistry::new();

        for i in 1..=1000 {
            registry.record_operation("make_order", i, true);
        }

        let snapshot = registry.snapshot();
        let stats = snapshot.operations.get("make_order").unwrap();

        assert!(stats.p50_latency_us >= 400 && stats.p50_latency_us <= 600);
        assert!(stats.p95_latency_us >= 900 && stats.p95_latency_us <= 999);
        assert!(stats.p99_latency_us >= 980 && stats.p99_latency_us <= 999);
    }

    #[test]
    fn test_empty_histogram_reports_zeroes() {
        let histogram = LatencyHistogram::new();
        assert_eq!(histogram.percentiles(), (0, 0, 0, 0));
    }

    #[test]
    fn test_histogram_bin_mapping() {
        assert_eq!(LatencyHistogram::bin_for(0), 0);
        assert!(LatencyHistogram::bin_for(9) < 10);
        assert!(LatencyHistogram::bin_for(10) >= 10);
        assert!(LatencyHistogram::bin_for(99) < 20);
        assert!(LatencyHistogram::bin_for(100) >= 20);
        // Anything past a second clamps into the last bin.
        assert_eq!(
            LatencyHistogram::bin_for(u64::MAX),
            NUM_HISTOGRAM_BINS - 1
        );
    }

    #[test]
    fn test_concurrent_recording() {
        let registry = Arc::new(MetricsRegistry::new());
        let mut handles = vec![];

        for _ in 0..10 {
            let registry = Arc::clone(&registry);
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    registry.record_operation("make_order", 100, true);
                    registry.record_replica_request("http://a:1");
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.total_requests, 10_000);
        assert_eq!(
            snapshot.operations.get("make_order").unwrap().call_count,
            10_000
        );
        assert_eq!(
            snapshot.replicas.get("http://a:1").unwrap().request_count,
            10_000
        );
    }

    #[test]
    fn test_uptime() {
        let registry = MetricsRegistry::new();
        thread::sleep(Duration::from_millis(10));
        assert!(registry.uptime_ms() >= 10);
    }
}
