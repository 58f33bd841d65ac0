use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, warn};

use crate::blacklist::BlacklistStore;
use crate::error::DispatchError;
use crate::registry::{Replica, ReplicaRegistry};
use crate::transport::{Transport, TransportError};

/// Tunables for the retry/failover loop.
///
/// All durations must be positive; `validate` is called by the composition
/// root before the gateway starts serving.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Maximum sequential attempts against a single replica before it is
    /// blacklisted. Default: 3
    pub retries_per_replica: u32,
    /// How long an exhausted replica stays excluded. Default: 60s
    pub blacklist_duration: Duration,
    /// Upper bound for a single replica call. Default: 10s
    pub per_call_timeout: Duration,
    /// Upper bound for the whole dispatch, across all replicas and
    /// retries. Default: 30s
    pub request_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            retries_per_replica: 3,
            blacklist_duration: Duration::from_secs(60),
            per_call_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl DispatchConfig {
    /// Rejects zero retry budgets and zero durations.
    pub fn validate(&self) -> Result<(), String> {
        if self.retries_per_replica == 0 {
            return Err("retries_per_replica must be at least 1".to_string());
        }
        if self.blacklist_duration.is_zero() {
            return Err("blacklist_duration must be positive".to_string());
        }
        if self.per_call_timeout.is_zero() {
            return Err("per_call_timeout must be positive".to_string());
        }
        if self.request_timeout.is_zero() {
            return Err("request_timeout must be positive".to_string());
        }
        Ok(())
    }
}

/// Replica selection, retry and blacklist-update logic for one logical
/// operation call.
///
/// For each dispatch the replicas of the target service are tried in
/// registry order. A replica with an active blacklist entry is skipped
/// without a single transport call. Otherwise it gets up to
/// `retries_per_replica` sequential attempts; the first success is returned
/// immediately, and a replica that burns its whole budget is blacklisted
/// for `blacklist_duration` before the loop moves on. When no replica
/// produces a result the dispatch fails with `AllReplicasUnavailable` —
/// the tripped state of this (deliberately primitive) circuit breaker.
///
/// The dispatcher itself holds no per-call mutable state; everything shared
/// between concurrent dispatches lives in the [`BlacklistStore`].
pub struct Dispatcher {
    registry: Arc<ReplicaRegistry>,
    blacklist: Arc<BlacklistStore>,
    config: DispatchConfig,
}

impl Dispatcher {
    /// Creates a dispatcher over an immutable registry and a shared
    /// blacklist store.
    pub fn new(
        registry: Arc<ReplicaRegistry>,
        blacklist: Arc<BlacklistStore>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            registry,
            blacklist,
            config,
        }
    }

    /// The replica registry this dispatcher selects from.
    pub fn registry(&self) -> &ReplicaRegistry {
        &self.registry
    }

    /// The shared blacklist store.
    pub fn blacklist(&self) -> &BlacklistStore {
        &self.blacklist
    }

    /// The active configuration.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Dispatches one operation to the named service.
    ///
    /// Resolves the ordered replica list, then walks it as described on
    /// [`Dispatcher`]. Client-caused and server/network transport errors
    /// count identically toward a replica's retry budget. The whole call is
    /// bounded by `request_timeout`: once that deadline passes the loop
    /// aborts with `DispatchError::Timeout` instead of exhausting the
    /// remaining budget.
    ///
    /// # Errors
    ///
    /// - `UnknownService` - the service is not configured (zero transport
    ///   calls are made)
    /// - `Timeout` - the aggregate deadline elapsed mid-dispatch
    /// - `AllReplicasUnavailable` - every replica was skipped or exhausted
    pub async fn invoke<T>(
        &self,
        service: &str,
        operation: &str,
        payload: &Value,
        transport: &T,
    ) -> Result<Value, DispatchError>
    where
        T: Transport + ?Sized,
    {
        let replicas = self.registry.replicas_for(service)?;
        let deadline = Instant::now() + self.config.request_timeout;

        for replica in replicas {
            if self
                .blacklist
                .is_blacklisted(service, replica.index, Instant::now())
            {
                debug!(
                    service,
                    replica = %replica.address,
                    "skipping blacklisted replica"
                );
                continue;
            }

            match self
                .try_replica(service, operation, payload, replica, deadline, transport)
                .await?
            {
                Some(result) => {
                    // Success implies health: drop any entry a concurrent
                    // dispatch may have added while this call was in flight.
                    self.blacklist.clear(service, replica.index);
                    return Ok(result);
                }
                None => {
                    warn!(
                        service,
                        replica = %replica.address,
                        retries = self.config.retries_per_replica,
                        cooldown_secs = self.config.blacklist_duration.as_secs(),
                        "replica exhausted its retry budget, blacklisting"
                    );
                    self.blacklist.blacklist(
                        service,
                        replica.index,
                        Instant::now(),
                        self.config.blacklist_duration,
                    );
                }
            }
        }

        warn!(service, operation, "no replica available");
        Err(DispatchError::AllReplicasUnavailable(service.to_string()))
    }

    /// Runs the bounded retry loop against a single replica.
    ///
    /// Returns `Ok(Some(result))` on the first success, `Ok(None)` when the
    /// retry budget is exhausted, and `Err(Timeout)` when the overall
    /// request deadline elapses mid-loop.
    async fn try_replica<T>(
        &self,
        service: &str,
        operation: &str,
        payload: &Value,
        replica: &Replica,
        deadline: Instant,
        transport: &T,
    ) -> Result<Option<Value>, DispatchError>
    where
        T: Transport + ?Sized,
    {
        for attempt in 1..=self.config.retries_per_replica {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(DispatchError::Timeout);
            }
            let attempt_timeout = remaining.min(self.config.per_call_timeout);

            let call = transport.call(&replica.address, operation, payload);
            let error = match tokio::time::timeout(attempt_timeout, call).await {
                Ok(Ok(result)) => return Ok(Some(result)),
                Ok(Err(error)) => error,
                Err(_) => {
                    // An attempt capped by the deadline, rather than by the
                    // per-call timeout, ends the whole request.
                    if Instant::now() >= deadline {
                        return Err(DispatchError::Timeout);
                    }
                    TransportError::Timeout(attempt_timeout.as_millis() as u64)
                }
            };

            warn!(
                service,
                operation,
                replica = %replica.address,
                attempt,
                error = %error,
                "replica call failed"
            );
        }

        Ok(None)
    }
}
