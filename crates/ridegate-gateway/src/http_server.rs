//! HTTP server for the gateway.
//!
//! Builds the axum route table, wires the shared state (dispatcher,
//! replica transport, metrics) and runs the listener.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::routing::{get, post};
use axum::Router;
use ridegate_dispatch::{
    BlacklistStore, DispatchConfig, DispatchError, Dispatcher, ReplicaRegistry,
};
use ridegate_metrics::GatewayMetricsCollector;
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::backend::HttpReplicaTransport;
use crate::error::GatewayError;
use crate::handlers;

/// Everything the request handlers share: the dispatcher, the replica
/// transport it drives, and the metrics collector.
pub struct GatewayState {
    dispatcher: Dispatcher,
    transport: HttpReplicaTransport,
    metrics: GatewayMetricsCollector,
}

impl GatewayState {
    /// Assembles the gateway state from a replica registry and dispatch
    /// configuration. Fails on an invalid configuration.
    pub fn new(
        registry: Arc<ReplicaRegistry>,
        config: DispatchConfig,
    ) -> Result<Self, GatewayError> {
        config.validate().map_err(GatewayError::Config)?;

        let metrics = GatewayMetricsCollector::new();
        let transport = HttpReplicaTransport::new(metrics.clone());
        let blacklist = Arc::new(BlacklistStore::new());
        let dispatcher = Dispatcher::new(registry, blacklist, config);

        Ok(Self {
            dispatcher,
            transport,
            metrics,
        })
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn metrics(&self) -> &GatewayMetricsCollector {
        &self.metrics
    }

    /// Forwards one operation to its service and records the outcome.
    pub(crate) async fn dispatch(
        &self,
        service: &str,
        operation: &str,
        payload: Value,
    ) -> Result<Value, DispatchError> {
        let start = Instant::now();
        let result = self
            .dispatcher
            .invoke(service, operation, &payload, &self.transport)
            .await;
        self.metrics
            .record_operation(operation, start, result.is_ok());

        if let Err(ref err) = result {
            error!(service, operation, error = %err, "dispatch failed");
        }
        result
    }
}

/// HTTP server for the gateway.
pub struct HttpServer {
    state: Arc<GatewayState>,
}

impl HttpServer {
    pub fn new(state: GatewayState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// The gateway route table: one POST route per operation, plus
    /// liveness and metrics endpoints.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/user/make_order", post(handlers::make_order))
            .route("/api/user/accept_order", post(handlers::accept_order))
            .route("/api/user/finish_order", post(handlers::finish_order))
            .route(
                "/api/user/check_payment_status",
                post(handlers::check_payment_status),
            )
            .route("/api/ride/pay", post(handlers::pay_ride))
            .route("/api/ride/process_payment", post(handlers::process_payment))
            .route("/status", get(handlers::status))
            .route("/metrics", get(handlers::metrics))
            .layer(CorsLayer::permissive())
            .with_state(Arc::clone(&self.state))
    }

    /// Binds `addr` and serves until shutdown.
    pub async fn run(self, addr: SocketAddr) -> Result<(), GatewayError> {
        let listener = TcpListener::bind(addr).await?;
        info!("gateway listening on {}", listener.local_addr()?);

        for (service, replicas) in self.state.dispatcher().registry().services() {
            info!(service, replicas, "configured service");
        }

        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}
