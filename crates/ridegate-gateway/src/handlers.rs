//! One thin handler per gateway operation.
//!
//! Each handler validates the typed payload, forwards it through the
//! dispatcher to the owning service, and returns the replica's JSON result.
//! Dispatch failures map onto a small fixed set of response shapes; raw
//! transport errors never reach a client.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ridegate_dispatch::DispatchError;
use ridegate_metrics::{GatewayInfo, MetricsSnapshot};
use serde_json::{json, Value};

use crate::api::{
    AcceptOrderRequest, FinishOrderRequest, MakeOrderRequest, PayRideRequest,
    PaymentCheckRequest, ProcessPaymentRequest, SERVICE_RIDE_PAYMENT, SERVICE_USER_LOCATION,
};
use crate::http_server::GatewayState;

/// Client-visible failure: a status code and an `{"error": "..."}` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message,
        }
    }

    fn internal(message: String) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message,
        }
    }

    #[cfg(test)]
    pub(crate) fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        let status = match &err {
            DispatchError::AllReplicasUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            DispatchError::Timeout => StatusCode::REQUEST_TIMEOUT,
            DispatchError::UnknownService(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({"error": self.message}))).into_response()
    }
}

/// Unwraps a JSON body, downgrading axum's rejection to a plain 400.
fn parse<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
    }
}

fn to_payload<T: serde::Serialize>(request: &T) -> Result<Value, ApiError> {
    serde_json::to_value(request)
        .map_err(|e| ApiError::internal(format!("failed to encode payload: {}", e)))
}

pub async fn make_order(
    State(state): State<Arc<GatewayState>>,
    payload: Result<Json<MakeOrderRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let request = parse(payload)?;
    let payload = to_payload(&request)?;
    let result = state
        .dispatch(SERVICE_USER_LOCATION, "make_order", payload)
        .await?;
    Ok(Json(result))
}

pub async fn accept_order(
    State(state): State<Arc<GatewayState>>,
    payload: Result<Json<AcceptOrderRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let request = parse(payload)?;
    let payload = to_payload(&request)?;
    let result = state
        .dispatch(SERVICE_USER_LOCATION, "accept_order", payload)
        .await?;
    Ok(Json(result))
}

pub async fn finish_order(
    State(state): State<Arc<GatewayState>>,
    payload: Result<Json<FinishOrderRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let request = parse(payload)?;
    let payload = to_payload(&request)?;
    let result = state
        .dispatch(SERVICE_USER_LOCATION, "finish_order", payload)
        .await?;
    Ok(Json(result))
}

pub async fn check_payment_status(
    State(state): State<Arc<GatewayState>>,
    payload: Result<Json<PaymentCheckRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let request = parse(payload)?;
    let payload = to_payload(&request)?;
    let result = state
        .dispatch(SERVICE_USER_LOCATION, "payment_check", payload)
        .await?;

    // The backend reports fresh rides as "notPaid" (or omits the field for
    // unknown rides); clients expect "orderNotPaid" for both.
    let status = match result.get("status").and_then(Value::as_str) {
        Some("notPaid") | None => "orderNotPaid",
        Some(other) => other,
    };
    Ok(Json(json!({"rideId": request.ride_id, "status": status})))
}

pub async fn pay_ride(
    State(state): State<Arc<GatewayState>>,
    payload: Result<Json<PayRideRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let request = parse(payload)?;
    let payload = to_payload(&request)?;
    let result = state
        .dispatch(SERVICE_RIDE_PAYMENT, "pay_ride", payload)
        .await?;
    Ok(Json(result))
}

pub async fn process_payment(
    State(state): State<Arc<GatewayState>>,
    payload: Result<Json<ProcessPaymentRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let request = parse(payload)?;
    let payload = to_payload(&request)?;
    let result = state
        .dispatch(SERVICE_RIDE_PAYMENT, "process_payment", payload)
        .await?;
    Ok(Json(result))
}

pub async fn status(State(state): State<Arc<GatewayState>>) -> Json<GatewayInfo> {
    Json(state.metrics().info())
}

pub async fn metrics(State(state): State<Arc<GatewayState>>) -> Json<MetricsSnapshot> {
    Json(state.metrics().snapshot())
}
