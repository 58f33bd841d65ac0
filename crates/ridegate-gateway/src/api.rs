//! Request payloads for the gateway operations.
//!
//! Field names follow the camelCase wire format of the backend services.
//! The gateway validates presence and types here, then forwards the payload
//! to the owning service verbatim; response bodies pass through untouched
//! (with one normalization, see `check_payment_status`).

use serde::{Deserialize, Serialize};

/// Logical service owning orders, rides and payment-status lookups.
pub const SERVICE_USER_LOCATION: &str = "user-location";

/// Logical service owning ride payments.
pub const SERVICE_RIDE_PAYMENT: &str = "ride-payment";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MakeOrderRequest {
    pub user_id: String,
    pub start_longitude: f64,
    pub start_latitude: f64,
    pub end_longitude: f64,
    pub end_latitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptOrderRequest {
    pub order_id: String,
    pub driver_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishOrderRequest {
    pub ride_id: String,
    pub real_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCheckRequest {
    pub ride_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayRideRequest {
    pub ride_id: String,
    pub amount: f64,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessPaymentRequest {
    pub ride_id: String,
}
