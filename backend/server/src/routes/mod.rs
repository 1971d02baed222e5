//! Route handlers, one module per mounted router.

pub mod appointment;
pub mod auth;
pub mod customer;
pub mod inventory;
pub mod invoice;
pub mod jobcard;
pub mod mechanic;
pub mod procurement;
pub mod supplier;
pub mod vehicle;

use axum::{response::IntoResponse, Json};
use serde_json::json;

/// Liveness probe.
pub async fn health() -> impl IntoResponse {
    Json(json!({ "message": "workshop backend running" }))
}
