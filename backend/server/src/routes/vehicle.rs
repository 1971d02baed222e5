//! Vehicle registry reads. Writes happen through the customer routes, which
//! is where registry rows are created and refreshed.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::{error::AppError, state::AppState};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_vehicles))
        .route("/{plate}", get(get_vehicle))
        .route("/customer/{customer_id}", get(vehicles_for_customer))
}

async fn list_vehicles(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let vehicles = state.store.list_vehicles().await?;
    Ok(Json(vehicles))
}

async fn get_vehicle(
    State(state): State<Arc<AppState>>,
    Path(plate): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let vehicle = state
        .store
        .get_vehicle(&plate)
        .await?
        .ok_or(AppError::NotFound("Vehicle"))?;
    Ok(Json(vehicle))
}

async fn vehicles_for_customer(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let vehicles = state.store.vehicles_for_customer(&customer_id).await?;
    Ok(Json(vehicles))
}
