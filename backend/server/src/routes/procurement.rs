use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use store::model::{Procurement, ProcurementPatch, ProcurementService, Progress};
use tracing::info;

use crate::{
    error::AppError,
    state::AppState,
    utils::{check, finish, not_blank},
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_procurement).get(list_procurements))
        .route(
            "/{id}",
            get(get_procurement)
                .put(update_procurement)
                .delete(delete_procurement),
        )
}

/// Procurement lifecycle only knows these three states.
fn valid_status(status: Progress) -> bool {
    matches!(
        status,
        Progress::Scheduled | Progress::Completed | Progress::Canceled
    )
}

#[derive(Deserialize)]
struct NewProcurement {
    #[serde(default)]
    appointment_id: String,
    #[serde(default)]
    customer_id: String,
    #[serde(default)]
    vehicle_id: String,
    #[serde(default)]
    mechanic_id: String,
    #[serde(default)]
    services: Vec<ProcurementService>,
    appointment_date: Option<DateTime<Utc>>,
    #[serde(default)]
    appointment_time: String,
    status: Option<Progress>,
    #[serde(default)]
    telecaller: String,
    #[serde(default)]
    notes: Option<String>,
}

async fn create_procurement(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewProcurement>,
) -> Result<impl IntoResponse, AppError> {
    let mut errors = Vec::new();
    check(&mut errors, not_blank(&payload.appointment_id), "Appointment id is required");
    check(&mut errors, not_blank(&payload.customer_id), "Customer id is required");
    check(&mut errors, not_blank(&payload.vehicle_id), "Vehicle id is required");
    check(&mut errors, not_blank(&payload.mechanic_id), "Mechanic id is required");
    check(&mut errors, payload.appointment_date.is_some(), "Appointment date is required");
    check(&mut errors, not_blank(&payload.appointment_time), "Appointment time is required");
    check(&mut errors, not_blank(&payload.telecaller), "Telecaller is required");
    check(
        &mut errors,
        payload.status.is_some_and(valid_status),
        "Status must be one of: scheduled, completed, canceled",
    );
    finish(errors)?;

    let procurement_id = state.store.allocate_id("PROC").await?;
    let procurement = Procurement {
        procurement_id: procurement_id.clone(),
        appointment_id: payload.appointment_id,
        customer_id: payload.customer_id,
        vehicle_id: payload.vehicle_id,
        mechanic_id: payload.mechanic_id,
        services: payload.services,
        appointment_date: payload.appointment_date.unwrap_or_default(),
        appointment_time: payload.appointment_time,
        status: payload.status.unwrap_or_default(),
        telecaller: payload.telecaller,
        notes: payload.notes,
    };
    state.store.insert_procurement(&procurement).await?;

    info!("New procurement created: {procurement_id}");
    Ok((StatusCode::CREATED, Json(procurement)))
}

async fn list_procurements(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let procurements = state.store.list_procurements().await?;
    Ok(Json(procurements))
}

async fn get_procurement(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let procurement = state
        .store
        .get_procurement(&id)
        .await?
        .ok_or(AppError::NotFound("Procurement"))?;
    Ok(Json(procurement))
}

async fn update_procurement(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<ProcurementPatch>,
) -> Result<impl IntoResponse, AppError> {
    let mut errors = Vec::new();
    if let Some(status) = patch.status {
        check(
            &mut errors,
            valid_status(status),
            "Status must be one of: scheduled, completed, canceled",
        );
    }
    finish(errors)?;

    let procurement = state
        .store
        .update_procurement(&id, &patch)
        .await?
        .ok_or(AppError::NotFound("Procurement"))?;
    Ok(Json(procurement))
}

async fn delete_procurement(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !state.store.delete_procurement(&id).await? {
        return Err(AppError::NotFound("Procurement"));
    }
    Ok(Json(json!({ "message": "Procurement deleted" })))
}
