use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use store::model::{
    Appointment, AppointmentPatch, Progress, ServiceLane, ServiceUpsert,
};
use tracing::info;

use crate::{
    error::AppError,
    state::AppState,
    utils::{check, finish, not_blank},
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_appointment).get(list_appointments))
        .route(
            "/{id}",
            get(get_appointment)
                .put(update_appointment)
                .delete(delete_appointment),
        )
        .route("/{id}/services_estimate", post(add_services_estimate))
        .route(
            "/{id}/services_actual",
            post(add_services_actual).get(get_services_actual),
        )
        .route("/{id}/assign_mechanic", post(assign_mechanic))
        .route("/{id}/update_km", put(update_km))
        .route("/{id}/update_service_status/{service_id}", put(update_service_status))
}

#[derive(Deserialize)]
struct NewAppointment {
    #[serde(default)]
    customer_id: String,
    #[serde(default)]
    vehicle_id: String,
    #[serde(default)]
    mechanic_id: Option<String>,
    #[serde(default)]
    km: Option<u32>,
    #[serde(default)]
    appointment_date: Option<DateTime<Utc>>,
    #[serde(default)]
    appointment_time: Option<String>,
    #[serde(default)]
    status: Option<Progress>,
    #[serde(default)]
    telecaller: String,
    #[serde(default)]
    notes: Option<String>,
}

async fn create_appointment(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewAppointment>,
) -> Result<impl IntoResponse, AppError> {
    let mut errors = Vec::new();
    check(&mut errors, not_blank(&payload.customer_id), "Customer id is required");
    check(&mut errors, not_blank(&payload.vehicle_id), "Vehicle id is required");
    check(&mut errors, not_blank(&payload.telecaller), "Telecaller is required");
    finish(errors)?;

    // One open appointment per vehicle; the blocking one is returned.
    if let Some(open) = state
        .store
        .open_appointment_for_vehicle(&payload.vehicle_id)
        .await?
    {
        return Err(AppError::OpenAppointment(Box::new(open)));
    }

    let appointment_id = state.store.allocate_id("APMT").await?;
    let appointment = Appointment {
        appointment_id: appointment_id.clone(),
        customer_id: payload.customer_id,
        vehicle_id: payload.vehicle_id,
        mechanic_id: payload.mechanic_id,
        km: payload.km,
        services_estimate: Vec::new(),
        services_actual: Vec::new(),
        appointment_date: payload.appointment_date,
        appointment_time: payload.appointment_time,
        status: payload.status.unwrap_or_default(),
        telecaller: payload.telecaller,
        notes: payload.notes,
    };
    state.store.insert_appointment(&appointment).await?;

    info!("New appointment created: {appointment_id}");
    Ok((StatusCode::CREATED, Json(appointment)))
}

async fn list_appointments(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let appointments = state.store.list_appointments().await?;
    Ok(Json(appointments))
}

async fn get_appointment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let appointment = state
        .store
        .get_appointment(&id)
        .await?
        .ok_or(AppError::NotFound("Appointment"))?;
    Ok(Json(appointment))
}

async fn update_appointment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<AppointmentPatch>,
) -> Result<impl IntoResponse, AppError> {
    let appointment = state
        .store
        .update_appointment(&id, &patch)
        .await?
        .ok_or(AppError::NotFound("Appointment"))?;
    Ok(Json(appointment))
}

async fn delete_appointment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !state.store.delete_appointment(&id).await? {
        return Err(AppError::NotFound("Appointment"));
    }
    Ok(Json(json!({ "message": "Appointment deleted successfully" })))
}

async fn add_services_estimate(
    state: State<Arc<AppState>>,
    path: Path<String>,
    payload: Json<Vec<ServiceUpsert>>,
) -> Result<impl IntoResponse, AppError> {
    add_services(state, path, ServiceLane::Estimate, payload).await
}

async fn add_services_actual(
    state: State<Arc<AppState>>,
    path: Path<String>,
    payload: Json<Vec<ServiceUpsert>>,
) -> Result<impl IntoResponse, AppError> {
    add_services(state, path, ServiceLane::Actual, payload).await
}

async fn add_services(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    lane: ServiceLane,
    Json(services): Json<Vec<ServiceUpsert>>,
) -> Result<impl IntoResponse, AppError> {
    let mut errors = Vec::new();
    check(&mut errors, !services.is_empty(), "No services provided");
    for service in &services {
        check(
            &mut errors,
            not_blank(&service.service_description),
            "Missing required field: service_description",
        );
        check(&mut errors, service.price > 0.0, "Missing required field: price");
        check(&mut errors, service.status.is_some(), "Missing required field: status");
        check(
            &mut errors,
            !service.items_required.is_empty(),
            "Missing required field: items_required",
        );
    }
    finish(errors)?;

    let appointment = state
        .store
        .upsert_services(&id, lane, services)
        .await?
        .ok_or(AppError::NotFound("Appointment"))?;
    Ok(Json(appointment))
}

#[derive(Deserialize)]
struct AssignMechanic {
    #[serde(default)]
    mechanic_id: String,
}

async fn assign_mechanic(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<AssignMechanic>,
) -> Result<impl IntoResponse, AppError> {
    let mut errors = Vec::new();
    check(&mut errors, not_blank(&payload.mechanic_id), "Mechanic id is required");
    finish(errors)?;

    let appointment = state
        .store
        .assign_mechanic(&id, &payload.mechanic_id)
        .await?
        .ok_or(AppError::NotFound("Appointment"))?;
    Ok(Json(appointment))
}

#[derive(Deserialize)]
struct UpdateKm {
    km: u32,
}

async fn update_km(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateKm>,
) -> Result<impl IntoResponse, AppError> {
    let appointment = state
        .store
        .update_km(&id, payload.km)
        .await?
        .ok_or(AppError::NotFound("Appointment"))?;
    Ok(Json(appointment))
}

async fn get_services_actual(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let services = state
        .store
        .services_actual(&id)
        .await?
        .ok_or(AppError::NotFound("Appointment"))?;
    Ok(Json(json!({ "appointment_id": id, "services_actual": services })))
}

#[derive(Deserialize)]
struct UpdateServiceStatus {
    service_status: Progress,
}

async fn update_service_status(
    State(state): State<Arc<AppState>>,
    Path((id, service_id)): Path<(String, String)>,
    Json(payload): Json<UpdateServiceStatus>,
) -> Result<impl IntoResponse, AppError> {
    let appointment = state
        .store
        .update_service_status(&id, &service_id, payload.service_status)
        .await?
        .ok_or(AppError::NotFound("Service"))?;
    Ok(Json(appointment))
}
