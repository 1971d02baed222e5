use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use store::model::{
    ApprovalStatus, EstimateItem, JobCard, JobCardStatus, RequiredItem, ServiceLane, ServiceUpsert,
};
use tracing::info;

use crate::{
    error::AppError,
    state::AppState,
    utils::{check, finish, not_blank},
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_job_card).get(list_job_cards))
        .route("/{id}", get(get_job_card))
        .route("/{id}/status", put(update_status))
        .route("/{id}/apply", post(apply_to_appointment))
}

#[derive(Deserialize)]
struct NewJobCard {
    #[serde(rename = "vehicleId", default)]
    vehicle_id: String,
    #[serde(rename = "customerId", default)]
    customer_id: String,
    #[serde(rename = "estimateItems", default)]
    estimate_items: Vec<EstimateItem>,
}

async fn create_job_card(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewJobCard>,
) -> Result<impl IntoResponse, AppError> {
    let mut errors = Vec::new();
    check(&mut errors, not_blank(&payload.vehicle_id), "Vehicle id is required");
    check(&mut errors, not_blank(&payload.customer_id), "Customer id is required");
    for item in &payload.estimate_items {
        check(&mut errors, item.qty >= 1, "Estimate item qty must be at least 1");
        check(&mut errors, item.rate >= 0.0, "Estimate item rate must not be negative");
        check(
            &mut errors,
            (0.0..=100.0).contains(&item.discount),
            "Estimate item discount must be a percentage",
        );
    }
    finish(errors)?;

    let job_card_id = state.store.allocate_id("JOB").await?;
    let card = JobCard {
        job_card_id: job_card_id.clone(),
        vehicle_id: payload.vehicle_id,
        customer_id: payload.customer_id,
        estimate_items: payload.estimate_items,
        status: JobCardStatus::Pending,
        created_at: Utc::now(),
    };
    state.store.insert_job_card(&card).await?;

    info!("New job card created: {job_card_id}");
    Ok((StatusCode::CREATED, Json(card)))
}

async fn list_job_cards(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let cards = state.store.list_job_cards().await?;
    Ok(Json(cards))
}

async fn get_job_card(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let card = state
        .store
        .get_job_card(&id)
        .await?
        .ok_or(AppError::NotFound("Job card"))?;
    Ok(Json(card))
}

#[derive(Deserialize)]
struct StatusUpdate {
    status: JobCardStatus,
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<StatusUpdate>,
) -> Result<impl IntoResponse, AppError> {
    let card = state
        .store
        .set_job_card_status(&id, payload.status)
        .await?
        .ok_or(AppError::NotFound("Job card"))?;
    Ok(Json(card))
}

/// Push the card's estimate lines into the open appointment of its vehicle
/// as saved estimate services.
async fn apply_to_appointment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let card = state
        .store
        .get_job_card(&id)
        .await?
        .ok_or(AppError::NotFound("Job card"))?;
    let appointment = state
        .store
        .open_appointment_for_vehicle(&card.vehicle_id)
        .await?
        .ok_or(AppError::NotFound("Open appointment"))?;

    let services: Vec<ServiceUpsert> = card
        .estimate_items
        .iter()
        .enumerate()
        .map(|(index, item)| estimate_to_service(&card.job_card_id, index, item))
        .collect();

    let appointment = state
        .store
        .upsert_services(&appointment.appointment_id, ServiceLane::Estimate, services)
        .await?
        .ok_or(AppError::NotFound("Appointment"))?;
    Ok(Json(appointment))
}

fn estimate_to_service(job_card_id: &str, index: usize, item: &EstimateItem) -> ServiceUpsert {
    let items_required = if item.spare_list.is_empty() {
        Vec::new()
    } else {
        vec![RequiredItem {
            item_id: format!("{job_card_id}-{index}"),
            item_name: item.spare_list.clone(),
            qty: Some(item.qty.to_string()),
            tax: None,
            discount: Some(item.discount.to_string()),
        }]
    };
    ServiceUpsert {
        service_id: None,
        service_description: item.description.clone(),
        price: item.estimated_amount,
        service_type: "estimate".to_owned(),
        status: Some(ApprovalStatus::Saved),
        service_status: None,
        items_required,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_lines_become_saved_services() {
        let item = EstimateItem {
            description: "Replace brake pads".to_owned(),
            spare_list: "Brake pad set".to_owned(),
            qty: 2,
            rate: 1200.0,
            discount: 10.0,
            estimated_amount: 2160.0,
        };
        let service = estimate_to_service("JOB-7", 0, &item);
        assert_eq!(service.service_description, "Replace brake pads");
        assert_eq!(service.price, 2160.0);
        assert_eq!(service.status, Some(ApprovalStatus::Saved));
        assert_eq!(service.items_required.len(), 1);
        assert_eq!(service.items_required[0].item_id, "JOB-7-0");
        assert_eq!(service.items_required[0].qty.as_deref(), Some("2"));
    }

    #[test]
    fn empty_spare_list_yields_no_items() {
        let item = EstimateItem {
            description: "Wheel alignment".to_owned(),
            ..EstimateItem::default()
        };
        let service = estimate_to_service("JOB-7", 1, &item);
        assert!(service.items_required.is_empty());
    }
}
