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
use store::model::{Invoice, PaymentStatus};
use tracing::info;

use crate::{
    error::AppError,
    state::AppState,
    utils::{check, finish, not_blank},
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_invoice).get(list_invoices))
        .route("/{id}", get(get_invoice))
        .route("/{id}/pay", put(pay_invoice))
}

#[derive(Deserialize)]
struct NewInvoice {
    #[serde(default)]
    appointment_id: String,
}

/// Raise an invoice from an appointment: the total is the sum of its actual
/// service prices at this moment.
async fn create_invoice(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewInvoice>,
) -> Result<impl IntoResponse, AppError> {
    let mut errors = Vec::new();
    check(&mut errors, not_blank(&payload.appointment_id), "Appointment id is required");
    finish(errors)?;

    let appointment = state
        .store
        .get_appointment(&payload.appointment_id)
        .await?
        .ok_or(AppError::NotFound("Appointment"))?;

    let total_amount: f64 = appointment
        .services_actual
        .iter()
        .map(|service| service.price)
        .sum();

    let invoice_id = state.store.allocate_id("INVC").await?;
    let invoice = Invoice {
        invoice_id: invoice_id.clone(),
        appointment_id: appointment.appointment_id,
        customer_id: appointment.customer_id,
        total_amount,
        payment_status: PaymentStatus::Pending,
        payment_date: None,
    };
    state.store.insert_invoice(&invoice).await?;

    info!("New invoice created: {invoice_id}");
    Ok((StatusCode::CREATED, Json(invoice)))
}

async fn list_invoices(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let invoices = state.store.list_invoices().await?;
    Ok(Json(invoices))
}

async fn get_invoice(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let invoice = state
        .store
        .get_invoice(&id)
        .await?
        .ok_or(AppError::NotFound("Invoice"))?;
    Ok(Json(invoice))
}

async fn pay_invoice(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let invoice = state
        .store
        .mark_invoice_paid(&id, Utc::now())
        .await?
        .ok_or(AppError::NotFound("Invoice"))?;
    Ok(Json(invoice))
}
