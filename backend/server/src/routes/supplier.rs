use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use store::model::{Contact, ShippingOption, Supplier, SupplierPatch, SupplierProduct};
use tracing::info;

use crate::{
    error::AppError,
    state::AppState,
    utils::{check, finish, is_email, is_phone, not_blank, opt_not_blank},
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_supplier).get(list_suppliers))
        .route(
            "/{id}",
            get(get_supplier).put(update_supplier).delete(delete_supplier),
        )
}

#[derive(Deserialize)]
struct NewSupplier {
    #[serde(default)]
    name: String,
    #[serde(default)]
    contact: Contact,
    #[serde(default)]
    payment_terms: Option<String>,
    #[serde(default)]
    shipping_options: Vec<ShippingOption>,
    #[serde(default)]
    products: Vec<SupplierProduct>,
    #[serde(default)]
    notes: Option<String>,
}

async fn create_supplier(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewSupplier>,
) -> Result<impl IntoResponse, AppError> {
    let mut errors = Vec::new();
    check(&mut errors, not_blank(&payload.name), "Supplier name is required");
    check(
        &mut errors,
        payload.contact.phone.as_deref().is_some_and(is_phone),
        "Valid phone number is required",
    );
    check(
        &mut errors,
        payload.contact.email.as_deref().is_some_and(is_email),
        "Valid email is required",
    );
    let address = payload.contact.address.as_ref();
    for (field, label) in [
        (address.and_then(|a| a.street.as_deref()), "Street is required"),
        (address.and_then(|a| a.city.as_deref()), "City is required"),
        (address.and_then(|a| a.state.as_deref()), "State is required"),
        (address.and_then(|a| a.zip.as_deref()), "ZIP code is required"),
        (address.and_then(|a| a.country.as_deref()), "Country is required"),
    ] {
        check(&mut errors, opt_not_blank(field), label);
    }
    finish(errors)?;

    let supplier_id = state.store.allocate_id("SUP").await?;
    let supplier = Supplier {
        supplier_id: supplier_id.clone(),
        name: payload.name,
        contact: payload.contact,
        payment_terms: payload.payment_terms,
        shipping_options: payload.shipping_options,
        products: payload.products,
        notes: payload.notes,
    };
    state.store.insert_supplier(&supplier).await?;

    info!("New supplier created: {supplier_id}");
    Ok((StatusCode::CREATED, Json(supplier)))
}

async fn list_suppliers(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let suppliers = state.store.list_suppliers().await?;
    Ok(Json(suppliers))
}

async fn get_supplier(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let supplier = state
        .store
        .get_supplier(&id)
        .await?
        .ok_or(AppError::NotFound("Supplier"))?;
    Ok(Json(supplier))
}

async fn update_supplier(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<SupplierPatch>,
) -> Result<impl IntoResponse, AppError> {
    let supplier = state
        .store
        .update_supplier(&id, &patch)
        .await?
        .ok_or(AppError::NotFound("Supplier"))?;
    Ok(Json(supplier))
}

async fn delete_supplier(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !state.store.delete_supplier(&id).await? {
        return Err(AppError::NotFound("Supplier"));
    }
    Ok(Json(json!({ "message": "Supplier deleted successfully" })))
}
