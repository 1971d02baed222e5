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
use store::model::{InventoryCategory, InventoryItem, InventoryOrder, InventoryPatch};
use tracing::info;

use crate::{
    error::AppError,
    state::AppState,
    utils::{check, finish, not_blank},
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_item).get(list_items))
        .route("/{id}", get(get_item).put(update_item).delete(delete_item))
}

#[derive(Deserialize)]
struct NewInventoryItem {
    #[serde(default)]
    part_name: String,
    #[serde(default)]
    part_number: String,
    #[serde(default)]
    description: String,
    category: Option<InventoryCategory>,
    #[serde(default)]
    quantity: i64,
    #[serde(default)]
    price: f64,
    #[serde(default)]
    orders: Vec<InventoryOrder>,
    #[serde(default)]
    suppliers: Vec<String>,
}

async fn create_item(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewInventoryItem>,
) -> Result<impl IntoResponse, AppError> {
    let mut errors = Vec::new();
    check(&mut errors, not_blank(&payload.part_name), "Part name is required");
    check(&mut errors, not_blank(&payload.part_number), "Part number is required");
    check(&mut errors, not_blank(&payload.description), "Description is required");
    check(&mut errors, payload.category.is_some(), "Valid category is required");
    check(&mut errors, payload.quantity >= 0, "Quantity must not be negative");
    check(&mut errors, payload.price >= 0.0, "Price must not be negative");
    finish(errors)?;

    let inventory_id = state.store.allocate_id("INV").await?;
    let item = InventoryItem {
        inventory_id: inventory_id.clone(),
        part_name: payload.part_name,
        part_number: payload.part_number,
        description: payload.description,
        category: payload.category.unwrap_or(InventoryCategory::Spares),
        quantity: payload.quantity,
        price: payload.price,
        orders: payload.orders,
        suppliers: payload.suppliers,
    };
    state.store.insert_inventory_item(&item).await?;

    info!("New inventory item created: {inventory_id}");
    Ok((StatusCode::CREATED, Json(item)))
}

async fn list_items(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let items = state.store.list_inventory().await?;
    Ok(Json(items))
}

async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let item = state
        .store
        .get_inventory_item(&id)
        .await?
        .ok_or(AppError::NotFound("Inventory item"))?;
    Ok(Json(item))
}

async fn update_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<InventoryPatch>,
) -> Result<impl IntoResponse, AppError> {
    let mut errors = Vec::new();
    if let Some(quantity) = patch.quantity {
        check(&mut errors, quantity >= 0, "Quantity must not be negative");
    }
    if let Some(price) = patch.price {
        check(&mut errors, price >= 0.0, "Price must not be negative");
    }
    finish(errors)?;

    let item = state
        .store
        .update_inventory_item(&id, &patch)
        .await?
        .ok_or(AppError::NotFound("Inventory item"))?;
    Ok(Json(item))
}

async fn delete_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !state.store.delete_inventory_item(&id).await? {
        return Err(AppError::NotFound("Inventory item"));
    }
    Ok(Json(json!({ "message": "Inventory item deleted successfully" })))
}
