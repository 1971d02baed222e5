use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use store::model::{Mechanic, MechanicPatch};
use tracing::info;

use crate::{
    error::AppError,
    state::AppState,
    utils::{check, finish, is_phone, not_blank},
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_mechanic).get(list_mechanics))
        .route(
            "/{mechanic_id}",
            get(get_mechanic).put(update_mechanic).delete(delete_mechanic),
        )
}

async fn create_mechanic(
    State(state): State<Arc<AppState>>,
    Json(mechanic): Json<Mechanic>,
) -> Result<impl IntoResponse, AppError> {
    let mut errors = Vec::new();
    check(&mut errors, not_blank(&mechanic.mechanic_id), "Mechanic id is required");
    check(&mut errors, not_blank(&mechanic.mechanic_name), "Mechanic name is required");
    check(
        &mut errors,
        mechanic.contact.phone.as_deref().is_some_and(is_phone),
        "Valid phone number is required",
    );
    finish(errors)?;

    state.store.insert_mechanic(&mechanic).await?;
    info!("New mechanic created: {}", mechanic.mechanic_id);
    Ok((StatusCode::CREATED, Json(mechanic)))
}

async fn list_mechanics(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let mechanics = state.store.list_mechanics().await?;
    Ok(Json(mechanics))
}

async fn get_mechanic(
    State(state): State<Arc<AppState>>,
    Path(mechanic_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mechanic = state
        .store
        .get_mechanic(&mechanic_id)
        .await?
        .ok_or(AppError::NotFound("Mechanic"))?;
    Ok(Json(mechanic))
}

async fn update_mechanic(
    State(state): State<Arc<AppState>>,
    Path(mechanic_id): Path<String>,
    Json(patch): Json<MechanicPatch>,
) -> Result<impl IntoResponse, AppError> {
    let mechanic = state
        .store
        .update_mechanic(&mechanic_id, &patch)
        .await?
        .ok_or(AppError::NotFound("Mechanic"))?;
    Ok(Json(mechanic))
}

async fn delete_mechanic(
    State(state): State<Arc<AppState>>,
    Path(mechanic_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !state.store.delete_mechanic(&mechanic_id).await? {
        return Err(AppError::NotFound("Mechanic"));
    }
    Ok(Json(json!({ "message": "Mechanic deleted successfully" })))
}
