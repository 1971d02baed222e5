use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use store::model::{Profile, Role, User};
use tracing::{info, warn};

use crate::{
    auth::{generate_token, hash_password, verify_password},
    error::AppError,
    state::AppState,
    utils::{check, finish, is_email, is_strong_password, not_blank},
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

#[derive(Deserialize)]
struct RegisterPayload {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    email: String,
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterPayload>,
) -> Result<impl IntoResponse, AppError> {
    let mut errors = Vec::new();
    check(&mut errors, not_blank(&payload.username), "Username is required");
    check(&mut errors, is_email(&payload.email), "Valid email is required");
    check(
        &mut errors,
        is_strong_password(&payload.password),
        "Password must be at least 8 characters with an uppercase letter, a lowercase letter, \
         a number and a special character",
    );
    finish(errors)?;

    let password_hash = hash_password(&payload.password)
        .map_err(|e| AppError::Internal(Box::new(e)))?;
    let user_id = state.store.allocate_id("USER").await?;
    let now = Utc::now();
    let user = User {
        user_id,
        username: payload.username,
        password_hash,
        email: payload.email,
        role: Role::default(),
        created_at: now,
        updated_at: now,
        profile: Profile::default(),
    };
    state.store.insert_user(&user).await?;

    info!("User registered: {}", user.user_id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully" })),
    ))
}

#[derive(Deserialize)]
struct LoginPayload {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, AppError> {
    info!("Login attempt: {}", payload.email);

    let Some(user) = state.store.find_user_by_email(&payload.email).await? else {
        warn!("Login failed, no user for {}", payload.email);
        return Err(AppError::InvalidCredentials);
    };
    if !verify_password(&payload.password, &user.password_hash) {
        warn!("Login failed, bad password for {}", payload.email);
        return Err(AppError::InvalidCredentials);
    }

    let token = generate_token(&user, &state.config.auth_secret)
        .map_err(|e| AppError::Internal(Box::new(e)))?;
    info!("Login successful for {}", payload.email);
    Ok(Json(json!({ "token": token })))
}
