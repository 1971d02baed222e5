use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use store::{model::Appointment, StoreError};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Per-field messages, answered as `{"errors": [...]}` like the
    /// validator middleware the frontend already understands.
    #[error("validation failed")]
    Validation(Vec<String>),

    #[error("{0} not found")]
    NotFound(&'static str),

    /// Login failures are deliberately undifferentiated.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("missing or invalid bearer token")]
    Unauthorized,

    /// Booking rejected because the vehicle already has an appointment that
    /// is not completed; carries the blocking appointment for the frontend.
    #[error("vehicle already has an open appointment")]
    OpenAppointment(Box<Appointment>),

    #[error("search is not configured")]
    SearchUnavailable,

    #[error("storage failure: {0}")]
    Store(#[from] StoreError),

    #[error("search failure: {0}")]
    Search(#[from] meilisearch_sdk::errors::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response()
            }
            AppError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": format!("{what} not found") })),
            )
                .into_response(),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Invalid credentials" })),
            )
                .into_response(),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "missing or invalid bearer token" })),
            )
                .into_response(),
            AppError::OpenAppointment(appointment) => (
                StatusCode::CONFLICT,
                Json(json!({
                    "error": "vehicle already has an open appointment",
                    "appointment": appointment,
                })),
            )
                .into_response(),
            AppError::SearchUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": "search is not configured" })),
            )
                .into_response(),
            AppError::Store(err) => {
                let status = match &err {
                    StoreError::Duplicate(_) => StatusCode::CONFLICT,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    error!("storage failure: {err}");
                }
                (
                    status,
                    Json(json!({ "error": "storage failure", "details": err.to_string() })),
                )
                    .into_response()
            }
            AppError::Search(err) => (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": "search failure", "details": err.to_string() })),
            )
                .into_response(),
            AppError::Internal(err) => {
                error!("internal error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal error", "details": err.to_string() })),
                )
                    .into_response()
            }
        }
    }
}
