//! HTTP surface of the vehicle service shop backend.
//!
//! # General Infrastructure
//! - One axum server carries the REST API and the chat WebSocket on the same
//!   port.
//! - Persistence is behind `store::Store`; `STORE_BACKEND` picks Redis
//!   (documents) or SQLite (relational) at startup.
//! - Customer search is an optional Meilisearch proxy; without `MEILI_URL`
//!   the rest of the service is unaffected.
//!
//! # Routes
//! - `/auth` register/login, `/customer` (token-guarded, includes `/search`),
//!   `/vehicle`, `/appointment`, `/jobcard`, `/inventory`, `/procurement`,
//!   `/mechanic`, `/supplier`, `/invoice`, `/chat/ws`, and `GET /api` as a
//!   liveness probe.

use std::time::Duration;

use axum::{routing::get, Router};

use signal::{
    ctrl_c,
    unix::{signal, SignalKind},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod routes;
pub mod search;
pub mod state;
pub mod utils;

use state::AppState;

/// Build the full router. Split out of [`start_server`] so tests can drive
/// it without binding a socket.
pub fn app(state: std::sync::Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_origin(Any)
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/api", get(routes::health))
        .nest("/auth", routes::auth::router())
        .nest("/customer", routes::customer::router())
        .nest("/vehicle", routes::vehicle::router())
        .nest("/appointment", routes::appointment::router())
        .nest("/jobcard", routes::jobcard::router())
        .nest("/inventory", routes::inventory::router())
        .nest("/procurement", routes::procurement::router())
        .nest("/mechanic", routes::mechanic::router())
        .nest("/supplier", routes::supplier::router())
        .nest("/invoice", routes::invoice::router())
        .route("/chat/ws", get(chat::chat_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new().await;

    info!("Starting server...");
    let app = app(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
