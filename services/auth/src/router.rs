use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

use cloudmail_core::health::{healthz, readyz};
use cloudmail_core::middleware::request_id_layer;

use crate::handlers::{
    auth::{login, logout, register},
    settings::{get_settings, update_settings, website_config},
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Registration & sessions
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        // Settings
        .route("/settings/website", get(website_config))
        .route("/settings", get(get_settings))
        .route("/settings", put(update_settings))
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
        .with_state(state)
}
