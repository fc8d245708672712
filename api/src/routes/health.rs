use crate::response::ApiResponse;
use crate::state::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub service: String,
    pub version: String,
    pub uptime_seconds: i64,
}

/// Liveness probe with process uptime.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let payload = HealthResponse {
        service: util::config::project_name(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: (Utc::now() - state.started_at()).num_seconds(),
    };
    Json(ApiResponse::success(payload, "Service healthy"))
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/", get(health))
}
