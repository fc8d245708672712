//! HTTP route entry point for `/api/...`.
//!
//! Routes are organized by domain:
//! - `/health` → liveness/uptime probe (public)
//! - `/evaluations` → window creation, discovery, and attempt start
//! - `/attempts` → answer submission, completion, and score retrieval
//!
//! Authentication and user management belong to the surrounding
//! application; callers identify themselves in the request body.

use crate::state::AppState;
use axum::Router;

pub mod attempts;
pub mod common;
pub mod evaluations;
pub mod health;

/// Builds the complete application router for all HTTP endpoints.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/health", health::health_routes())
        .nest("/evaluations", evaluations::evaluation_routes())
        .nest("/attempts", attempts::attempt_routes())
}
