//! `/api/attempts` — answer submission, completion, and score retrieval.

use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};

pub mod get;
pub mod post;

pub fn attempt_routes() -> Router<AppState> {
    Router::new()
        .route("/{attempt_id}/answers", post(post::submit_answer))
        .route("/{attempt_id}/complete", post(post::complete))
        .route("/{attempt_id}/score", get(get::score))
}
