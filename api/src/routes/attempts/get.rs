use crate::response::ApiResponse;
use crate::routes::common::error_response;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use db::models::ScoreRecord;
use uuid::Uuid;

/// Returns the stored score record for a completed attempt.
pub async fn score(
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
) -> impl IntoResponse {
    match state.service().score(attempt_id).await {
        Ok(record) => (
            StatusCode::OK,
            Json(ApiResponse::<ScoreRecord>::success(record, "Score record")),
        ),
        Err(err) => error_response(err),
    }
}
