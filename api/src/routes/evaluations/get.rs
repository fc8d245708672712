use super::DefinitionResponse;
use crate::response::ApiResponse;
use crate::routes::common::error_response;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

/// Returns the earliest evaluation window that has not yet closed, or a
/// 404 when nothing is scheduled.
pub async fn next(State(state): State<AppState>) -> impl IntoResponse {
    match state.service().next_definition().await {
        Ok(Some(definition)) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                DefinitionResponse::from(definition),
                "Next evaluation window",
            )),
        ),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<DefinitionResponse>::error(
                "No upcoming evaluation window",
            )),
        ),
        Err(err) => error_response(err),
    }
}
