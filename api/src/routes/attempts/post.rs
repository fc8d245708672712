use crate::response::ApiResponse;
use crate::routes::common::error_response;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use db::models::ScoreRecord;
use serde::Deserialize;
use uuid::Uuid;

/// Stores one answer for an in-progress attempt; repeated submissions for
/// the same question overwrite the previous answer. Nothing is graded here.
///
/// # Request Body
/// - `question_id` (string): question UUID. **Required**
/// - `answer` (string): option key for MCQ, source code for coding.
///   **Required**
/// - `language` (string): submission language id, coding questions only.
#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    pub question_id: Uuid,
    pub answer: String,
    pub language: Option<String>,
}

pub async fn submit_answer(
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
    Json(req): Json<SubmitAnswerRequest>,
) -> impl IntoResponse {
    match state
        .service()
        .submit_answer(
            attempt_id,
            req.question_id,
            &req.answer,
            req.language.as_deref(),
        )
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                serde_json::json!({ "question_id": req.question_id }),
                "Answer recorded",
            )),
        ),
        Err(err) => error_response(err),
    }
}

/// Grades every question in the attempt's definition and finalizes it.
/// Idempotent: completing a finished attempt returns the stored record.
pub async fn complete(
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
) -> impl IntoResponse {
    match state.service().complete(attempt_id).await {
        Ok(record) => (
            StatusCode::OK,
            Json(ApiResponse::<ScoreRecord>::success(record, "Attempt completed")),
        ),
        Err(err) => error_response(err),
    }
}
