use super::DefinitionResponse;
use crate::response::ApiResponse;
use crate::routes::common::error_response;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use db::models::Attempt;
use serde::{Deserialize, Serialize};
use services::CreateDefinition;
use uuid::Uuid;

/// Handles the creation of a new evaluation window (admin-only in the
/// surrounding application).
///
/// # Request Body
/// - `scheduled_start` (string): ISO 8601 start of the window. **Required**
/// - `duration_minutes` (integer): window length. **Required**
/// - `mcq_count` / `coding_count` (integer): question mix. *(Optional,
///   default 3 and 2)*
#[derive(Debug, Deserialize)]
pub struct CreateEvaluationRequest {
    pub scheduled_start: DateTime<Utc>,
    pub duration_minutes: i64,
    #[serde(default = "default_mcq_count")]
    pub mcq_count: usize,
    #[serde(default = "default_coding_count")]
    pub coding_count: usize,
}

fn default_mcq_count() -> usize {
    3
}

fn default_coding_count() -> usize {
    2
}

pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateEvaluationRequest>,
) -> impl IntoResponse {
    if req.duration_minutes <= 0 {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<DefinitionResponse>::error(
                "duration_minutes must be positive",
            )),
        );
    }

    match state
        .service()
        .create_definition(CreateDefinition {
            scheduled_start: req.scheduled_start,
            duration_minutes: req.duration_minutes,
            mcq_count: req.mcq_count,
            coding_count: req.coding_count,
        })
        .await
    {
        Ok(definition) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                DefinitionResponse::from(definition),
                "Evaluation window created",
            )),
        ),
        Err(err) => error_response(err),
    }
}

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct AttemptResponse {
    pub id: Uuid,
    pub definition_id: Uuid,
    pub state: String,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_percentage: Option<f64>,
}

impl From<Attempt> for AttemptResponse {
    fn from(attempt: Attempt) -> Self {
        Self {
            id: attempt.id,
            definition_id: attempt.definition_id,
            state: attempt.state.to_string(),
            started_at: attempt.started_at,
            completed_at: attempt.completed_at,
            score_percentage: attempt.score_percentage,
        }
    }
}

/// Starts (or resumes) the caller's attempt. Only valid while the window is
/// open; a repeated start returns the existing attempt.
pub async fn start(
    State(state): State<AppState>,
    Path(definition_id): Path<Uuid>,
    Json(req): Json<StartRequest>,
) -> impl IntoResponse {
    match state.service().start(req.user_id, definition_id).await {
        Ok(attempt) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                AttemptResponse::from(attempt),
                "Attempt in progress",
            )),
        ),
        Err(err) => error_response(err),
    }
}
