//! `/api/evaluations` — window creation, discovery, and attempt start.

use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use chrono::{DateTime, Utc};
use db::models::{EvaluationDefinition, QuestionKind};
use serde::Serialize;
use uuid::Uuid;

pub mod get;
pub mod post;

/// Client-facing view of a question. Correct answers and expected test-case
/// outputs never leave the server.
#[derive(Debug, Serialize)]
pub struct QuestionResponse {
    pub id: Uuid,
    pub prompt: String,
    pub points: u32,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct DefinitionResponse {
    pub id: Uuid,
    pub scheduled_start: DateTime<Utc>,
    pub duration_minutes: i64,
    pub total_points: u32,
    pub questions: Vec<QuestionResponse>,
}

impl From<EvaluationDefinition> for DefinitionResponse {
    fn from(definition: EvaluationDefinition) -> Self {
        let total_points = definition.total_points();
        Self {
            id: definition.id,
            scheduled_start: definition.scheduled_start,
            duration_minutes: definition.duration_minutes,
            total_points,
            questions: definition
                .questions
                .into_iter()
                .map(|q| {
                    let (kind, options) = match q.kind {
                        QuestionKind::Mcq { options, .. } => ("mcq", Some(options)),
                        QuestionKind::Coding { .. } => ("coding", None),
                    };
                    QuestionResponse {
                        id: q.id,
                        prompt: q.prompt,
                        points: q.points,
                        kind,
                        options,
                    }
                })
                .collect(),
        }
    }
}

pub fn evaluation_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(post::create))
        .route("/next", get(get::next))
        .route("/{definition_id}/start", post(post::start))
}
