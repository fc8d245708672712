//! Shared helpers for route handlers.

use crate::response::ApiResponse;
use axum::Json;
use axum::http::StatusCode;
use serde::Serialize;
use services::ServiceError;

/// Maps a lifecycle error to its HTTP status: validation problems are 400,
/// window timing violations 403, unknown ids 404, state conflicts 409, and
/// everything else is internal.
pub fn error_status(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::EmptySubmission
        | ServiceError::MissingLanguage
        | ServiceError::UnsupportedLanguage(_) => StatusCode::BAD_REQUEST,
        ServiceError::WindowNotOpen | ServiceError::WindowClosed => StatusCode::FORBIDDEN,
        ServiceError::DefinitionNotFound(_)
        | ServiceError::AttemptNotFound(_)
        | ServiceError::QuestionNotFound(_)
        | ServiceError::ScoreNotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::AlreadyCompleted | ServiceError::AttemptNotInProgress => {
            StatusCode::CONFLICT
        }
        ServiceError::QuestionGeneration(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn error_response<T: Serialize>(err: ServiceError) -> (StatusCode, Json<ApiResponse<T>>) {
    if error_status(&err) == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!("internal error: {}", err);
    }
    (error_status(&err), Json(ApiResponse::error(err.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn status_mapping() {
        assert_eq!(error_status(&ServiceError::EmptySubmission), StatusCode::BAD_REQUEST);
        assert_eq!(error_status(&ServiceError::WindowNotOpen), StatusCode::FORBIDDEN);
        assert_eq!(error_status(&ServiceError::WindowClosed), StatusCode::FORBIDDEN);
        assert_eq!(
            error_status(&ServiceError::AttemptNotFound(Uuid::new_v4())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(error_status(&ServiceError::AlreadyCompleted), StatusCode::CONFLICT);
        assert_eq!(
            error_status(&ServiceError::AttemptNotInProgress),
            StatusCode::CONFLICT
        );
    }
}
