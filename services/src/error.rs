//! Error kinds surfaced by the evaluation lifecycle.
//!
//! Structural violations (window timing, invalid state transitions, unknown
//! ids) are surfaced immediately and never retried. Per-test-case execution
//! failures are NOT errors: they are folded into the score by the grading
//! path.

use db::store::StoreError;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("evaluation window has not opened yet")]
    WindowNotOpen,
    #[error("evaluation window has closed")]
    WindowClosed,
    #[error("attempt has already been completed")]
    AlreadyCompleted,
    #[error("attempt is not in progress")]
    AttemptNotInProgress,
    #[error("submission source is empty")]
    EmptySubmission,
    #[error("coding answers must specify a language")]
    MissingLanguage,
    #[error("definition {0} not found")]
    DefinitionNotFound(Uuid),
    #[error("attempt {0} not found")]
    AttemptNotFound(Uuid),
    #[error("question {0} is not part of this evaluation")]
    QuestionNotFound(Uuid),
    #[error("no score recorded for attempt {0}")]
    ScoreNotFound(Uuid),
    #[error("question generation failed: {0}")]
    QuestionGeneration(#[from] crate::question_generator::GeneratorError),
    #[error(transparent)]
    UnsupportedLanguage(#[from] util::languages::UnsupportedLanguage),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DefinitionNotFound(id) => ServiceError::DefinitionNotFound(id),
            StoreError::AttemptNotFound(id) => ServiceError::AttemptNotFound(id),
            StoreError::StateConflict { .. } => ServiceError::AttemptNotInProgress,
        }
    }
}
