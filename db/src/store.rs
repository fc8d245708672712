//! Storage boundary for the evaluation lifecycle.
//!
//! Durable persistence is an external collaborator; everything in the
//! lifecycle reaches storage through [`EvaluationStore`]. The contract the
//! lifecycle relies on is narrow: attempt uniqueness per (user, definition)
//! and an atomic compare-and-set on `Attempt.state` so two completions can
//! never both land.
//!
//! [`MemoryStore`] is the in-process reference implementation. It backs the
//! test suite and single-host deployments; all tables live under one lock so
//! the compare-and-set is a single read-check-write.

use crate::models::{
    Attempt, AttemptState, EvaluationDefinition, ScoreRecord, SubmittedAnswer,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("definition {0} not found")]
    DefinitionNotFound(Uuid),
    #[error("attempt {0} not found")]
    AttemptNotFound(Uuid),
    #[error("attempt {id} is {found}, expected {expected}")]
    StateConflict {
        id: Uuid,
        expected: AttemptState,
        found: AttemptState,
    },
}

/// Terminal fields written together with the state transition.
#[derive(Debug, Clone)]
pub struct CompletionUpdate {
    pub state: AttemptState,
    pub completed_at: DateTime<Utc>,
    pub score_percentage: f64,
}

#[async_trait]
pub trait EvaluationStore: Send + Sync {
    async fn insert_definition(&self, definition: EvaluationDefinition) -> Result<(), StoreError>;

    async fn definition(&self, id: Uuid) -> Result<EvaluationDefinition, StoreError>;

    async fn definitions(&self) -> Result<Vec<EvaluationDefinition>, StoreError>;

    /// Inserts the attempt unless one already exists for the same
    /// (user, definition), in which case the stored attempt is returned
    /// unchanged. The check and the insert happen under one lock.
    async fn create_attempt(&self, attempt: Attempt) -> Result<Attempt, StoreError>;

    async fn attempt(&self, id: Uuid) -> Result<Attempt, StoreError>;

    async fn attempt_for_user(
        &self,
        user_id: i64,
        definition_id: Uuid,
    ) -> Result<Option<Attempt>, StoreError>;

    /// Stores/overwrites one answer. Rejects with `StateConflict` unless the
    /// attempt is still `InProgress` at write time.
    async fn record_answer(
        &self,
        attempt_id: Uuid,
        question_id: Uuid,
        answer: SubmittedAnswer,
    ) -> Result<(), StoreError>;

    async fn in_progress_attempts(&self) -> Result<Vec<Attempt>, StoreError>;

    /// Compare-and-set completion: verifies `state == expected`, then writes
    /// the terminal fields and the score record in one atomic step. A
    /// concurrent completion that lost the race observes `StateConflict`.
    async fn complete_attempt(
        &self,
        attempt_id: Uuid,
        expected: AttemptState,
        update: CompletionUpdate,
        record: ScoreRecord,
    ) -> Result<Attempt, StoreError>;

    async fn score(&self, attempt_id: Uuid) -> Result<Option<ScoreRecord>, StoreError>;
}

#[derive(Default)]
struct Tables {
    definitions: HashMap<Uuid, EvaluationDefinition>,
    attempts: HashMap<Uuid, Attempt>,
    attempts_by_user: HashMap<(i64, Uuid), Uuid>,
    scores: HashMap<Uuid, ScoreRecord>,
}

/// In-memory store; one lock over all tables.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EvaluationStore for MemoryStore {
    async fn insert_definition(&self, definition: EvaluationDefinition) -> Result<(), StoreError> {
        let mut tables = self.inner.write().await;
        tables.definitions.insert(definition.id, definition);
        Ok(())
    }

    async fn definition(&self, id: Uuid) -> Result<EvaluationDefinition, StoreError> {
        let tables = self.inner.read().await;
        tables
            .definitions
            .get(&id)
            .cloned()
            .ok_or(StoreError::DefinitionNotFound(id))
    }

    async fn definitions(&self) -> Result<Vec<EvaluationDefinition>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables.definitions.values().cloned().collect())
    }

    async fn create_attempt(&self, attempt: Attempt) -> Result<Attempt, StoreError> {
        let mut tables = self.inner.write().await;
        let key = (attempt.user_id, attempt.definition_id);
        if let Some(existing_id) = tables.attempts_by_user.get(&key) {
            let existing_id = *existing_id;
            return tables
                .attempts
                .get(&existing_id)
                .cloned()
                .ok_or(StoreError::AttemptNotFound(existing_id));
        }
        tables.attempts_by_user.insert(key, attempt.id);
        tables.attempts.insert(attempt.id, attempt.clone());
        Ok(attempt)
    }

    async fn attempt(&self, id: Uuid) -> Result<Attempt, StoreError> {
        let tables = self.inner.read().await;
        tables
            .attempts
            .get(&id)
            .cloned()
            .ok_or(StoreError::AttemptNotFound(id))
    }

    async fn attempt_for_user(
        &self,
        user_id: i64,
        definition_id: Uuid,
    ) -> Result<Option<Attempt>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables
            .attempts_by_user
            .get(&(user_id, definition_id))
            .and_then(|id| tables.attempts.get(id))
            .cloned())
    }

    async fn record_answer(
        &self,
        attempt_id: Uuid,
        question_id: Uuid,
        answer: SubmittedAnswer,
    ) -> Result<(), StoreError> {
        let mut tables = self.inner.write().await;
        let attempt = tables
            .attempts
            .get_mut(&attempt_id)
            .ok_or(StoreError::AttemptNotFound(attempt_id))?;
        if attempt.state != AttemptState::InProgress {
            return Err(StoreError::StateConflict {
                id: attempt_id,
                expected: AttemptState::InProgress,
                found: attempt.state,
            });
        }
        attempt.answers.insert(question_id, answer);
        Ok(())
    }

    async fn in_progress_attempts(&self) -> Result<Vec<Attempt>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables
            .attempts
            .values()
            .filter(|a| a.state == AttemptState::InProgress)
            .cloned()
            .collect())
    }

    async fn complete_attempt(
        &self,
        attempt_id: Uuid,
        expected: AttemptState,
        update: CompletionUpdate,
        record: ScoreRecord,
    ) -> Result<Attempt, StoreError> {
        let mut tables = self.inner.write().await;
        let attempt = tables
            .attempts
            .get_mut(&attempt_id)
            .ok_or(StoreError::AttemptNotFound(attempt_id))?;
        if attempt.state != expected {
            return Err(StoreError::StateConflict {
                id: attempt_id,
                expected,
                found: attempt.state,
            });
        }
        attempt.state = update.state;
        attempt.completed_at = Some(update.completed_at);
        attempt.score_percentage = Some(update.score_percentage);
        let updated = attempt.clone();
        tables.scores.insert(attempt_id, record);
        Ok(updated)
    }

    async fn score(&self, attempt_id: Uuid) -> Result<Option<ScoreRecord>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables.scores.get(&attempt_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EvaluationQuestion, QuestionKind};

    fn mcq_definition() -> EvaluationDefinition {
        EvaluationDefinition::new(
            Utc::now(),
            60,
            vec![EvaluationQuestion::new(
                "Pick one",
                10,
                QuestionKind::Mcq {
                    options: vec!["a".into(), "b".into()],
                    correct_answer: "a".into(),
                },
            )],
        )
    }

    fn record_for(attempt_id: Uuid, percentage: f64) -> ScoreRecord {
        ScoreRecord {
            attempt_id,
            score_percentage: percentage,
            grade: "A+".into(),
            breakdown: vec![],
            penalty_applied: false,
            graded_at: Utc::now(),
        }
    }

    fn completion(percentage: f64) -> CompletionUpdate {
        CompletionUpdate {
            state: AttemptState::Completed,
            completed_at: Utc::now(),
            score_percentage: percentage,
        }
    }

    #[tokio::test]
    async fn create_attempt_is_unique_per_user_and_definition() {
        let store = MemoryStore::new();
        let def = mcq_definition();
        store.insert_definition(def.clone()).await.unwrap();

        let first = store.create_attempt(Attempt::start(7, def.id)).await.unwrap();
        let second = store.create_attempt(Attempt::start(7, def.id)).await.unwrap();
        assert_eq!(first.id, second.id);

        let other_user = store.create_attempt(Attempt::start(8, def.id)).await.unwrap();
        assert_ne!(first.id, other_user.id);
    }

    #[tokio::test]
    async fn record_answer_requires_in_progress() {
        let store = MemoryStore::new();
        let def = mcq_definition();
        store.insert_definition(def.clone()).await.unwrap();
        let attempt = store.create_attempt(Attempt::start(1, def.id)).await.unwrap();
        let question_id = def.questions[0].id;

        let answer = SubmittedAnswer {
            answer: "a".into(),
            language: None,
            submitted_at: Utc::now(),
        };
        store
            .record_answer(attempt.id, question_id, answer.clone())
            .await
            .unwrap();

        store
            .complete_attempt(
                attempt.id,
                AttemptState::InProgress,
                completion(100.0),
                record_for(attempt.id, 100.0),
            )
            .await
            .unwrap();

        let err = store
            .record_answer(attempt.id, question_id, answer)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::StateConflict { .. }));
    }

    #[tokio::test]
    async fn complete_attempt_compare_and_set() {
        let store = MemoryStore::new();
        let def = mcq_definition();
        store.insert_definition(def.clone()).await.unwrap();
        let attempt = store.create_attempt(Attempt::start(1, def.id)).await.unwrap();

        let updated = store
            .complete_attempt(
                attempt.id,
                AttemptState::InProgress,
                completion(80.0),
                record_for(attempt.id, 80.0),
            )
            .await
            .unwrap();
        assert_eq!(updated.state, AttemptState::Completed);
        assert_eq!(updated.score_percentage, Some(80.0));

        // Second completion loses the CAS and must not overwrite the record.
        let err = store
            .complete_attempt(
                attempt.id,
                AttemptState::InProgress,
                completion(10.0),
                record_for(attempt.id, 10.0),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::StateConflict { .. }));

        let stored = store.score(attempt.id).await.unwrap().unwrap();
        assert_eq!(stored.score_percentage, 80.0);
    }

    #[tokio::test]
    async fn concurrent_completions_write_exactly_once() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let def = mcq_definition();
        store.insert_definition(def.clone()).await.unwrap();
        let attempt = store.create_attempt(Attempt::start(1, def.id)).await.unwrap();

        let a = {
            let store = store.clone();
            let id = attempt.id;
            tokio::spawn(async move {
                store
                    .complete_attempt(
                        id,
                        AttemptState::InProgress,
                        completion(50.0),
                        record_for(id, 50.0),
                    )
                    .await
            })
        };
        let b = {
            let store = store.clone();
            let id = attempt.id;
            tokio::spawn(async move {
                store
                    .complete_attempt(
                        id,
                        AttemptState::InProgress,
                        completion(60.0),
                        record_for(id, 60.0),
                    )
                    .await
            })
        };

        let (a, b) = (a.await.unwrap(), b.await.unwrap());
        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    }
}
