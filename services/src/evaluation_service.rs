//! Evaluation lifecycle manager.
//!
//! Owns the state machine for evaluation definitions and per-user attempts:
//! `start` / `submit_answer` / `complete` / `force_complete`, plus window
//! creation and score retrieval for the surrounding application. Grading
//! runs outside the store lock; the terminal write lands through the
//! store's compare-and-set, so concurrent completions of one attempt can
//! never both grade.

use crate::error::ServiceError;
use crate::notifier::Notifier;
use crate::question_generator::{QuestionGenerator, QuestionRequest, RequestedKind};
use chrono::{DateTime, Utc};
use code_runner::{ExecutionConfig, Submission};
use db::models::{
    Attempt, AttemptState, EvaluationDefinition, EvaluationQuestion, QuestionKind, QuestionScore,
    ScoreRecord, SubmittedAnswer,
};
use db::store::{CompletionUpdate, EvaluationStore, StoreError};
use marker::{GradeWeights, TestRun};
use std::sync::Arc;
use util::languages::Language;
use uuid::Uuid;

const MCQ_POINTS: u32 = 10;
const CODING_POINTS: u32 = 20;

/// Parameters for materializing one evaluation window.
#[derive(Debug, Clone)]
pub struct CreateDefinition {
    pub scheduled_start: DateTime<Utc>,
    pub duration_minutes: i64,
    pub mcq_count: usize,
    pub coding_count: usize,
}

pub struct EvaluationService {
    store: Arc<dyn EvaluationStore>,
    generator: Arc<dyn QuestionGenerator>,
    notifier: Arc<dyn Notifier>,
    exec_config: ExecutionConfig,
    weights: GradeWeights,
    late_penalty: f64,
}

impl EvaluationService {
    pub fn new(
        store: Arc<dyn EvaluationStore>,
        generator: Arc<dyn QuestionGenerator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            generator,
            notifier,
            exec_config: ExecutionConfig::from_config(),
            weights: GradeWeights::from_config(),
            late_penalty: util::config::late_penalty(),
        }
    }

    pub fn store(&self) -> &Arc<dyn EvaluationStore> {
        &self.store
    }

    /// Creates an immutable evaluation window with freshly generated
    /// questions.
    pub async fn create_definition(
        &self,
        params: CreateDefinition,
    ) -> Result<EvaluationDefinition, ServiceError> {
        let mut questions = Vec::with_capacity(params.mcq_count + params.coding_count);
        for i in 0..params.mcq_count {
            let generated = self
                .generator
                .generate(&QuestionRequest::new(RequestedKind::Mcq, i))
                .await?;
            questions.push(generated.into_question(MCQ_POINTS)?);
        }
        for i in 0..params.coding_count {
            let generated = self
                .generator
                .generate(&QuestionRequest::new(RequestedKind::Coding, i))
                .await?;
            questions.push(generated.into_question(CODING_POINTS)?);
        }

        let definition = EvaluationDefinition::new(
            params.scheduled_start,
            params.duration_minutes,
            questions,
        );
        self.store.insert_definition(definition.clone()).await?;
        log::info!(
            "created evaluation window {} starting {}",
            definition.id,
            definition.scheduled_start
        );
        self.notifier
            .notify(
                "evaluation_window_created",
                serde_json::json!({
                    "definition_id": definition.id,
                    "scheduled_start": definition.scheduled_start,
                    "duration_minutes": definition.duration_minutes,
                }),
            )
            .await;
        Ok(definition)
    }

    /// The earliest definition whose window has not yet closed, if any.
    pub async fn next_definition(&self) -> Result<Option<EvaluationDefinition>, ServiceError> {
        let now = Utc::now();
        let mut definitions = self.store.definitions().await?;
        definitions.retain(|d| d.window_end() > now);
        definitions.sort_by_key(|d| d.scheduled_start);
        Ok(definitions.into_iter().next())
    }

    /// Starts (or resumes) the caller's attempt for a definition.
    ///
    /// Allowed only inside the scheduled window. A second `start` for the
    /// same (user, definition) returns the existing in-progress attempt
    /// unchanged; a terminal attempt is rejected with `AlreadyCompleted`.
    pub async fn start(&self, user_id: i64, definition_id: Uuid) -> Result<Attempt, ServiceError> {
        let definition = self.store.definition(definition_id).await?;
        let now = Utc::now();
        if now < definition.scheduled_start {
            return Err(ServiceError::WindowNotOpen);
        }
        if now > definition.window_end() {
            return Err(ServiceError::WindowClosed);
        }

        if let Some(existing) = self.store.attempt_for_user(user_id, definition_id).await? {
            if existing.state.is_terminal() {
                return Err(ServiceError::AlreadyCompleted);
            }
            return Ok(existing);
        }

        let attempt = self
            .store
            .create_attempt(Attempt::start(user_id, definition_id))
            .await?;
        // create_attempt returns a pre-existing attempt on a start/start
        // race; it may have been completed in the meantime.
        if attempt.state.is_terminal() {
            return Err(ServiceError::AlreadyCompleted);
        }
        Ok(attempt)
    }

    /// Stores or overwrites one answer. Does not grade.
    ///
    /// Coding answers must carry a supported language and non-empty source;
    /// both are validated here, at submission time.
    pub async fn submit_answer(
        &self,
        attempt_id: Uuid,
        question_id: Uuid,
        answer: &str,
        language: Option<&str>,
    ) -> Result<(), ServiceError> {
        let attempt = self.store.attempt(attempt_id).await?;
        if attempt.state != AttemptState::InProgress {
            return Err(ServiceError::AttemptNotInProgress);
        }
        let definition = self.store.definition(attempt.definition_id).await?;
        let question = definition
            .question(question_id)
            .ok_or(ServiceError::QuestionNotFound(question_id))?;

        let language = if question.is_coding() {
            if answer.trim().is_empty() {
                return Err(ServiceError::EmptySubmission);
            }
            let id = language.ok_or(ServiceError::MissingLanguage)?;
            Some(Language::resolve(id)?)
        } else {
            None
        };

        self.store
            .record_answer(
                attempt_id,
                question_id,
                SubmittedAnswer {
                    answer: answer.to_string(),
                    language,
                    submitted_at: Utc::now(),
                },
            )
            .await?;
        Ok(())
    }

    /// Grades the attempt and transitions it to `Completed`.
    ///
    /// Idempotent: completing an already-terminal attempt returns the
    /// stored score record without re-grading.
    pub async fn complete(&self, attempt_id: Uuid) -> Result<ScoreRecord, ServiceError> {
        self.finalize(attempt_id, AttemptState::Completed).await
    }

    /// Scheduler-invoked completion past the deadline: same grading path,
    /// with the late penalty applied and the terminal state `AutoSubmitted`.
    pub async fn force_complete(&self, attempt_id: Uuid) -> Result<ScoreRecord, ServiceError> {
        self.finalize(attempt_id, AttemptState::AutoSubmitted).await
    }

    /// The stored score record for a terminal attempt.
    pub async fn score(&self, attempt_id: Uuid) -> Result<ScoreRecord, ServiceError> {
        let _ = self.store.attempt(attempt_id).await?;
        self.store
            .score(attempt_id)
            .await?
            .ok_or(ServiceError::ScoreNotFound(attempt_id))
    }

    async fn finalize(
        &self,
        attempt_id: Uuid,
        target: AttemptState,
    ) -> Result<ScoreRecord, ServiceError> {
        let attempt = self.store.attempt(attempt_id).await?;
        if attempt.state.is_terminal() {
            return self
                .store
                .score(attempt_id)
                .await?
                .ok_or(ServiceError::ScoreNotFound(attempt_id));
        }
        if attempt.state != AttemptState::InProgress {
            return Err(ServiceError::AttemptNotInProgress);
        }
        let definition = self.store.definition(attempt.definition_id).await?;

        let mut breakdown = Vec::with_capacity(definition.questions.len());
        let mut results = Vec::with_capacity(definition.questions.len());
        for question in &definition.questions {
            let result = self
                .grade_question(question, attempt.answers.get(&question.id))
                .await;
            breakdown.push(QuestionScore {
                question_id: question.id,
                earned: result.earned,
                possible: result.possible,
                detail: result.detail.clone(),
            });
            results.push(result);
        }

        let mut percentage = marker::compute_percentage(&results);
        let penalty_applied = target == AttemptState::AutoSubmitted;
        if penalty_applied {
            percentage = (percentage * self.late_penalty).clamp(0.0, 100.0);
        }

        let record = ScoreRecord {
            attempt_id,
            score_percentage: percentage,
            grade: marker::letter_grade(percentage).to_string(),
            breakdown,
            penalty_applied,
            graded_at: Utc::now(),
        };

        match self
            .store
            .complete_attempt(
                attempt_id,
                AttemptState::InProgress,
                CompletionUpdate {
                    state: target,
                    completed_at: record.graded_at,
                    score_percentage: percentage,
                },
                record.clone(),
            )
            .await
        {
            Ok(_) => {}
            Err(StoreError::StateConflict { .. }) => {
                // Lost the race to a concurrent completion; its record stands.
                log::debug!("attempt {} was completed concurrently", attempt_id);
                return self
                    .store
                    .score(attempt_id)
                    .await?
                    .ok_or(ServiceError::AttemptNotInProgress);
            }
            Err(err) => return Err(err.into()),
        }

        let event = if penalty_applied {
            "attempt_force_submitted"
        } else {
            "attempt_completed"
        };
        self.notifier
            .notify(
                event,
                serde_json::json!({
                    "attempt_id": attempt_id,
                    "score_percentage": record.score_percentage,
                    "grade": record.grade,
                }),
            )
            .await;
        Ok(record)
    }

    /// Grades one question with whatever answer is present. Sandbox and
    /// runtime failures become failed test cases, never errors, so a broken
    /// test case cannot zero out the rest of the attempt.
    async fn grade_question(
        &self,
        question: &EvaluationQuestion,
        answer: Option<&SubmittedAnswer>,
    ) -> marker::QuestionResult {
        match &question.kind {
            QuestionKind::Mcq { correct_answer, .. } => marker::grade_mcq(
                question.points,
                correct_answer,
                answer.map(|a| a.answer.as_str()),
            ),
            QuestionKind::Coding { test_cases } => {
                let Some(answer) = answer else {
                    return marker::QuestionResult {
                        earned: 0,
                        possible: question.points,
                        detail: "no answer submitted".to_string(),
                    };
                };
                let Some(language) = answer.language else {
                    return marker::QuestionResult {
                        earned: 0,
                        possible: question.points,
                        detail: "no language specified".to_string(),
                    };
                };

                let submission = Submission {
                    language,
                    source: answer.answer.clone(),
                };
                let mut runs = Vec::with_capacity(test_cases.len());
                for test_case in test_cases {
                    match code_runner::execute(&submission, &test_case.input, &self.exec_config)
                        .await
                    {
                        Ok(result) => runs.push(TestRun {
                            expected_output: test_case.expected_output.clone(),
                            stdout: result.stdout,
                            exit_code: result.exit_code,
                            timed_out: result.timed_out,
                            build_failed: result.build_failed,
                        }),
                        Err(err) => {
                            log::warn!(
                                "sandbox failure for question {}: {}",
                                question.id,
                                err
                            );
                            runs.push(TestRun::failed(test_case.expected_output.clone()));
                        }
                    }
                }
                // No external quality heuristic is wired in; the score is
                // purely functional until a supplier provides one.
                marker::grade_coding(question.points, &runs, None, &self.weights)
            }
        }
    }
}
