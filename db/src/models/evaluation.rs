//! Evaluation windows and the questions they carry.
//!
//! An `EvaluationDefinition` is created once (by the scheduler or an admin
//! action) and never mutated afterwards; attempts reference it by id.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One input/expected-output pair used to verify a coding answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
}

/// The two graded question variants. Selected once via exhaustive match in
/// the grading path, never by string comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum QuestionKind {
    Mcq {
        options: Vec<String>,
        correct_answer: String,
    },
    Coding {
        test_cases: Vec<TestCase>,
    },
}

/// One graded item inside an evaluation window. Immutable once the window
/// is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationQuestion {
    pub id: Uuid,
    pub prompt: String,
    pub points: u32,
    #[serde(flatten)]
    pub kind: QuestionKind,
}

impl EvaluationQuestion {
    pub fn new(prompt: impl Into<String>, points: u32, kind: QuestionKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            prompt: prompt.into(),
            points,
            kind,
        }
    }

    pub fn is_coding(&self) -> bool {
        matches!(self.kind, QuestionKind::Coding { .. })
    }
}

/// One scheduled assessment window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationDefinition {
    pub id: Uuid,
    pub scheduled_start: DateTime<Utc>,
    pub duration_minutes: i64,
    pub questions: Vec<EvaluationQuestion>,
    pub created_at: DateTime<Utc>,
}

impl EvaluationDefinition {
    pub fn new(
        scheduled_start: DateTime<Utc>,
        duration_minutes: i64,
        questions: Vec<EvaluationQuestion>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            scheduled_start,
            duration_minutes,
            questions,
            created_at: Utc::now(),
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::minutes(self.duration_minutes)
    }

    /// Instant after which `start` is rejected with a closed-window error.
    pub fn window_end(&self) -> DateTime<Utc> {
        self.scheduled_start + self.duration()
    }

    /// Whether `at` falls inside `[scheduled_start, scheduled_start + duration]`.
    pub fn window_contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.scheduled_start && at <= self.window_end()
    }

    /// Sum of question points; the denominator for the final percentage.
    pub fn total_points(&self) -> u32 {
        self.questions.iter().map(|q| q.points).sum()
    }

    /// Whether this window occupies the given calendar date. Used by the
    /// scheduler's idempotency check before materializing a new window.
    pub fn covers_date(&self, date: NaiveDate) -> bool {
        self.scheduled_start.date_naive() == date
    }

    pub fn question(&self, id: Uuid) -> Option<&EvaluationQuestion> {
        self.questions.iter().find(|q| q.id == id)
    }
}
