//! Final graded outcome of an attempt, written exactly once at completion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-question slice of the final score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionScore {
    pub question_id: Uuid,
    pub earned: u32,
    pub possible: u32,
    pub detail: String,
}

/// The terminal grading record for one attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub attempt_id: Uuid,
    /// Always in `[0, 100]`; already includes the late penalty when
    /// `penalty_applied` is set.
    pub score_percentage: f64,
    pub grade: String,
    pub breakdown: Vec<QuestionScore>,
    pub penalty_applied: bool,
    pub graded_at: DateTime<Utc>,
}
