//! One user's pass through one evaluation window.
//!
//! Attempts are the audit record of the lifecycle: created on `start`,
//! mutated only by answer writes and the terminal completion write, never
//! deleted.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{Display, EnumString};
use util::languages::Language;
use uuid::Uuid;

/// Lifecycle states. Transitions are monotonic; an attempt never regresses.
///
/// `NotStarted` is the conceptual state before any attempt row exists and is
/// never stored. `Abandoned` is terminal and reachable only through
/// administrative tooling.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttemptState {
    NotStarted,
    InProgress,
    Completed,
    AutoSubmitted,
    Abandoned,
}

impl AttemptState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AttemptState::Completed | AttemptState::AutoSubmitted | AttemptState::Abandoned
        )
    }
}

/// One stored answer. For coding questions `language` selects the sandbox
/// runtime; MCQ answers carry the chosen option only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    pub answer: String,
    pub language: Option<Language>,
    pub submitted_at: DateTime<Utc>,
}

/// One user's single pass through one scheduled evaluation window.
/// Unique per (user, definition).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    pub id: Uuid,
    pub user_id: i64,
    pub definition_id: Uuid,
    pub state: AttemptState,
    pub started_at: DateTime<Utc>,
    /// question id -> latest answer; last write wins per question.
    pub answers: HashMap<Uuid, SubmittedAnswer>,
    pub completed_at: Option<DateTime<Utc>>,
    pub score_percentage: Option<f64>,
}

impl Attempt {
    pub fn start(user_id: i64, definition_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            definition_id,
            state: AttemptState::InProgress,
            started_at: Utc::now(),
            answers: HashMap::new(),
            completed_at: None,
            score_percentage: None,
        }
    }

    /// Instant after which the scheduler sweep may force-complete this
    /// attempt, given the definition's duration.
    pub fn deadline(&self, duration_minutes: i64) -> DateTime<Utc> {
        self.started_at + Duration::minutes(duration_minutes)
    }
}
