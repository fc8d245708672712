pub mod attempt;
pub mod evaluation;
pub mod score;

pub use attempt::{Attempt, AttemptState, SubmittedAnswer};
pub use evaluation::{EvaluationDefinition, EvaluationQuestion, QuestionKind, TestCase};
pub use score::{QuestionScore, ScoreRecord};
