//! # Marker Library
//!
//! Converts raw answers and execution outcomes into points, percentages,
//! and letter grades. Everything here is pure: sandbox execution happens
//! upstream and arrives as [`types::TestRun`] values, so the grading path
//! is deterministic and trivially testable.
//!
//! ## Key Concepts
//! - **Comparator**: whitespace/case/numeric-tolerant matching of expected
//!   vs. actual output for a single test case.
//! - **Grader**: per-question scoring (MCQ all-or-nothing, coding by test
//!   case pass ratio with an optional quality blend).
//! - **Scorer**: aggregation of question results into a final percentage.
//! - **Grades**: the fixed percentage-to-letter table.

pub mod grader;
pub mod grades;
pub mod output_comparator;
pub mod scorer;
pub mod types;

pub use grader::{GradeWeights, grade_coding, grade_mcq};
pub use grades::letter_grade;
pub use output_comparator::matches;
pub use scorer::compute_percentage;
pub use types::{QuestionResult, TestRun};
