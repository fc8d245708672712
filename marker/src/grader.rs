//! Per-question grading.
//!
//! MCQ answers are all-or-nothing. Coding answers score by test-case pass
//! ratio, optionally blended with an externally supplied quality heuristic.
//! Failed builds, timeouts, and runtime errors arrive here as failed test
//! runs and reduce the ratio; they never abort grading.

use crate::types::{QuestionResult, TestRun};
use tracing::trace;

/// Blend between the functional pass ratio and the optional quality score.
/// Defaults to 0.7 / 0.3; overridable through configuration.
#[derive(Debug, Clone, Copy)]
pub struct GradeWeights {
    pub functional: f64,
    pub quality: f64,
}

impl GradeWeights {
    pub fn from_config() -> Self {
        Self {
            functional: util::config::functional_weight(),
            quality: util::config::quality_weight(),
        }
        .normalized()
    }

    /// Rescales so the weights sum to 1; falls back to the defaults when
    /// the configured pair is degenerate.
    pub fn normalized(self) -> Self {
        let sum = self.functional + self.quality;
        if sum <= 0.0 || !sum.is_finite() {
            return Self::default();
        }
        Self {
            functional: self.functional / sum,
            quality: self.quality / sum,
        }
    }
}

impl Default for GradeWeights {
    fn default() -> Self {
        Self {
            functional: 0.7,
            quality: 0.3,
        }
    }
}

/// Grades a multiple-choice answer: full points iff the submitted option
/// equals the correct one, compared case-insensitively. No partial credit.
pub fn grade_mcq(points: u32, correct_answer: &str, submitted: Option<&str>) -> QuestionResult {
    let correct = match submitted {
        Some(answer) => answer.trim().eq_ignore_ascii_case(correct_answer.trim()),
        None => false,
    };
    QuestionResult {
        earned: if correct { points } else { 0 },
        possible: points,
        detail: match (submitted, correct) {
            (None, _) => "no answer submitted".to_string(),
            (_, true) => "correct option".to_string(),
            (_, false) => "incorrect option".to_string(),
        },
    }
}

/// Grades a coding answer from its per-test-case runs.
///
/// `quality_score` is the optional external heuristic in `[0, 100]`; when
/// absent the score is purely functional.
pub fn grade_coding(
    points: u32,
    runs: &[TestRun],
    quality_score: Option<f64>,
    weights: &GradeWeights,
) -> QuestionResult {
    let total = runs.len();
    let passed = runs.iter().filter(|r| r.passed()).count();
    let pass_ratio = if total == 0 {
        0.0
    } else {
        passed as f64 / total as f64
    };

    let final_ratio = match quality_score {
        Some(quality) => {
            let quality = (quality / 100.0).clamp(0.0, 1.0);
            weights.functional * pass_ratio + weights.quality * quality
        }
        None => pass_ratio,
    };
    trace!(passed, total, pass_ratio, final_ratio, "graded coding question");

    let earned = ((points as f64) * final_ratio).round() as u32;
    QuestionResult {
        earned: earned.min(points),
        possible: points,
        detail: format!("{passed}/{total} test cases passed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passing_run() -> TestRun {
        TestRun {
            expected_output: "5".into(),
            stdout: "5\n".into(),
            exit_code: Some(0),
            timed_out: false,
            build_failed: false,
        }
    }

    fn wrong_output_run() -> TestRun {
        TestRun {
            expected_output: "5".into(),
            stdout: "6\n".into(),
            exit_code: Some(0),
            timed_out: false,
            build_failed: false,
        }
    }

    fn timed_out_run() -> TestRun {
        TestRun {
            expected_output: "5".into(),
            stdout: String::new(),
            exit_code: None,
            timed_out: true,
            build_failed: false,
        }
    }

    #[test]
    fn mcq_correct_earns_full_points() {
        let result = grade_mcq(10, "B", Some("b"));
        assert_eq!(result.earned, 10);
        assert_eq!(result.possible, 10);
    }

    #[test]
    fn mcq_incorrect_earns_zero() {
        assert_eq!(grade_mcq(10, "B", Some("c")).earned, 0);
    }

    #[test]
    fn mcq_missing_answer_earns_zero() {
        let result = grade_mcq(10, "B", None);
        assert_eq!(result.earned, 0);
        assert_eq!(result.detail, "no answer submitted");
    }

    #[test]
    fn coding_full_pass() {
        let runs = vec![passing_run(), passing_run()];
        let result = grade_coding(20, &runs, None, &GradeWeights::default());
        assert_eq!(result.earned, 20);
        assert_eq!(result.detail, "2/2 test cases passed");
    }

    #[test]
    fn coding_partial_pass_rounds() {
        let runs = vec![passing_run(), passing_run(), wrong_output_run()];
        // 2/3 of 10 points = 6.67 -> 7
        let result = grade_coding(10, &runs, None, &GradeWeights::default());
        assert_eq!(result.earned, 7);
    }

    #[test]
    fn timed_out_case_counts_as_failed_without_aborting() {
        let runs = vec![passing_run(), timed_out_run()];
        let result = grade_coding(10, &runs, None, &GradeWeights::default());
        assert_eq!(result.earned, 5);
        assert_eq!(result.detail, "1/2 test cases passed");
    }

    #[test]
    fn build_failure_scores_zero() {
        let runs = vec![TestRun::failed("5"), TestRun::failed("6")];
        let result = grade_coding(10, &runs, None, &GradeWeights::default());
        assert_eq!(result.earned, 0);
    }

    #[test]
    fn nonzero_exit_fails_even_with_matching_output() {
        let mut run = passing_run();
        run.exit_code = Some(1);
        let result = grade_coding(10, &[run], None, &GradeWeights::default());
        assert_eq!(result.earned, 0);
    }

    #[test]
    fn quality_blend_uses_weights() {
        let runs = vec![passing_run(), wrong_output_run()];
        // 0.7 * 0.5 + 0.3 * 0.8 = 0.59 -> 6 of 10
        let result = grade_coding(10, &runs, Some(80.0), &GradeWeights::default());
        assert_eq!(result.earned, 6);
    }

    #[test]
    fn no_quality_score_means_pure_functional() {
        let runs = vec![passing_run(), wrong_output_run()];
        let result = grade_coding(10, &runs, None, &GradeWeights::default());
        assert_eq!(result.earned, 5);
    }

    #[test]
    fn zero_test_cases_scores_zero() {
        let result = grade_coding(10, &[], None, &GradeWeights::default());
        assert_eq!(result.earned, 0);
    }

    #[test]
    fn earned_never_exceeds_possible() {
        let runs = vec![passing_run()];
        let result = grade_coding(10, &runs, Some(1000.0), &GradeWeights::default());
        assert!(result.earned <= result.possible);
    }

    #[test]
    fn degenerate_weights_fall_back_to_defaults() {
        let weights = GradeWeights {
            functional: 0.0,
            quality: 0.0,
        }
        .normalized();
        assert_eq!(weights.functional, 0.7);
        assert_eq!(weights.quality, 0.3);
    }
}
