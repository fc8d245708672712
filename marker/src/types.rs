//! Core data structures shared across the grading pipeline.

/// One test case's judged inputs: what the program was expected to print
/// and what actually happened in the sandbox.
#[derive(Debug, Clone)]
pub struct TestRun {
    pub expected_output: String,
    pub stdout: String,
    /// `None` when the process was killed (timeout or signal).
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    pub build_failed: bool,
}

impl TestRun {
    /// A run that never produced output, used when the sandbox itself could
    /// not be invoked for this case. Counts as failed.
    pub fn failed(expected_output: impl Into<String>) -> Self {
        Self {
            expected_output: expected_output.into(),
            stdout: String::new(),
            exit_code: None,
            timed_out: false,
            build_failed: true,
        }
    }

    /// A test case passes only when the program built, finished in time,
    /// exited zero, and printed the expected output.
    pub fn passed(&self) -> bool {
        !self.build_failed
            && !self.timed_out
            && self.exit_code == Some(0)
            && crate::output_comparator::matches(&self.expected_output, &self.stdout)
    }
}

/// The graded outcome of one question.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionResult {
    pub earned: u32,
    pub possible: u32,
    /// Human-readable summary, e.g. `"3/4 test cases passed"`.
    pub detail: String,
}
