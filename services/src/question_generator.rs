//! Question sourcing for scheduled evaluation windows.
//!
//! The external content service is consumed as a black box over HTTP; any
//! transport failure or malformed payload falls back to a deterministic
//! built-in template bank with the same output shape. The fallback is an
//! explicit branch in [`GeneratorWithFallback`], not an error handler.

use async_trait::async_trait;
use db::models::{EvaluationQuestion, QuestionKind, TestCase};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestedKind {
    Mcq,
    Coding,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionRequest {
    pub kind: RequestedKind,
    pub difficulty: String,
    pub category: String,
    /// Position of the question within its window; the template bank
    /// rotates on it so generated windows vary deterministically.
    #[serde(skip)]
    pub index: usize,
}

impl QuestionRequest {
    pub fn new(kind: RequestedKind, index: usize) -> Self {
        Self {
            kind,
            difficulty: "medium".to_string(),
            category: "general".to_string(),
            index,
        }
    }
}

/// Wire shape returned by the content service (and produced by the
/// template bank): MCQ payloads carry options + correct answer, coding
/// payloads carry test cases.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedQuestion {
    pub question_text: String,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub correct_answer: Option<String>,
    #[serde(default)]
    pub test_cases: Option<Vec<TestCase>>,
}

impl GeneratedQuestion {
    /// Validates the payload shape and converts it into a domain question.
    pub fn into_question(self, points: u32) -> Result<EvaluationQuestion, GeneratorError> {
        match (self.test_cases, self.options, self.correct_answer) {
            (Some(test_cases), _, _) if !test_cases.is_empty() => Ok(EvaluationQuestion::new(
                self.question_text,
                points,
                QuestionKind::Coding { test_cases },
            )),
            (None, Some(options), Some(correct_answer))
                if options.iter().any(|o| o.eq_ignore_ascii_case(&correct_answer)) =>
            {
                Ok(EvaluationQuestion::new(
                    self.question_text,
                    points,
                    QuestionKind::Mcq {
                        options,
                        correct_answer,
                    },
                ))
            }
            _ => Err(GeneratorError::MalformedQuestion),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("question service request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("question service returned a malformed question")]
    MalformedQuestion,
}

#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate(&self, request: &QuestionRequest) -> Result<GeneratedQuestion, GeneratorError>;
}

/// Client for the external question/content service.
pub struct HttpQuestionGenerator {
    client: reqwest::Client,
    base_url: String,
}

impl HttpQuestionGenerator {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl QuestionGenerator for HttpQuestionGenerator {
    async fn generate(&self, request: &QuestionRequest) -> Result<GeneratedQuestion, GeneratorError> {
        let url = format!("{}/generate", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<GeneratedQuestion>().await?)
    }
}

struct McqTemplate {
    question_text: &'static str,
    options: &'static [&'static str],
    correct_answer: &'static str,
}

struct CodingTemplate {
    question_text: &'static str,
    test_cases: &'static [(&'static str, &'static str)],
}

static MCQ_BANK: &[McqTemplate] = &[
    McqTemplate {
        question_text: "What is the worst-case time complexity of binary search on a sorted array of n elements?",
        options: &["O(1)", "O(log n)", "O(n)", "O(n log n)"],
        correct_answer: "O(log n)",
    },
    McqTemplate {
        question_text: "Which data structure gives amortized O(1) insertion and removal at both ends?",
        options: &["Binary heap", "Singly linked list", "Deque", "Sorted array"],
        correct_answer: "Deque",
    },
    McqTemplate {
        question_text: "What does a stable sorting algorithm guarantee?",
        options: &[
            "It always runs in O(n log n)",
            "Equal elements keep their relative order",
            "It sorts in place",
            "It never compares the same pair twice",
        ],
        correct_answer: "Equal elements keep their relative order",
    },
    McqTemplate {
        question_text: "Which of these problems is a classic use of dynamic programming?",
        options: &[
            "Longest common subsequence",
            "Finding the minimum of an array",
            "Reversing a string",
            "Hashing a password",
        ],
        correct_answer: "Longest common subsequence",
    },
];

static CODING_BANK: &[CodingTemplate] = &[
    CodingTemplate {
        question_text: "Read a single integer from standard input and print it unchanged.",
        test_cases: &[("5", "5"), ("42", "42"), ("-7", "-7")],
    },
    CodingTemplate {
        question_text: "Read two space-separated integers from one line and print their sum.",
        test_cases: &[("3 4", "7"), ("10 -2", "8"), ("0 0", "0")],
    },
    CodingTemplate {
        question_text: "Read a line of space-separated integers and print the largest one.",
        test_cases: &[("1 5 3", "5"), ("-4 -2 -9", "-2"), ("7", "7")],
    },
    CodingTemplate {
        question_text: "Read a word and print it reversed.",
        test_cases: &[("abc", "cba"), ("racecar", "racecar"), ("x", "x")],
    },
];

/// Deterministic built-in bank; selection rotates on the request index so
/// repeated calls for one window produce distinct questions.
pub struct TemplateQuestionGenerator;

#[async_trait]
impl QuestionGenerator for TemplateQuestionGenerator {
    async fn generate(&self, request: &QuestionRequest) -> Result<GeneratedQuestion, GeneratorError> {
        Ok(match request.kind {
            RequestedKind::Mcq => {
                let template = &MCQ_BANK[request.index % MCQ_BANK.len()];
                GeneratedQuestion {
                    question_text: template.question_text.to_string(),
                    options: Some(template.options.iter().map(|s| s.to_string()).collect()),
                    correct_answer: Some(template.correct_answer.to_string()),
                    test_cases: None,
                }
            }
            RequestedKind::Coding => {
                let template = &CODING_BANK[request.index % CODING_BANK.len()];
                GeneratedQuestion {
                    question_text: template.question_text.to_string(),
                    options: None,
                    correct_answer: None,
                    test_cases: Some(
                        template
                            .test_cases
                            .iter()
                            .map(|(input, expected)| TestCase {
                                input: input.to_string(),
                                expected_output: expected.to_string(),
                            })
                            .collect(),
                    ),
                }
            }
        })
    }
}

/// Primary generator with the template bank as an explicit fallback branch.
/// With no primary configured every question comes from the bank.
pub struct GeneratorWithFallback {
    primary: Option<Box<dyn QuestionGenerator>>,
    fallback: TemplateQuestionGenerator,
}

impl GeneratorWithFallback {
    pub fn new(primary: Option<Box<dyn QuestionGenerator>>) -> Self {
        Self {
            primary,
            fallback: TemplateQuestionGenerator,
        }
    }

    /// Wires the HTTP generator when `QUESTION_SERVICE_URL` is set.
    pub fn from_config() -> Self {
        let url = util::config::question_service_url();
        let primary: Option<Box<dyn QuestionGenerator>> = if url.is_empty() {
            None
        } else {
            Some(Box::new(HttpQuestionGenerator::new(url)))
        };
        Self::new(primary)
    }
}

#[async_trait]
impl QuestionGenerator for GeneratorWithFallback {
    async fn generate(&self, request: &QuestionRequest) -> Result<GeneratedQuestion, GeneratorError> {
        if let Some(primary) = &self.primary {
            match primary.generate(request).await {
                Ok(question) => return Ok(question),
                Err(err) => {
                    log::warn!("question service unavailable, using template bank: {}", err);
                }
            }
        }
        self.fallback.generate(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn template_bank_produces_valid_mcq() {
        let generated = TemplateQuestionGenerator
            .generate(&QuestionRequest::new(RequestedKind::Mcq, 0))
            .await
            .unwrap();
        let question = generated.into_question(10).unwrap();
        assert_eq!(question.points, 10);
        assert!(matches!(question.kind, QuestionKind::Mcq { .. }));
    }

    #[tokio::test]
    async fn template_bank_produces_valid_coding_question() {
        let generated = TemplateQuestionGenerator
            .generate(&QuestionRequest::new(RequestedKind::Coding, 1))
            .await
            .unwrap();
        let question = generated.into_question(20).unwrap();
        match question.kind {
            QuestionKind::Coding { test_cases } => assert!(!test_cases.is_empty()),
            other => panic!("expected coding question, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn template_bank_rotates_on_index() {
        let a = TemplateQuestionGenerator
            .generate(&QuestionRequest::new(RequestedKind::Mcq, 0))
            .await
            .unwrap();
        let b = TemplateQuestionGenerator
            .generate(&QuestionRequest::new(RequestedKind::Mcq, 1))
            .await
            .unwrap();
        assert_ne!(a.question_text, b.question_text);
    }

    #[test]
    fn malformed_payload_is_rejected() {
        let generated = GeneratedQuestion {
            question_text: "broken".into(),
            options: None,
            correct_answer: None,
            test_cases: None,
        };
        assert!(matches!(
            generated.into_question(5),
            Err(GeneratorError::MalformedQuestion)
        ));
    }

    #[test]
    fn mcq_with_answer_outside_options_is_rejected() {
        let generated = GeneratedQuestion {
            question_text: "pick".into(),
            options: Some(vec!["a".into(), "b".into()]),
            correct_answer: Some("z".into()),
            test_cases: None,
        };
        assert!(generated.into_question(5).is_err());
    }

    #[tokio::test]
    async fn fallback_engages_when_no_primary_is_configured() {
        let generator = GeneratorWithFallback::new(None);
        let generated = generator
            .generate(&QuestionRequest::new(RequestedKind::Coding, 0))
            .await
            .unwrap();
        assert!(generated.test_cases.is_some());
    }
}
