//! Keyword Comparator: pluggable, trait-based comparison of a job
//! description against resume text.
//!
//! `LlmComparator` asks the generative backend and returns its parsed answer
//! as-is, unless that answer carries an `error` key. `HeuristicComparator` matches a fixed skill vocabulary and computes
//! the ratio score. One of them is chosen at startup via `KEYWORD_SCORER` and
//! carried in `AppState` as `Arc<dyn KeywordComparator>`.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::comparison::models::{CompareRequest, KeywordComparisonResult};
use crate::comparison::prompts::build_keyword_comparison_prompt;
use crate::errors::AppError;
use crate::llm_client::{excerpt, generate_json, GenerativeBackend, LlmError, NOT_CONFIGURED_MESSAGE};

#[derive(Debug, Error)]
pub enum ComparisonError {
    #[error("Job description and resume text are required.")]
    MissingInput,

    #[error("{}", NOT_CONFIGURED_MESSAGE)]
    NotConfigured,

    #[error(transparent)]
    Generation(#[from] LlmError),

    /// The model answered with JSON that itself reports a failure.
    #[error("Keyword comparison failed: {message}")]
    Reported { message: String, raw_response: String },

    #[error("Failed to encode comparison result: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<ComparisonError> for AppError {
    fn from(err: ComparisonError) -> Self {
        match err {
            ComparisonError::MissingInput => AppError::Validation(err.to_string()),
            ComparisonError::NotConfigured => AppError::Llm {
                message: err.to_string(),
                raw_response: None,
            },
            ComparisonError::Generation(e) => e.into_app_error("keyword comparison"),
            ComparisonError::Reported {
                message,
                raw_response,
            } => AppError::Llm {
                message: format!("Keyword comparison failed: {message}"),
                raw_response: Some(raw_response),
            },
            ComparisonError::Encode(e) => AppError::Internal(e.into()),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait KeywordComparator: Send + Sync {
    /// Backend name for logs: "llm" | "heuristic".
    fn backend(&self) -> &'static str;

    /// Compares two non-empty texts. Callers validate first.
    async fn compare(&self, job_description: &str, resume_text: &str) -> Result<Value, ComparisonError>;
}

/// Validates the request and runs `comparator`. Empty or missing inputs are
/// rejected before any backend is touched.
pub async fn compare_keywords(
    comparator: &dyn KeywordComparator,
    request: &CompareRequest,
) -> Result<Value, ComparisonError> {
    let job_description = non_empty(request.job_description.as_deref());
    let resume_text = non_empty(request.resume_text.as_deref());
    let (Some(job_description), Some(resume_text)) = (job_description, resume_text) else {
        warn!("Keyword comparison rejected: missing job description or resume text");
        return Err(ComparisonError::MissingInput);
    };

    info!(
        "Comparing keywords via {} backend (jd: {:?}, resume: {:?})",
        comparator.backend(),
        excerpt(job_description, 50),
        excerpt(resume_text, 50)
    );
    comparator.compare(job_description, resume_text).await
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

// ────────────────────────────────────────────────────────────────────────────
// LlmComparator
// ────────────────────────────────────────────────────────────────────────────

pub struct LlmComparator {
    backend: Option<Arc<dyn GenerativeBackend>>,
}

impl LlmComparator {
    pub fn new(backend: Option<Arc<dyn GenerativeBackend>>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl KeywordComparator for LlmComparator {
    fn backend(&self) -> &'static str {
        "llm"
    }

    async fn compare(&self, job_description: &str, resume_text: &str) -> Result<Value, ComparisonError> {
        let backend = self.backend.as_deref().ok_or(ComparisonError::NotConfigured)?;
        let prompt = build_keyword_comparison_prompt(job_description, resume_text);
        let value = generate_json(backend, &prompt).await?;

        if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
            let message = error
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            warn!("Generative backend reported a comparison failure: {message}");
            return Err(ComparisonError::Reported {
                message,
                raw_response: value.to_string(),
            });
        }
        Ok(value)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// HeuristicComparator
// ────────────────────────────────────────────────────────────────────────────

/// (alias as written in text, display name). Several aliases may share a
/// display name. Lowercase aliases match in any case. Aliases that double as
/// ordinary English words ("Go", "Rust", "Swift", "React") are written
/// capitalised and match only that way; "Spring" needs its framework
/// qualifier. Words like "word", "excel", "express" and "rest" are not in the
/// list at all.
const SKILL_VOCABULARY: &[(&str, &str)] = &[
    ("Rust", "Rust"),
    ("Go", "Go"),
    ("golang", "Go"),
    ("python", "Python"),
    ("java", "Java"),
    ("javascript", "JavaScript"),
    ("typescript", "TypeScript"),
    ("c++", "C++"),
    ("c#", "C#"),
    ("ruby", "Ruby"),
    ("php", "PHP"),
    ("kotlin", "Kotlin"),
    ("Swift", "Swift"),
    ("scala", "Scala"),
    ("sql", "SQL"),
    ("postgresql", "PostgreSQL"),
    ("postgres", "PostgreSQL"),
    ("mysql", "MySQL"),
    ("mongodb", "MongoDB"),
    ("redis", "Redis"),
    ("graphql", "GraphQL"),
    ("html", "HTML"),
    ("css", "CSS"),
    ("React", "React"),
    ("angular", "Angular"),
    ("vue", "Vue"),
    ("node.js", "Node.js"),
    ("nodejs", "Node.js"),
    ("express.js", "Express"),
    ("expressjs", "Express"),
    ("django", "Django"),
    ("flask", "Flask"),
    ("spring boot", "Spring"),
    ("spring framework", "Spring"),
    ("spring mvc", "Spring"),
    ("git", "Git"),
    ("docker", "Docker"),
    ("kubernetes", "Kubernetes"),
    ("k8s", "Kubernetes"),
    ("terraform", "Terraform"),
    ("aws", "AWS"),
    ("azure", "Azure"),
    ("gcp", "GCP"),
    ("linux", "Linux"),
    ("ci/cd", "CI/CD"),
    ("kafka", "Kafka"),
    ("grpc", "gRPC"),
    ("agile", "Agile"),
    ("scrum", "Scrum"),
    ("machine learning", "Machine Learning"),
    ("tensorflow", "TensorFlow"),
    ("pytorch", "PyTorch"),
];

/// Alias patterns. A skill must not be glued to letters, digits, `+` or `#`,
/// so `Go` does not match inside `Google` nor `Java` inside `JavaScript`.
static SKILL_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    SKILL_VOCABULARY
        .iter()
        .map(|(alias, display)| {
            let flags = if alias.chars().any(|c| c.is_ascii_uppercase()) {
                ""
            } else {
                "(?i)"
            };
            let pattern = format!(
                r"{flags}(?:^|[^A-Za-z0-9+#]){}(?:$|[^A-Za-z0-9+#])",
                regex::escape(alias)
            );
            (Regex::new(&pattern).expect("escaped skill alias is a valid pattern"), *display)
        })
        .collect()
});

/// Skills found in `text`, by display name, in order of first appearance.
pub fn detect_skills(text: &str) -> Vec<&'static str> {
    let mut first_seen: HashMap<&'static str, usize> = HashMap::new();
    for (pattern, display) in SKILL_PATTERNS.iter() {
        if let Some(m) = pattern.find(text) {
            let position = first_seen.entry(*display).or_insert(m.start());
            *position = (*position).min(m.start());
        }
    }

    let mut skills: Vec<(&'static str, usize)> = first_seen.into_iter().collect();
    skills.sort_by_key(|(display, position)| (*position, *display));
    skills.into_iter().map(|(display, _)| display).collect()
}

/// Deterministic vocabulary matcher. Fast, no network.
pub struct HeuristicComparator;

impl HeuristicComparator {
    pub fn compare_texts(job_description: &str, resume_text: &str) -> KeywordComparisonResult {
        let in_resume = detect_skills(resume_text);
        let (matching, missing): (Vec<&str>, Vec<&str>) = detect_skills(job_description)
            .into_iter()
            .partition(|skill| in_resume.contains(skill));

        KeywordComparisonResult::from_sets(
            matching.into_iter().map(str::to_string).collect(),
            missing.into_iter().map(str::to_string).collect(),
        )
    }
}

#[async_trait]
impl KeywordComparator for HeuristicComparator {
    fn backend(&self) -> &'static str {
        "heuristic"
    }

    async fn compare(&self, job_description: &str, resume_text: &str) -> Result<Value, ComparisonError> {
        let result = Self::compare_texts(job_description, resume_text);
        Ok(serde_json::to_value(result)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StaticBackend;
    use serde_json::json;
    use std::sync::atomic::Ordering;

    fn request(jd: &str, resume: &str) -> CompareRequest {
        CompareRequest {
            job_description: Some(jd.to_string()),
            resume_text: Some(resume.to_string()),
        }
    }

    fn llm_with(backend: StaticBackend) -> LlmComparator {
        LlmComparator::new(Some(Arc::new(backend)))
    }

    #[tokio::test]
    async fn test_empty_inputs_never_call_backend() {
        let backend = StaticBackend::with_text("{}");
        let calls = backend.call_counter();
        let comparator = llm_with(backend);

        for req in [
            request("", "Python dev"),
            request("Need Rust", "   "),
            CompareRequest::default(),
        ] {
            let err = compare_keywords(&comparator, &req).await.unwrap_err();
            assert!(matches!(err, ComparisonError::MissingInput));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_missing_input_maps_to_400() {
        let err: AppError = ComparisonError::MissingInput.into();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_unconfigured_backend_reports_error() {
        let comparator = LlmComparator::new(None);
        let err = compare_keywords(&comparator, &request("Need Rust", "Python dev"))
            .await
            .unwrap_err();
        assert!(matches!(err, ComparisonError::NotConfigured));
        assert!(matches!(AppError::from(err), AppError::Llm { raw_response: None, .. }));
    }

    #[tokio::test]
    async fn test_fenced_answer_is_returned_exactly() {
        let comparator = llm_with(StaticBackend::with_text(
            "Here you go:\n```json\n{\"matching\":[\"Python\"],\"missing\":[\"Rust\"],\"score\":50}\n```",
        ));
        let value = compare_keywords(&comparator, &request("Need Rust and Python", "Python dev"))
            .await
            .unwrap();
        assert_eq!(value, json!({"matching": ["Python"], "missing": ["Rust"], "score": 50}));
    }

    #[tokio::test]
    async fn test_model_answer_is_not_reshaped() {
        let comparator = llm_with(StaticBackend::with_text(
            r#"{"matching": [1, {"k": "v"}], "missing": [], "score": "85"}"#,
        ));
        let value = compare_keywords(&comparator, &request("a", "b")).await.unwrap();
        assert_eq!(value["score"], "85");
        assert_eq!(value["matching"][1], json!({"k": "v"}));
    }

    #[tokio::test]
    async fn test_prose_answer_keeps_raw_text_verbatim() {
        let prose = "Both candidates look like strong matches overall.";
        let comparator = llm_with(StaticBackend::with_text(prose));
        let err = compare_keywords(&comparator, &request("Need Rust", "Python dev"))
            .await
            .unwrap_err();

        match AppError::from(err) {
            AppError::Llm { message, raw_response } => {
                assert_eq!(message, "Failed to parse AI response for keyword comparison as JSON.");
                assert_eq!(raw_response.as_deref(), Some(prose));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_model_reported_error_is_a_failure() {
        let comparator = llm_with(StaticBackend::with_text(r#"{"error": "cannot compare"}"#));
        let err = compare_keywords(&comparator, &request("Need Rust", "Python dev"))
            .await
            .unwrap_err();
        assert!(matches!(&err, ComparisonError::Reported { message, .. } if message == "cannot compare"));

        match AppError::from(err) {
            AppError::Llm { message, raw_response } => {
                assert_eq!(message, "Keyword comparison failed: cannot compare");
                assert_eq!(raw_response.as_deref(), Some(r#"{"error":"cannot compare"}"#));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_blocked_prompt_is_described() {
        let comparator = llm_with(StaticBackend::new(json!({
            "promptFeedback": {"blockReason": "SAFETY"},
            "candidates": []
        })));
        let err = compare_keywords(&comparator, &request("a", "b")).await.unwrap_err();
        match AppError::from(err) {
            AppError::Llm { message, .. } => {
                assert_eq!(message, "AI response for keyword comparison was blocked: SAFETY.")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_candidates_is_described() {
        let comparator = llm_with(StaticBackend::new(json!({"candidates": []})));
        let err = compare_keywords(&comparator, &request("a", "b")).await.unwrap_err();
        match AppError::from(err) {
            AppError::Llm { message, .. } => {
                assert_eq!(message, "AI returned no candidates for keyword comparison.")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_heuristic_rust_go_scenario() {
        let value = compare_keywords(
            &HeuristicComparator,
            &request("Need Rust and Go experience", "Experienced Python and Git developer"),
        )
        .await
        .unwrap();

        let result: KeywordComparisonResult = serde_json::from_value(value).unwrap();
        assert!(result.matching.is_empty());
        assert_eq!(result.missing, vec!["Rust", "Go"]);
        assert_eq!(result.score, 0);
    }

    #[test]
    fn test_heuristic_partial_match_score() {
        let result = HeuristicComparator::compare_texts(
            "Python, Docker and AWS required; Kubernetes a plus",
            "Built Python services on AWS",
        );
        assert_eq!(result.matching, vec!["Python", "AWS"]);
        assert_eq!(result.missing, vec!["Docker", "Kubernetes"]);
        assert_eq!(result.score, 50);
    }

    #[test]
    fn test_detect_skills_respects_boundaries() {
        assert!(detect_skills("Worked at Google on Gomoku").is_empty());
        assert_eq!(detect_skills("C++ and C# with Node.js"), vec!["C++", "C#", "Node.js"]);
        assert_eq!(detect_skills("golang, Go"), vec!["Go"]);
        assert_eq!(detect_skills("JavaScript not Java"), vec!["JavaScript", "Java"]);
        assert_eq!(detect_skills("Set up CI/CD in k8s"), vec!["CI/CD", "Kubernetes"]);
    }

    #[test]
    fn test_english_uses_of_skill_words_are_ignored() {
        let result = HeuristicComparator::compare_texts(
            "Rust engineer, ready to go the extra mile; Spring hiring, swift onboarding",
            "Rust developer",
        );
        assert_eq!(result.matching, vec!["Rust"]);
        assert!(result.missing.is_empty());
        assert_eq!(result.score, 100);

        assert!(detect_skills("We react fast and the pipes rust; let's go").is_empty());
        assert_eq!(
            detect_skills("Go services, Spring Boot APIs, Swift apps"),
            vec!["Go", "Spring", "Swift"]
        );
    }

    #[test]
    fn test_heuristic_job_without_known_skills_scores_zero() {
        let result = HeuristicComparator::compare_texts("Friendly team player", "Rust developer");
        assert_eq!(result, KeywordComparisonResult::from_sets(vec![], vec![]));
    }
}
