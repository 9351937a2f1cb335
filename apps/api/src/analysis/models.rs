//! The resume analysis result contract shared by the analysis service, the
//! text analyzer and the handoff channel.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Number of characters of resume text kept in `raw_text_preview`.
pub const PREVIEW_CHARS: usize = 800;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordSets {
    #[serde(default)]
    pub present: Vec<String>,
    #[serde(default)]
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummarySection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clarity: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub achievement_focus: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantifiable_results: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillsSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeSections {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<SummarySection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<ExperienceSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<SkillsSection>,
    /// Sections the UI does not render (education, projects, ...).
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// A scored, suggestion-annotated resume.
///
/// Either a success record (`score` present, `error` absent) or a failure
/// record (`error` present). Check `error` before trusting the numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeAnalysisResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_quality: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ats_compatibility: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword_optimization: Option<u32>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub keywords: KeywordSets,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sections: Option<ResumeSections>,
    #[serde(rename = "raw_text_preview", skip_serializing_if = "Option::is_none")]
    pub raw_text_preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResumeAnalysisResult {
    /// Checks the success-record invariants, returning the first violation.
    pub fn check(&self) -> Result<(), String> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        if self.score.is_none() {
            return Err("analysis result has no score".to_string());
        }

        let scores = [
            ("score", self.score),
            ("contentQuality", self.content_quality),
            ("atsCompatibility", self.ats_compatibility),
            ("keywordOptimization", self.keyword_optimization),
        ];
        for (name, value) in scores {
            if let Some(v) = value {
                if v > 100 {
                    return Err(format!("{name} {v} is outside 0-100"));
                }
            }
        }

        if let Some(sections) = &self.sections {
            let sub_scores = [
                sections
                    .summary
                    .as_ref()
                    .map(|s| [s.clarity.as_ref(), s.impact.as_ref()]),
                sections
                    .experience
                    .as_ref()
                    .map(|s| [s.achievement_focus.as_ref(), s.quantifiable_results.as_ref()]),
                sections
                    .skills
                    .as_ref()
                    .map(|s| [s.relevance.as_ref(), s.organization.as_ref()]),
            ];
            for n in sub_scores.iter().flatten().flatten().flatten() {
                let v = n.as_f64().unwrap_or(f64::NAN);
                if !(0.0..=10.0).contains(&v) {
                    return Err(format!("section sub-score {v} is outside 0-10"));
                }
            }
        }

        Ok(())
    }
}

/// How a caller should treat an analysis payload.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Success(ResumeAnalysisResult),
    Failure {
        error: String,
        raw_response: Option<String>,
    },
}

impl AnalysisOutcome {
    /// Classifies an arbitrary JSON payload. Never fails: payloads that do not
    /// fit the contract become `Failure` with the raw JSON attached.
    pub fn classify(value: &Value) -> Self {
        if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
            let error = error
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return AnalysisOutcome::Failure {
                error,
                raw_response: None,
            };
        }

        let parsed = match serde_json::from_value::<ResumeAnalysisResult>(value.clone()) {
            Ok(parsed) => parsed,
            Err(e) => {
                return AnalysisOutcome::Failure {
                    error: format!("Analysis result has an unexpected shape: {e}"),
                    raw_response: Some(value.to_string()),
                }
            }
        };

        match parsed.check() {
            Ok(()) => AnalysisOutcome::Success(parsed),
            Err(error) => AnalysisOutcome::Failure {
                error,
                raw_response: Some(value.to_string()),
            },
        }
    }
}

/// The first `PREVIEW_CHARS` characters of `text`, with `...` appended when cut.
pub fn preview_text(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
