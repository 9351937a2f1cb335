use serde::{Deserialize, Serialize};

/// Body of `POST /api/v1/resume/compare-keywords`. Both fields are optional on
/// the wire so a missing field is reported the same way as an empty one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareRequest {
    #[serde(default)]
    pub job_description: Option<String>,
    #[serde(default)]
    pub resume_text: Option<String>,
}

/// Keyword comparison as computed by the heuristic scorer. The generative
/// scorer's answer is returned as parsed and may carry extra keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordComparisonResult {
    pub matching: Vec<String>,
    pub missing: Vec<String>,
    pub score: u32,
}

impl KeywordComparisonResult {
    /// Builds a result whose score is `matching / (matching + missing) * 100`,
    /// rounded down, or 0 when both sets are empty.
    pub fn from_sets(matching: Vec<String>, missing: Vec<String>) -> Self {
        let total = matching.len() + missing.len();
        let score = if total == 0 {
            0
        } else {
            (matching.len() * 100 / total) as u32
        };
        Self {
            matching,
            missing,
            score,
        }
    }
}
