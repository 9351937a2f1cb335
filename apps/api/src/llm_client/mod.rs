//! LLM Client: the single point of entry for all generative-text calls.
//!
//! No other module talks to the Gemini API directly; callers go through
//! `GenerativeBackend` so tests can substitute a double.
//!
//! Every call is a one-shot, single-turn request. There is no retry loop:
//! the features built on top are user-initiated and cheap to re-trigger.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::errors::AppError;

pub mod prompts;

const MAX_OUTPUT_TOKENS: u32 = 2048;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("AI response was blocked: {0}")]
    Blocked(String),

    #[error("AI returned no candidates")]
    NoCandidates,

    #[error("AI returned a candidate with no text")]
    EmptyContent,

    #[error("Failed to parse AI response as JSON")]
    Unparseable { raw_response: String },
}

impl LlmError {
    /// HTTP-facing error naming the feature that failed.
    pub fn into_app_error(self, feature: &str) -> AppError {
        let (message, raw_response) = match self {
            LlmError::Blocked(reason) => {
                (format!("AI response for {feature} was blocked: {reason}."), None)
            }
            LlmError::NoCandidates => (format!("AI returned no candidates for {feature}."), None),
            LlmError::EmptyContent => (format!("AI returned an empty answer for {feature}."), None),
            LlmError::Unparseable { raw_response } => (
                format!("Failed to parse AI response for {feature} as JSON."),
                Some(raw_response),
            ),
            other => (
                format!("Sorry, an error occurred during {feature}. Details: {other}"),
                None,
            ),
        };
        AppError::Llm {
            message,
            raw_response,
        }
    }
}

/// Message returned when no generative credential is configured.
pub const NOT_CONFIGURED_MESSAGE: &str =
    "Generative AI backend is not configured. Please check the GEMINI_API_KEY setting.";

// ────────────────────────────────────────────────────────────────────────────
// Wire types (Gemini generateContent)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    pub prompt_token_count: Option<u32>,
    pub candidates_token_count: Option<u32>,
}

impl GenerateContentResponse {
    /// The reason the backend refused the prompt, if it did.
    pub fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
    }

    /// Concatenated text parts of the first candidate.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Backend trait + Gemini implementation
// ────────────────────────────────────────────────────────────────────────────

/// A generative-text backend. Carried in `AppState` as `Arc<dyn GenerativeBackend>`.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<GenerateContentResponse, LlmError>;
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, api_base: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build Gemini HTTP client")?;

        Ok(Self {
            client,
            api_key,
            model,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl GenerativeBackend for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<GenerateContentResponse, LlmError> {
        let url = format!("{}/models/{}:generateContent", self.api_base, self.model);
        let request_body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Gemini API returned {}: {}", status, body);
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;

        if let Some(usage) = &parsed.usage_metadata {
            debug!(
                "Gemini call succeeded: prompt_tokens={:?}, candidate_tokens={:?}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        Ok(parsed)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Structured output helpers
// ────────────────────────────────────────────────────────────────────────────

/// Calls the backend and extracts a JSON value from its free-form answer.
///
/// Blocked prompts and empty candidate lists are reported before any parsing
/// is attempted. Unparseable answers keep the raw text in the error.
pub async fn generate_json(backend: &dyn GenerativeBackend, prompt: &str) -> Result<Value, LlmError> {
    let response = backend.generate(prompt).await?;

    if let Some(reason) = response.block_reason() {
        warn!("Generative backend blocked the prompt: {reason}");
        return Err(LlmError::Blocked(reason.to_string()));
    }
    if response.candidates.is_empty() {
        warn!("Generative backend returned no candidates");
        return Err(LlmError::NoCandidates);
    }

    let Some(text) = response.text() else {
        let finish_reason = response.candidates[0].finish_reason.as_deref().unwrap_or("unknown");
        warn!("Generative backend returned an empty candidate (finish reason: {finish_reason})");
        return Err(LlmError::EmptyContent);
    };
    debug!("Raw model answer: {}", excerpt(&text, 200));

    extract_json(&text).ok_or(LlmError::Unparseable { raw_response: text })
}

/// Tolerant JSON extraction from model output.
///
/// Tries, in order: each fenced code block, the outermost `{ ... }` span,
/// and finally the whole text.
pub fn extract_json(text: &str) -> Option<Value> {
    for block in fenced_blocks(text) {
        if let Ok(value) = serde_json::from_str(block) {
            return Some(value);
        }
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str(&text[start..=end]) {
                return Some(value);
            }
        }
    }

    serde_json::from_str(text.trim()).ok()
}

/// Bodies of ```` ``` ```` fenced blocks, language tag line removed.
fn fenced_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find("```") {
        let after_open = &rest[open + 3..];
        let Some(close) = after_open.find("```") else {
            break;
        };
        let block = &after_open[..close];
        let body = match block.find('\n') {
            Some(nl) if !block[..nl].contains(['{', '[']) => &block[nl + 1..],
            _ => block,
        };
        blocks.push(body.trim());
        rest = &after_open[close + 3..];
    }

    blocks
}

/// First `max_chars` characters of `text`, for logging.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
