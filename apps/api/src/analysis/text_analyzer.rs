//! Generative resume analysis from plain text.

use serde_json::Value;
use tracing::info;

use crate::analysis::models::preview_text;
use crate::analysis::prompts::build_resume_analysis_prompt;
use crate::errors::AppError;
use crate::llm_client::{excerpt, generate_json, GenerativeBackend, NOT_CONFIGURED_MESSAGE};

/// Asks the backend for a full analysis of `resume_text`.
///
/// The parsed model answer is returned as-is, except that a missing
/// `raw_text_preview` is filled from the input so the result can later feed
/// the keyword comparator.
pub async fn analyze_resume_text(
    backend: Option<&dyn GenerativeBackend>,
    resume_text: &str,
) -> Result<Value, AppError> {
    if resume_text.trim().is_empty() {
        return Err(AppError::Validation("Resume text is required.".to_string()));
    }
    let backend = backend.ok_or_else(|| AppError::Llm {
        message: NOT_CONFIGURED_MESSAGE.to_string(),
        raw_response: None,
    })?;

    info!("Analyzing resume text: {}", excerpt(resume_text, 50));

    let prompt = build_resume_analysis_prompt(resume_text);
    let mut value = generate_json(backend, &prompt)
        .await
        .map_err(|e| e.into_app_error("resume analysis"))?;

    if let Some(object) = value.as_object_mut() {
        object
            .entry("raw_text_preview")
            .or_insert_with(|| Value::String(preview_text(resume_text)));
    }

    Ok(value)
}
