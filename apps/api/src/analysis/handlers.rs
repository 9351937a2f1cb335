//! Axum route handlers for the Resume Analysis API.

use axum::{
    extract::{
        multipart::{Multipart, MultipartRejection},
        rejection::JsonRejection,
        Query, State,
    },
    Json,
};
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::analysis::models::AnalysisOutcome;
use crate::analysis::text_analyzer::analyze_resume_text;
use crate::analysis::upload::{read_file_field, validate_upload, ResumeUpload};
use crate::errors::AppError;
use crate::handoff::validate_session_id;
use crate::llm_client::excerpt;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AnalyzeQuery {
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeTextRequest {
    #[serde(default)]
    pub resume_text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub success: bool,
    pub file_id: Uuid,
    pub file_name: String,
    pub message: String,
    pub received_at: DateTime<Utc>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resume/analyze
///
/// Validates the `file` part and forwards it to the analysis service. The
/// upstream JSON is returned unchanged. With `?session_id=`, a successful
/// result is also recorded in the handoff channel.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Query(query): Query<AnalyzeQuery>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, AppError> {
    let session_id = query.session_id.as_deref().map(validate_session_id).transpose()?;
    let upload = receive_upload(multipart).await?;

    let forwarder = state.forwarder.as_ref().ok_or_else(|| {
        warn!("Analyze request refused: ANALYSIS_SERVICE_URL is not set");
        AppError::NotConfigured("Resume analysis service is not configured".to_string())
    })?;

    let value = forwarder.forward(&upload).await?;

    match AnalysisOutcome::classify(&value) {
        AnalysisOutcome::Success(result) => {
            info!("Analysis succeeded for '{}' (score {:?})", upload.file_name, result.score);
            if let Some(session_id) = session_id {
                if let Err(e) = state.handoff.record(session_id, &value).await {
                    error!("Failed to record analysis handoff for session {session_id}: {e}");
                }
            }
        }
        AnalysisOutcome::Failure {
            error,
            raw_response,
        } => {
            warn!("Analysis service reported a failure for '{}': {error}", upload.file_name);
            if let Some(raw) = raw_response {
                debug!("Unaccepted analysis payload: {}", excerpt(&raw, 200));
            }
        }
    }

    Ok(Json(value))
}

/// POST /api/v1/resume/upload
///
/// Staging-only upload. Runs the same validation as `/analyze` and returns a
/// receipt. The file is neither analysed nor stored.
pub async fn handle_upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadReceipt>, AppError> {
    let upload = receive_upload(multipart).await?;

    let file_id = Uuid::new_v4();
    let file_name = format!("{file_id}-{}", sanitize_file_name(&upload.file_name));
    info!("Staged '{}' as {file_name} ({} bytes)", upload.file_name, upload.size());

    Ok(Json(UploadReceipt {
        success: true,
        file_id,
        file_name,
        message: "File received. This route does not perform analysis.".to_string(),
        received_at: Utc::now(),
    }))
}

/// POST /api/v1/resume/analyze-text
///
/// Generative analysis of plain resume text.
pub async fn handle_analyze_text(
    State(state): State<AppState>,
    request: Result<Json<AnalyzeTextRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(request) =
        request.map_err(|e| AppError::Validation(format!("Invalid request body: {}", e.body_text())))?;
    let resume_text = request.resume_text.unwrap_or_default();

    let value = analyze_resume_text(state.generator.as_deref(), &resume_text).await?;
    Ok(Json(value))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn receive_upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ResumeUpload, AppError> {
    let mut multipart = multipart.map_err(|e| {
        warn!("Upload rejected: not a multipart body ({})", e.body_text());
        AppError::MissingFile("No resume file provided".to_string())
    })?;
    let raw = read_file_field(&mut multipart).await?;
    validate_upload(raw)
}

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Replaces each whitespace run, leading and trailing ones included, with `_`.
fn sanitize_file_name(name: &str) -> String {
    WHITESPACE_RUN.replace_all(name, "_").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name_collapses_whitespace() {
        assert_eq!(sanitize_file_name("My  Resume final.pdf"), "My_Resume_final.pdf");
        assert_eq!(sanitize_file_name("cv.pdf"), "cv.pdf");
        assert_eq!(sanitize_file_name(" cv\t.pdf "), "_cv_.pdf_");
    }
}
