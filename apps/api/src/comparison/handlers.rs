//! Axum route handlers for the Keyword Comparison API.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::Value;
use tracing::error;

use crate::comparison::comparator::{compare_keywords, ComparisonError};
use crate::comparison::models::CompareRequest;
use crate::errors::AppError;
use crate::state::AppState;

/// POST /api/v1/resume/compare-keywords
///
/// Body: `{jobDescription, resumeText}`. Returns the active comparator's
/// answer, 400 for missing input and 500 for generation failures.
pub async fn handle_compare_keywords(
    State(state): State<AppState>,
    request: Result<Json<CompareRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(request) = request.map_err(|e| {
        AppError::Validation(format!(
            "Invalid JSON payload received. Please check the request body. ({})",
            e.body_text()
        ))
    })?;

    let value = compare_keywords(state.comparator.as_ref(), &request)
        .await
        .map_err(|e| {
            if !matches!(e, ComparisonError::MissingInput) {
                error!("Keyword comparison failed: {e}");
            }
            AppError::from(e)
        })?;

    Ok(Json(value))
}
