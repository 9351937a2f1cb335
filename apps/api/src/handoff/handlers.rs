//! Axum route handlers for the analysis handoff.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::handoff::{validate_session_id, HandoffView};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub session_id: Option<String>,
}

impl SessionQuery {
    fn require(&self) -> Result<&str, AppError> {
        let session_id = self
            .session_id
            .as_deref()
            .ok_or_else(|| AppError::Validation("session_id is required".to_string()))?;
        validate_session_id(session_id)
    }
}

/// GET /api/v1/resume/analysis?session_id=
///
/// Returns the last stored result for the session and consumes the
/// just-analyzed flag.
pub async fn handle_open_analysis(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<HandoffView>, AppError> {
    let session_id = query.require()?;
    let view = state.handoff.open(session_id).await?;
    Ok(Json(view))
}

/// DELETE /api/v1/resume/analysis?session_id=
pub async fn handle_clear_analysis(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Result<StatusCode, AppError> {
    let session_id = query.require()?;
    state.handoff.clear(session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
