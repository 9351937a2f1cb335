pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::{handlers as analysis, upload::MAX_UPLOAD_BYTES};
use crate::comparison::handlers as comparison;
use crate::handoff::handlers as handoff;
use crate::state::AppState;

/// Headroom for multipart framing on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/health", get(health::health_handler))
        // Resume analysis
        .route(
            "/api/v1/resume/analyze",
            post(analysis::handle_analyze).layer(upload_limit.clone()),
        )
        .route(
            "/api/v1/resume/upload",
            post(analysis::handle_upload).layer(upload_limit),
        )
        .route(
            "/api/v1/resume/analyze-text",
            post(analysis::handle_analyze_text),
        )
        // Keyword comparison
        .route(
            "/api/v1/resume/compare-keywords",
            post(comparison::handle_compare_keywords),
        )
        // Handoff to the results view
        .route(
            "/api/v1/resume/analysis",
            get(handoff::handle_open_analysis).delete(handoff::handle_clear_analysis),
        )
        .with_state(state)
}
