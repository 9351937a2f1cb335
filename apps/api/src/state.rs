use std::sync::Arc;

use crate::analysis::forwarder::AnalysisForwarder;
use crate::comparison::comparator::KeywordComparator;
use crate::handoff::AnalysisHandoff;
use crate::llm_client::GenerativeBackend;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// `None` when ANALYSIS_SERVICE_URL is unset; `/analyze` then answers 503.
    pub forwarder: Option<AnalysisForwarder>,
    /// `None` when GEMINI_API_KEY is unset.
    pub generator: Option<Arc<dyn GenerativeBackend>>,
    /// The single authoritative comparator, chosen via KEYWORD_SCORER.
    pub comparator: Arc<dyn KeywordComparator>,
    pub handoff: AnalysisHandoff,
}
