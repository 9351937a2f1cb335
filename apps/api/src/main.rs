mod analysis;
mod comparison;
mod config;
mod errors;
mod handoff;
mod llm_client;
mod routes;
mod state;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::forwarder::AnalysisForwarder;
use crate::comparison::comparator::{HeuristicComparator, KeywordComparator, LlmComparator};
use crate::config::{Config, ScorerBackend};
use crate::handoff::{AnalysisHandoff, RedisStore};
use crate::llm_client::{GeminiClient, GenerativeBackend};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails only on malformed values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log,
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume API v{}", env!("CARGO_PKG_VERSION"));

    let timeout = Duration::from_secs(config.upstream_timeout_secs);

    // Analysis service forwarder
    let forwarder = match &config.analysis_service_url {
        Some(url) => {
            let forwarder =
                AnalysisForwarder::new(url.clone(), config.analysis_upload_field.clone(), timeout)?;
            info!(
                "Analysis service: {} (field '{}')",
                forwarder.endpoint(),
                config.analysis_upload_field
            );
            Some(forwarder)
        }
        None => {
            warn!("ANALYSIS_SERVICE_URL not set; /api/v1/resume/analyze will answer 503");
            None
        }
    };

    // Generative backend
    let generator: Option<Arc<dyn GenerativeBackend>> = match &config.gemini_api_key {
        Some(key) => {
            let client = GeminiClient::new(
                key.clone(),
                config.gemini_model.clone(),
                config.gemini_api_base.clone(),
                timeout,
            )?;
            info!("Gemini client initialized (model: {})", client.model());
            Some(Arc::new(client))
        }
        None => {
            warn!("GEMINI_API_KEY not set; generative features will report an error");
            None
        }
    };

    // Keyword comparator (exactly one backend is authoritative)
    let comparator: Arc<dyn KeywordComparator> = match config.keyword_scorer {
        ScorerBackend::Llm => Arc::new(LlmComparator::new(generator.clone())),
        ScorerBackend::Heuristic => Arc::new(HeuristicComparator),
    };
    info!("Keyword comparator: {}", comparator.backend());

    // Handoff store: Redis when configured, otherwise in-process
    let handoff = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str())?;
            info!("Redis handoff store initialized (ttl {}s)", config.handoff_ttl_secs);
            AnalysisHandoff::new(Arc::new(RedisStore::new(client, config.handoff_ttl_secs)))
        }
        None => {
            warn!("REDIS_URL not set; analysis handoff kept in memory");
            AnalysisHandoff::in_memory()
        }
    };

    // Build app state
    let state = AppState {
        forwarder,
        generator,
        comparator,
        handoff,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web frontend's host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
