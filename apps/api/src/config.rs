use anyhow::{bail, Context, Result};

const DEFAULT_UPLOAD_FIELD: &str = "resume";
const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro";
const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Which keyword comparator is authoritative for this deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScorerBackend {
    /// Model-estimated score from the generative backend.
    Llm,
    /// Deterministic vocabulary match, `matching / (matching + missing) * 100`.
    Heuristic,
}

impl ScorerBackend {
    fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "llm" => Ok(ScorerBackend::Llm),
            "heuristic" => Ok(ScorerBackend::Heuristic),
            other => bail!("KEYWORD_SCORER must be 'llm' or 'heuristic', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
///
/// Upstream addresses and credentials are optional: when absent the
/// corresponding routes answer with an explicit error instead of the
/// process refusing to start.
#[derive(Debug, Clone)]
pub struct Config {
    pub analysis_service_url: Option<String>,
    pub analysis_upload_field: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_api_base: String,
    pub keyword_scorer: ScorerBackend,
    pub redis_url: Option<String>,
    pub handoff_ttl_secs: u64,
    pub upstream_timeout_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            analysis_service_url: optional("ANALYSIS_SERVICE_URL"),
            analysis_upload_field: optional("ANALYSIS_UPLOAD_FIELD")
                .unwrap_or_else(|| DEFAULT_UPLOAD_FIELD.to_string()),
            gemini_api_key: optional("GEMINI_API_KEY"),
            gemini_model: optional("GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_api_base: optional("GEMINI_API_BASE")
                .unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string()),
            keyword_scorer: optional("KEYWORD_SCORER")
                .map(|v| ScorerBackend::parse(&v))
                .transpose()?
                .unwrap_or(ScorerBackend::Llm),
            redis_url: optional("REDIS_URL"),
            handoff_ttl_secs: parse_or("HANDOFF_TTL_SECS", optional("HANDOFF_TTL_SECS"), 86_400)?,
            upstream_timeout_secs: parse_or(
                "UPSTREAM_TIMEOUT_SECS",
                optional("UPSTREAM_TIMEOUT_SECS"),
                120,
            )?,
            port: optional("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_or(key: &str, raw: Option<String>, default: u64) -> Result<u64> {
    match raw {
        Some(v) => v
            .trim()
            .parse::<u64>()
            .with_context(|| format!("{key} must be a whole number of seconds")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert!(config.analysis_service_url.is_none());
        assert!(config.gemini_api_key.is_none());
        assert!(config.redis_url.is_none());
        assert_eq!(config.analysis_upload_field, "resume");
        assert_eq!(config.gemini_model, "gemini-1.5-pro");
        assert_eq!(config.keyword_scorer, ScorerBackend::Llm);
        assert_eq!(config.handoff_ttl_secs, 86_400);
        assert_eq!(config.upstream_timeout_secs, 120);
        assert_eq!(config.port, 8080);
        assert_eq!(config.rust_log, "info");
    }

    #[test]
    fn test_blank_values_count_as_unset() {
        let config = config_from(&[("GEMINI_API_KEY", "  "), ("ANALYSIS_SERVICE_URL", "")]).unwrap();
        assert!(config.gemini_api_key.is_none());
        assert!(config.analysis_service_url.is_none());
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = config_from(&[
            ("ANALYSIS_SERVICE_URL", "http://analyzer:5001/analyze_resume"),
            ("ANALYSIS_UPLOAD_FIELD", "file"),
            ("KEYWORD_SCORER", "Heuristic"),
            ("PORT", "9000"),
        ])
        .unwrap();
        assert_eq!(
            config.analysis_service_url.as_deref(),
            Some("http://analyzer:5001/analyze_resume")
        );
        assert_eq!(config.analysis_upload_field, "file");
        assert_eq!(config.keyword_scorer, ScorerBackend::Heuristic);
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        assert!(config_from(&[("PORT", "not-a-port")]).is_err());
    }

    #[test]
    fn test_unknown_scorer_is_rejected() {
        let err = config_from(&[("KEYWORD_SCORER", "embedding")]).unwrap_err();
        assert!(err.to_string().contains("KEYWORD_SCORER"));
    }
}
