//! Forwards a validated resume to the external analysis service.
//!
//! One attempt per request. The upstream JSON body is returned untouched.

use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::StatusCode;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, info};

use crate::analysis::upload::ResumeUpload;
use crate::errors::AppError;
use crate::llm_client::excerpt;

/// Characters of an upstream body kept in error details.
const BODY_EXCERPT_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("Failed to build analysis request: {0}")]
    Build(#[source] reqwest::Error),

    #[error("Analysis service is unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    #[error("Analysis service rejected the resume (status {status}): {message}")]
    Rejected {
        status: u16,
        message: String,
        body: String,
    },

    #[error("Analysis service returned a non-JSON body (status {status})")]
    Malformed { status: u16, body: String },
}

impl From<ForwardError> for AppError {
    fn from(err: ForwardError) -> Self {
        match err {
            ForwardError::Build(e) => AppError::Upstream {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "Failed to prepare the analysis request".to_string(),
                details: json!({ "kind": "request", "message": e.to_string() }),
            },
            ForwardError::Unreachable(e) => AppError::Upstream {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "Analysis service is unreachable".to_string(),
                details: json!({ "kind": "unreachable", "message": e.to_string() }),
            },
            ForwardError::Rejected {
                status,
                message,
                body,
            } => AppError::Upstream {
                status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                message: format!("Analysis service failed: {message}"),
                details: json!({
                    "kind": "rejected",
                    "upstreamStatus": status,
                    "excerpt": excerpt(&body, BODY_EXCERPT_CHARS),
                }),
            },
            ForwardError::Malformed { status, body } => AppError::Upstream {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "Received malformed analysis data from the processing service"
                    .to_string(),
                details: json!({
                    "kind": "malformed",
                    "upstreamStatus": status,
                    "excerpt": excerpt(&body, BODY_EXCERPT_CHARS),
                }),
            },
        }
    }
}

#[derive(Clone)]
pub struct AnalysisForwarder {
    client: Client,
    endpoint: String,
    field_name: String,
}

impl AnalysisForwarder {
    pub fn new(endpoint: String, field_name: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build analysis service HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            field_name,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn forward(&self, upload: &ResumeUpload) -> Result<Value, ForwardError> {
        let part = Part::stream_with_length(upload.data.clone(), upload.size() as u64)
            .file_name(upload.file_name.clone())
            .mime_str(upload.content_type)
            .map_err(ForwardError::Build)?;
        let form = Form::new().part(self.field_name.clone(), part);

        info!(
            "Forwarding '{}' ({} bytes) to analysis service at {}",
            upload.file_name,
            upload.size(),
            self.endpoint
        );

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!("Analysis service unreachable: {e}");
                ForwardError::Unreachable(e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(ForwardError::Unreachable)?;

        if !status.is_success() {
            error!("Analysis service returned {status}: {}", excerpt(&body, 200));
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown error")
                        .to_string()
                });
            return Err(ForwardError::Rejected {
                status: status.as_u16(),
                message,
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            error!("Analysis service body is not JSON ({e}): {}", excerpt(&body, 200));
            ForwardError::Malformed {
                status: status.as_u16(),
                body,
            }
        })
    }
}
