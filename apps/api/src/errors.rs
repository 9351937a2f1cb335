use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    MissingFile(String),

    #[error("{0}")]
    InvalidType(String),

    #[error("{0}")]
    TooLarge(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    NotConfigured(String),

    /// The analysis service failed. `status` mirrors the upstream status, or
    /// 500 when no usable upstream response exists.
    #[error("{message}")]
    Upstream {
        status: StatusCode,
        message: String,
        details: Value,
    },

    #[error("{message}")]
    Llm {
        message: String,
        raw_response: Option<String>,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingFile(_) | AppError::InvalidType(_) | AppError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Upstream { status, .. } => *status,
            AppError::Llm { .. } | AppError::Storage(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::MissingFile(_) => "MISSING_FILE",
            AppError::InvalidType(_) => "INVALID_TYPE",
            AppError::TooLarge(_) => "TOO_LARGE",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotConfigured(_) => "NOT_CONFIGURED",
            AppError::Upstream { .. } => "UPSTREAM_ERROR",
            AppError::Llm { .. } => "LLM_ERROR",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let body = match &self {
            AppError::Upstream {
                message, details, ..
            } => {
                tracing::error!("Upstream error ({status}): {message}");
                json!({ "error": message, "code": code, "details": details })
            }
            AppError::Llm {
                message,
                raw_response,
            } => {
                tracing::error!("LLM error: {message}");
                match raw_response {
                    Some(raw) => json!({ "error": message, "code": code, "rawResponse": raw }),
                    None => json!({ "error": message, "code": code }),
                }
            }
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {msg}");
                json!({ "error": "A storage error occurred", "code": code })
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                json!({ "error": "An internal server error occurred", "code": code })
            }
            other => json!({ "error": other.to_string(), "code": code }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_client_errors_carry_code_and_message() {
        let (status, body) = body_of(AppError::InvalidType("bad type".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_TYPE");
        assert_eq!(body["error"], "bad type");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_upstream_error_mirrors_status_and_details() {
        let (status, body) = body_of(AppError::Upstream {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "Analysis service failed: unreadable pdf".into(),
            details: json!({ "kind": "rejected" }),
        })
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["details"]["kind"], "rejected");
    }

    #[tokio::test]
    async fn test_llm_error_preserves_raw_response() {
        let (status, body) = body_of(AppError::Llm {
            message: "unparseable".into(),
            raw_response: Some("just prose".into()),
        })
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["rawResponse"], "just prose");
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let (_, body) = body_of(AppError::Internal(anyhow::anyhow!("secret path"))).await;
        assert_eq!(body["error"], "An internal server error occurred");
    }
}
