//! Shared fixtures for unit and router tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use serde_json::{json, Value};

use crate::llm_client::{GenerateContentResponse, GenerativeBackend, LlmError};

pub const BOUNDARY: &str = "----resume-api-test-boundary";

/// Serves `app` on an ephemeral local port and returns its address.
pub async fn spawn_server(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Builds a single-part `multipart/form-data` body.
pub fn multipart_body(field: &str, file_name: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(data.len() + 256);
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

/// Generative backend double that replays one canned response and counts calls.
pub struct StaticBackend {
    response: Value,
    calls: Arc<AtomicUsize>,
}

impl StaticBackend {
    pub fn new(response: Value) -> Self {
        Self {
            response,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A single candidate whose only part is `text`.
    pub fn with_text(text: &str) -> Self {
        Self::new(json!({
            "candidates": [{"content": {"parts": [{"text": text}]}}]
        }))
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl GenerativeBackend for StaticBackend {
    async fn generate(&self, _prompt: &str) -> Result<GenerateContentResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(serde_json::from_value(self.response.clone()).unwrap())
    }
}
