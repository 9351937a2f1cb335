//! Session-scoped handoff between the upload step and the results view.
//!
//! Two keys per session, mirroring the browser-local pair the UI used:
//! `resumeAnalyzed` is a read-once flag, `resumeAnalysisResult` is the last
//! successful analysis and survives reads. Writers race last-write-wins.

pub mod handlers;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::errors::AppError;

pub const RESULT_KEY: &str = "resumeAnalysisResult";
pub const FLAG_KEY: &str = "resumeAnalyzed";

const MAX_SESSION_ID_LEN: usize = 128;

#[derive(Debug, Error)]
pub enum HandoffError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Stored analysis result is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Handoff store lock poisoned")]
    Poisoned,
}

impl From<HandoffError> for AppError {
    fn from(err: HandoffError) -> Self {
        AppError::Storage(err.to_string())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Storage backends
// ────────────────────────────────────────────────────────────────────────────

/// Minimal string key-value store. Carried as `Arc<dyn KeyValueStore>`.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, HandoffError>;
    async fn set(&self, key: &str, value: String) -> Result<(), HandoffError>;
    /// Reads and deletes `key` in one step.
    async fn take(&self, key: &str) -> Result<Option<String>, HandoffError>;
    async fn remove(&self, key: &str) -> Result<(), HandoffError>;
}

/// In-process store, used when no Redis URL is configured.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    fn with_entries<T>(&self, f: impl FnOnce(&mut HashMap<String, String>) -> T) -> Result<T, HandoffError> {
        let mut entries = self.entries.lock().map_err(|_| HandoffError::Poisoned)?;
        Ok(f(&mut entries))
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, HandoffError> {
        self.with_entries(|e| e.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), HandoffError> {
        self.with_entries(|e| {
            e.insert(key.to_string(), value);
        })
    }

    async fn take(&self, key: &str) -> Result<Option<String>, HandoffError> {
        self.with_entries(|e| e.remove(key))
    }

    async fn remove(&self, key: &str) -> Result<(), HandoffError> {
        self.with_entries(|e| {
            e.remove(key);
        })
    }
}

/// Redis-backed store. Keys expire after `ttl_secs`.
pub struct RedisStore {
    client: redis::Client,
    ttl_secs: u64,
}

impl RedisStore {
    pub fn new(client: redis::Client, ttl_secs: u64) -> Self {
        Self { client, ttl_secs }
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, HandoffError> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, HandoffError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), HandoffError> {
        let mut conn = self.connection().await?;
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<Option<String>, HandoffError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = redis::cmd("GETDEL").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn remove(&self, key: &str) -> Result<(), HandoffError> {
        let mut conn = self.connection().await?;
        let _: () = redis::cmd("DEL").arg(key).query_async(&mut conn).await?;
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handoff channel
// ────────────────────────────────────────────────────────────────────────────

/// What the results view sees when it opens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoffView {
    pub just_analyzed: bool,
    pub result: Option<Value>,
}

#[derive(Clone)]
pub struct AnalysisHandoff {
    store: Arc<dyn KeyValueStore>,
}

impl AnalysisHandoff {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::default()))
    }

    fn key(session_id: &str, name: &str) -> String {
        format!("handoff:{session_id}:{name}")
    }

    /// Stores `result` and raises the flag. The blob is written first so a
    /// reader that sees the flag also sees the result.
    pub async fn record(&self, session_id: &str, result: &Value) -> Result<(), HandoffError> {
        self.store
            .set(&Self::key(session_id, RESULT_KEY), serde_json::to_string(result)?)
            .await?;
        self.store
            .set(&Self::key(session_id, FLAG_KEY), "true".to_string())
            .await?;
        debug!("Recorded analysis handoff for session {session_id}");
        Ok(())
    }

    /// Consumes the flag and returns the stored result, which stays in place.
    pub async fn open(&self, session_id: &str) -> Result<HandoffView, HandoffError> {
        let flag = self.store.take(&Self::key(session_id, FLAG_KEY)).await?;
        let result = self
            .store
            .get(&Self::key(session_id, RESULT_KEY))
            .await?
            .map(|raw| serde_json::from_str(&raw))
            .transpose()?;

        Ok(HandoffView {
            just_analyzed: flag.as_deref() == Some("true"),
            result,
        })
    }

    /// Drops both keys, e.g. when the user removes the staged file.
    pub async fn clear(&self, session_id: &str) -> Result<(), HandoffError> {
        self.store.remove(&Self::key(session_id, FLAG_KEY)).await?;
        self.store.remove(&Self::key(session_id, RESULT_KEY)).await?;
        debug!("Cleared analysis handoff for session {session_id}");
        Ok(())
    }
}

/// Session ids become part of store keys, so only a safe alphabet is allowed.
pub fn validate_session_id(session_id: &str) -> Result<&str, AppError> {
    let valid = !session_id.is_empty()
        && session_id.len() <= MAX_SESSION_ID_LEN
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(session_id)
    } else {
        Err(AppError::Validation(
            "session_id must be 1-128 characters of letters, digits, '-' or '_'".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_flag_is_read_once_and_result_persists() {
        let handoff = AnalysisHandoff::in_memory();
        handoff.record("abc", &json!({"score": 78})).await.unwrap();

        let first = handoff.open("abc").await.unwrap();
        assert!(first.just_analyzed);
        assert_eq!(first.result, Some(json!({"score": 78})));

        let second = handoff.open("abc").await.unwrap();
        assert!(!second.just_analyzed);
        assert_eq!(second.result, Some(json!({"score": 78})));
    }

    #[tokio::test]
    async fn test_empty_session_has_nothing() {
        let handoff = AnalysisHandoff::in_memory();
        let view = handoff.open("nobody").await.unwrap();
        assert_eq!(
            view,
            HandoffView {
                just_analyzed: false,
                result: None
            }
        );
    }

    #[tokio::test]
    async fn test_new_record_overwrites_previous() {
        let handoff = AnalysisHandoff::in_memory();
        handoff.record("abc", &json!({"score": 50})).await.unwrap();
        handoff.record("abc", &json!({"score": 90})).await.unwrap();
        assert_eq!(handoff.open("abc").await.unwrap().result, Some(json!({"score": 90})));
    }

    #[tokio::test]
    async fn test_clear_removes_flag_and_result() {
        let handoff = AnalysisHandoff::in_memory();
        handoff.record("abc", &json!({"score": 50})).await.unwrap();
        handoff.clear("abc").await.unwrap();

        let view = handoff.open("abc").await.unwrap();
        assert!(!view.just_analyzed);
        assert!(view.result.is_none());
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let handoff = AnalysisHandoff::in_memory();
        handoff.record("one", &json!({"score": 1})).await.unwrap();
        assert!(handoff.open("two").await.unwrap().result.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_blob_is_a_storage_error() {
        let store = Arc::new(MemoryStore::default());
        store
            .set("handoff:abc:resumeAnalysisResult", "{not json".to_string())
            .await
            .unwrap();
        let handoff = AnalysisHandoff::new(store);
        assert!(matches!(
            handoff.open("abc").await.unwrap_err(),
            HandoffError::Corrupt(_)
        ));
    }

    #[test]
    fn test_session_id_alphabet() {
        assert!(validate_session_id("3f2a-b_9").is_ok());
        assert!(validate_session_id("").is_err());
        assert!(validate_session_id("a:b").is_err());
        assert!(validate_session_id(&"x".repeat(129)).is_err());
    }
}
