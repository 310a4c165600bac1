// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Document store contract for per-identity call records

use async_trait::async_trait;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::quota::StoredTimestamp;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt rate limit document: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// One identity's rate limit document. Fields other than `lastCalls` are
/// kept as-is across merges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateLimitDocument {
    #[serde(rename = "lastCalls", default, deserialize_with = "lenient_calls")]
    pub last_calls: Vec<StoredTimestamp>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// `lastCalls` that is not an array (null, a lone value) reads as no calls
fn lenient_calls<'de, D>(deserializer: D) -> Result<Vec<StoredTimestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        value @ serde_json::Value::Array(_) => {
            Vec::<StoredTimestamp>::deserialize(value).map_err(D::Error::custom)
        }
        _ => Ok(Vec::new()),
    }
}

/// Read / merge-write access to stored call records.
///
/// There is no transaction across `get` and `merge`; concurrent requests
/// for one identity can both read the same state (last write wins).
#[async_trait]
pub trait CallRecordStore: Send + Sync {
    /// Stored records, or `None` when the identity has no document
    async fn get(&self, identity: &str) -> Result<Option<Vec<StoredTimestamp>>, StoreError>;

    /// Replace the identity's `lastCalls`, creating the document if needed
    async fn merge(&self, identity: &str, records: Vec<StoredTimestamp>) -> Result<(), StoreError>;
}

/// Process-local store
#[derive(Debug, Clone, Default)]
pub struct InMemoryCallRecordStore {
    documents: Arc<Mutex<HashMap<String, RateLimitDocument>>>,
    injected_error: Arc<Mutex<Option<String>>>,
}

impl InMemoryCallRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw document, bypassing `merge`
    pub async fn insert_document(&self, identity: &str, document: RateLimitDocument) {
        self.documents
            .lock()
            .await
            .insert(identity.to_string(), document);
    }

    pub async fn document(&self, identity: &str) -> Option<RateLimitDocument> {
        self.documents.lock().await.get(identity).cloned()
    }

    /// Make the next operation fail with `StoreError::Unavailable`
    pub async fn inject_error(&self, message: &str) {
        *self.injected_error.lock().await = Some(message.to_string());
    }

    async fn check_injected_error(&self) -> Result<(), StoreError> {
        match self.injected_error.lock().await.take() {
            Some(message) => Err(StoreError::Unavailable(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CallRecordStore for InMemoryCallRecordStore {
    async fn get(&self, identity: &str) -> Result<Option<Vec<StoredTimestamp>>, StoreError> {
        self.check_injected_error().await?;
        let documents = self.documents.lock().await;
        Ok(documents.get(identity).map(|doc| doc.last_calls.clone()))
    }

    async fn merge(&self, identity: &str, records: Vec<StoredTimestamp>) -> Result<(), StoreError> {
        self.check_injected_error().await?;
        let mut documents = self.documents.lock().await;
        documents.entry(identity.to_string()).or_default().last_calls = records;
        Ok(())
    }
}
