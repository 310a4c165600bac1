// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! JSON file backed call record store
//!
//! All identities live in one JSON object keyed by identity. Writes go to a
//! sibling temp file and are renamed into place.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::call_record_store::{CallRecordStore, RateLimitDocument, StoreError};
use crate::quota::StoredTimestamp;

/// Raw documents keyed by identity. Each one is decoded on its own so a
/// malformed entry only affects that identity.
type Documents = Map<String, Value>;

fn decode(identity: &str, raw: &Value) -> RateLimitDocument {
    match serde_json::from_value(raw.clone()) {
        Ok(document) => document,
        Err(e) => {
            warn!("Unreadable rate limit document for {}: {}", identity, e);
            RateLimitDocument::default()
        }
    }
}

pub struct FileCallRecordStore {
    path: PathBuf,
    // Serializes read-modify-write of the file within this process
    lock: Mutex<()>,
}

impl FileCallRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        info!("Call record store at {}", path.display());
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Documents, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Documents::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Documents::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, documents: &Documents) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let bytes = serde_json::to_vec_pretty(documents)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl CallRecordStore for FileCallRecordStore {
    async fn get(&self, identity: &str) -> Result<Option<Vec<StoredTimestamp>>, StoreError> {
        let _guard = self.lock.lock().await;
        let documents = self.load().await?;
        Ok(documents
            .get(identity)
            .map(|raw| decode(identity, raw).last_calls))
    }

    async fn merge(&self, identity: &str, records: Vec<StoredTimestamp>) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut documents = self.load().await?;
        debug!("Writing {} call records for {}", records.len(), identity);
        let mut document = documents
            .get(identity)
            .map(|raw| decode(identity, raw))
            .unwrap_or_default();
        document.last_calls = records;
        documents.insert(identity.to_string(), serde_json::to_value(document)?);
        self.save(&documents).await
    }
}
