// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Wiring from configuration to a ready `AppState`.
//!
//! The process-wide state is built once and reused; concurrent first
//! callers wait on the same initialization.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::api::{AppState, NameSuggestionService};
use crate::config::{ConfigError, ProxyConfig};
use crate::generation::{GeminiClient, ModelError, ModelInvoker};
use crate::identity::{FallbackIdentityResolver, IdentityError, IdentityResolver, JwtIdentityResolver};
use crate::quota::QuotaTracker;
use crate::storage::{CallRecordStore, FileCallRecordStore, InMemoryCallRecordStore};

static SHARED_STATE: OnceCell<AppState> = OnceCell::const_new();

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Identity verifier setup failed: {0}")]
    Identity(#[from] IdentityError),

    #[error("Model client setup failed: {0}")]
    Model(#[from] ModelError),
}

impl AppState {
    pub fn from_config(config: &ProxyConfig) -> Result<Self, BootstrapError> {
        config.validate()?;

        let fallback = config.identity.fallback_identity.clone();
        let identity: Arc<dyn IdentityResolver> = match &config.identity.jwt {
            Some(settings) => {
                info!("Verifying bearer tokens as JWTs");
                Arc::new(JwtIdentityResolver::new(settings, fallback)?)
            }
            None => {
                info!("No token verifier configured, all callers share '{}'", fallback);
                Arc::new(FallbackIdentityResolver::new(fallback))
            }
        };

        let store: Arc<dyn CallRecordStore> = match &config.store_path {
            Some(path) => {
                info!("Persisting call records to {}", path.display());
                Arc::new(FileCallRecordStore::new(path.clone()))
            }
            None => Arc::new(InMemoryCallRecordStore::new()),
        };

        let model = match &config.gemini {
            Some(gemini) => {
                let client = GeminiClient::new(gemini)?;
                info!("Using model {} at {}", client.model_name(), client.endpoint());
                Some(Arc::new(client) as Arc<dyn ModelInvoker>)
            }
            None => {
                warn!("GEMINI_API_KEY not set, suggestion requests will fail");
                None
            }
        };

        let service =
            NameSuggestionService::new(identity, store, model, QuotaTracker::new(config.quota.clone()))
                .with_suggestion_count(config.suggestion_count)
                .with_max_field_chars(config.max_field_chars);

        Ok(AppState::new(service))
    }
}

/// Process-wide state, built from `config` on first use
pub async fn shared_state(config: &ProxyConfig) -> Result<&'static AppState, BootstrapError> {
    SHARED_STATE
        .get_or_try_init(|| async { AppState::from_config(config) })
        .await
}
