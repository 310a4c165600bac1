// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Request pipeline: identity, quota, prompt, model, extraction

use chrono::{DateTime, Local, TimeZone};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::errors::{ApiError, MISSING_API_KEY_MESSAGE};
use super::handlers::{SuggestNamesRequest, SuggestNamesResponse};
use crate::extraction::ResponseExtractor;
use crate::generation::{build_prompt, ModelInvoker};
use crate::identity::IdentityResolver;
use crate::quota::{QuotaDecision, QuotaTracker};
use crate::storage::CallRecordStore;

pub struct NameSuggestionService {
    identity: Arc<dyn IdentityResolver>,
    store: Arc<dyn CallRecordStore>,
    model: Option<Arc<dyn ModelInvoker>>,
    tracker: QuotaTracker,
    extractor: ResponseExtractor,
    suggestion_count: usize,
    max_field_chars: usize,
}

impl NameSuggestionService {
    pub fn new(
        identity: Arc<dyn IdentityResolver>,
        store: Arc<dyn CallRecordStore>,
        model: Option<Arc<dyn ModelInvoker>>,
        tracker: QuotaTracker,
    ) -> Self {
        Self {
            identity,
            store,
            model,
            tracker,
            extractor: ResponseExtractor::new(),
            suggestion_count: crate::generation::DEFAULT_SUGGESTION_COUNT,
            max_field_chars: crate::config::DEFAULT_MAX_FIELD_CHARS,
        }
    }

    pub fn with_suggestion_count(mut self, count: usize) -> Self {
        self.suggestion_count = count;
        self
    }

    pub fn with_max_field_chars(mut self, max_chars: usize) -> Self {
        self.max_field_chars = max_chars;
        self
    }

    pub fn model_configured(&self) -> bool {
        self.model.is_some()
    }

    /// Handle one request at the current local time
    pub async fn suggest(
        &self,
        token: Option<&str>,
        request: SuggestNamesRequest,
    ) -> Result<SuggestNamesResponse, ApiError> {
        self.suggest_at(token, request, Local::now()).await
    }

    /// Handle one request as if it arrived at `now`; the daily quota resets
    /// at midnight in `now`'s time zone.
    pub async fn suggest_at<Tz>(
        &self,
        token: Option<&str>,
        request: SuggestNamesRequest,
        now: DateTime<Tz>,
    ) -> Result<SuggestNamesResponse, ApiError>
    where
        Tz: TimeZone + Send + Sync,
        Tz::Offset: Send + Sync,
    {
        request.validate(self.max_field_chars)?;

        let identity = self.identity.resolve(token).await;

        let model = self.model.as_ref().ok_or_else(|| {
            warn!("Rejecting request: model API key not configured");
            ApiError::ConfigurationMissing(MISSING_API_KEY_MESSAGE.to_string())
        })?;

        let stored = self
            .store
            .get(&identity)
            .await
            .map_err(|e| {
                warn!("Failed to read call records for {}: {}", identity, e);
                ApiError::StorageUnavailable(e.to_string())
            })?
            .unwrap_or_default();

        let outcome = self.tracker.check(&identity, &now, &stored);

        if outcome.needs_write() {
            let written = self.store.merge(&identity, outcome.to_stored()).await;
            match (&outcome.decision, written) {
                (_, Ok(())) => {}
                (QuotaDecision::Admitted, Err(e)) => {
                    warn!("Failed to record call for {}: {}", identity, e);
                    return Err(ApiError::StorageUnavailable(e.to_string()));
                }
                // A failed prune write on deny only delays cleanup
                (QuotaDecision::Denied { .. }, Err(e)) => {
                    debug!("Failed to prune call records for {}: {}", identity, e);
                }
            }
        }

        if let QuotaDecision::Denied {
            reason,
            retry_after_secs,
        } = outcome.decision
        {
            warn!(
                "Quota exceeded for {} ({:?}), retry after {}s",
                identity, reason, retry_after_secs
            );
            return Err(ApiError::quota_exceeded(
                reason,
                retry_after_secs,
                self.tracker.config(),
            ));
        }

        info!(
            "Generating names for {} ({} calls today)",
            identity,
            outcome.records.len()
        );

        let prompt = build_prompt(
            request.original_name.trim(),
            request.concept.trim(),
            self.suggestion_count,
        );

        let raw = model.generate(&prompt).await.map_err(|e| {
            warn!("Model invocation failed for {}: {}", identity, e);
            ApiError::UpstreamModelFailure(e.to_string())
        })?;

        let results = self.extractor.extract_suggestions(&raw).map_err(|e| {
            warn!("Unparseable model response for {}: {}", identity, e);
            ApiError::ResponseParseError {
                raw: e.raw().to_string(),
            }
        })?;

        debug!("Returning {} suggestions to {}", results.len(), identity);
        Ok(SuggestNamesResponse { results })
    }
}
