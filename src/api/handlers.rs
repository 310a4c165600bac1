// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use serde::{Deserialize, Serialize};

use crate::extraction::NameSuggestion;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestNamesRequest {
    /// The caller's name in Latin script
    #[serde(default)]
    pub original_name: String,
    /// Idol concept the names should fit
    #[serde(default)]
    pub concept: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestNamesResponse {
    pub results: Vec<NameSuggestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_configured: bool,
}

impl SuggestNamesRequest {
    pub fn validate(&self, max_chars: usize) -> Result<(), crate::api::ApiError> {
        use crate::api::ApiError;

        for (field, value) in [("originalName", &self.original_name), ("concept", &self.concept)] {
            if value.trim().is_empty() {
                return Err(ApiError::ValidationError {
                    field: field.to_string(),
                    message: format!("{} cannot be empty", field),
                });
            }
            if value.chars().count() > max_chars {
                return Err(ApiError::ValidationError {
                    field: field.to_string(),
                    message: format!("{} must be at most {} characters", field, max_chars),
                });
            }
        }

        Ok(())
    }
}
