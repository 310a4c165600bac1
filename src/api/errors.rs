// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::quota::{DenialReason, QuotaConfig};

pub const PARSE_FAILURE_MESSAGE: &str = "AI 응답 파싱 실패";
pub const MISSING_API_KEY_MESSAGE: &str = "Gemini API key not set";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Human readable message
    pub error: String,
    pub error_type: String,
    /// Unparsed model output, only on parse failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    MethodNotAllowed(String),
    InvalidRequest(String),
    ValidationError {
        field: String,
        message: String,
    },
    QuotaExceeded {
        reason: DenialReason,
        message: String,
        retry_after: u64,
    },
    ConfigurationMissing(String),
    StorageUnavailable(String),
    UpstreamModelFailure(String),
    ResponseParseError {
        raw: String,
    },
}

impl ApiError {
    /// Denial with a message rendered from the enforced limits
    pub fn quota_exceeded(reason: DenialReason, retry_after: u64, quota: &QuotaConfig) -> Self {
        let message = match reason {
            DenialReason::ShortWindowExceeded => format!(
                "{}에 {}회까지만 요청할 수 있습니다.",
                window_label(quota.short_window_seconds),
                quota.short_window_limit
            ),
            DenialReason::DailyWindowExceeded => {
                format!("하루에 {}회까지만 요청할 수 있습니다.", quota.daily_limit)
            }
        };
        ApiError::QuotaExceeded {
            reason,
            message,
            retry_after,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::MethodNotAllowed(_) => "method_not_allowed",
            ApiError::InvalidRequest(_) => "invalid_request",
            ApiError::ValidationError { .. } => "validation_error",
            ApiError::QuotaExceeded {
                reason: DenialReason::ShortWindowExceeded,
                ..
            } => "short_window_exceeded",
            ApiError::QuotaExceeded {
                reason: DenialReason::DailyWindowExceeded,
                ..
            } => "daily_window_exceeded",
            ApiError::ConfigurationMissing(_) => "configuration_missing",
            ApiError::StorageUnavailable(_) => "storage_unavailable",
            ApiError::UpstreamModelFailure(_) => "upstream_model_failure",
            ApiError::ResponseParseError { .. } => "response_parse_error",
        }
    }

    pub fn to_response(&self, request_id: Option<String>) -> ErrorResponse {
        let mut response = ErrorResponse {
            error: self.message(),
            error_type: self.error_type().to_string(),
            raw: None,
            retry_after: None,
            details: None,
            request_id,
        };

        match self {
            ApiError::ValidationError { field, .. } => {
                let mut details = HashMap::new();
                details.insert(
                    "field".to_string(),
                    serde_json::Value::String(field.clone()),
                );
                response.details = Some(details);
            }
            ApiError::QuotaExceeded { retry_after, .. } => {
                response.retry_after = Some(*retry_after);
            }
            ApiError::ResponseParseError { raw } => {
                response.raw = Some(raw.clone());
            }
            _ => {}
        }

        response
    }

    /// User-facing message
    pub fn message(&self) -> String {
        match self {
            ApiError::MethodNotAllowed(_) => "Method not allowed".to_string(),
            ApiError::InvalidRequest(msg) => msg.clone(),
            ApiError::ValidationError { message, .. } => message.clone(),
            ApiError::QuotaExceeded { message, .. } => message.clone(),
            ApiError::ConfigurationMissing(msg) => msg.clone(),
            ApiError::StorageUnavailable(_) => "Rate limit storage unavailable".to_string(),
            ApiError::UpstreamModelFailure(_) => "AI model request failed".to_string(),
            ApiError::ResponseParseError { .. } => PARSE_FAILURE_MESSAGE.to_string(),
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::MethodNotAllowed(_) => 405,
            ApiError::InvalidRequest(_) | ApiError::ValidationError { .. } => 400,
            ApiError::QuotaExceeded { .. } => 429,
            ApiError::ConfigurationMissing(_) | ApiError::ResponseParseError { .. } => 500,
            ApiError::UpstreamModelFailure(_) => 502,
            ApiError::StorageUnavailable(_) => 503,
        }
    }

    pub fn retry_after(&self) -> Option<u64> {
        match self {
            ApiError::QuotaExceeded { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }
}

/// "1분" for whole minutes, "45초" otherwise
fn window_label(seconds: u64) -> String {
    if seconds >= 60 && seconds % 60 == 0 {
        format!("{}분", seconds / 60)
    } else {
        format!("{}초", seconds)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::MethodNotAllowed(method) => write!(f, "Method not allowed: {}", method),
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::ValidationError { field, message } => {
                write!(f, "Validation error for {}: {}", field, message)
            }
            ApiError::QuotaExceeded {
                reason,
                retry_after,
                ..
            } => write!(
                f,
                "Quota exceeded ({:?}), retry after {} seconds",
                reason, retry_after
            ),
            ApiError::ConfigurationMissing(msg) => write!(f, "Configuration missing: {}", msg),
            ApiError::StorageUnavailable(msg) => write!(f, "Storage unavailable: {}", msg),
            ApiError::UpstreamModelFailure(msg) => write!(f, "Upstream model failure: {}", msg),
            ApiError::ResponseParseError { raw } => {
                write!(f, "Failed to parse model response ({} bytes)", raw.len())
            }
        }
    }
}

impl std::error::Error for ApiError {}
