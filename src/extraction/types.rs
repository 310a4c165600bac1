// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Records and errors produced by response extraction

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// One suggested stage name
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NameSuggestion {
    /// Hangul name
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    /// Hanja spelling, empty when the model had none
    #[serde(default, deserialize_with = "lenient_string")]
    pub hanja: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub meaning: String,
    /// Catch-phrase style concept line
    #[serde(default, deserialize_with = "lenient_string")]
    pub concept: String,
}

/// Models emit `null` or numbers for fields they have nothing for
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    /// No parseable JSON array could be recovered. `raw` is the model output
    /// exactly as received.
    #[error("Failed to parse model response: {reason}")]
    ResponseParse { raw: String, reason: String },
}

impl ExtractionError {
    pub fn raw(&self) -> &str {
        match self {
            ExtractionError::ResponseParse { raw, .. } => raw,
        }
    }
}
