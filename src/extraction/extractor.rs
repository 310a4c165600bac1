// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Recovers the JSON array of suggestions from raw model output

use serde_json::Value;
use tracing::{debug, warn};

use super::strategy::{default_strategies, ExtractionStrategy};
use super::types::{ExtractionError, NameSuggestion};

pub struct ResponseExtractor {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl Default for ResponseExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseExtractor {
    /// Fenced block, then bracketed array, then the whole text
    pub fn new() -> Self {
        Self {
            strategies: default_strategies(),
        }
    }

    pub fn with_strategies(strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self { strategies }
    }

    /// Parse the first candidate any strategy yields as a JSON array.
    ///
    /// Later strategies are not consulted once one has produced a candidate,
    /// even if that candidate fails to parse.
    pub fn extract(&self, raw: &str) -> Result<Vec<Value>, ExtractionError> {
        let Some((strategy, candidate)) = self
            .strategies
            .iter()
            .find_map(|s| s.candidate(raw).map(|c| (s.name(), c)))
        else {
            return Err(parse_error(raw, "no extraction strategy produced a candidate"));
        };

        debug!(
            "Extracting model response via {} ({} of {} bytes)",
            strategy,
            candidate.len(),
            raw.len()
        );

        match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Array(items)) => Ok(items),
            Ok(other) => {
                warn!("Model response candidate ({}) is not an array", strategy);
                Err(parse_error(
                    raw,
                    &format!("expected a JSON array, found {}", json_kind(&other)),
                ))
            }
            Err(e) => {
                warn!("Model response candidate ({}) is not valid JSON: {}", strategy, e);
                Err(parse_error(raw, &e.to_string()))
            }
        }
    }

    /// Extract and map each element onto a [`NameSuggestion`]
    pub fn extract_suggestions(&self, raw: &str) -> Result<Vec<NameSuggestion>, ExtractionError> {
        self.extract(raw)?
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                if !item.is_object() {
                    return Err(parse_error(
                        raw,
                        &format!("element {} is {}, not an object", index, json_kind(&item)),
                    ));
                }
                serde_json::from_value(item)
                    .map_err(|e| parse_error(raw, &format!("element {}: {}", index, e)))
            })
            .collect()
    }
}

fn parse_error(raw: &str, reason: &str) -> ExtractionError {
    ExtractionError::ResponseParse {
        raw: raw.to_string(),
        reason: reason.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
