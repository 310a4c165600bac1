// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Proxy configuration
//!
//! Defaults, then an optional TOML file, then environment variables.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use crate::generation::{GeminiConfig, DEFAULT_SUGGESTION_COUNT};
use crate::identity::{JwtKey, JwtSettings, DEFAULT_FALLBACK_IDENTITY};
use crate::quota::{QuotaConfig, MAX_SHORT_WINDOW_SECONDS};

/// Longest accepted `originalName` / `concept`, in characters
pub const DEFAULT_MAX_FIELD_CHARS: usize = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

fn default_fallback_identity() -> String {
    DEFAULT_FALLBACK_IDENTITY.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Identity used when the bearer token is absent or does not verify
    #[serde(default = "default_fallback_identity")]
    pub fallback_identity: String,
    /// Token verification; `None` means every caller gets the fallback
    #[serde(default)]
    pub jwt: Option<JwtSettings>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            fallback_identity: default_fallback_identity(),
            jwt: None,
        }
    }
}

fn default_suggestion_count() -> usize {
    DEFAULT_SUGGESTION_COUNT
}

fn default_max_field_chars() -> usize {
    DEFAULT_MAX_FIELD_CHARS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub quota: QuotaConfig,
    /// Absent when no API key is configured; requests then fail with a
    /// configuration error instead of reaching the model
    #[serde(default)]
    pub gemini: Option<GeminiConfig>,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default = "default_suggestion_count")]
    pub suggestion_count: usize,
    #[serde(default = "default_max_field_chars")]
    pub max_field_chars: usize,
    /// JSON file for call records; in-memory when unset
    #[serde(default)]
    pub store_path: Option<PathBuf>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            quota: QuotaConfig::default(),
            gemini: None,
            identity: IdentityConfig::default(),
            suggestion_count: default_suggestion_count(),
            max_field_chars: default_max_field_chars(),
            store_path: None,
        }
    }
}

impl ProxyConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|key| env::var(key).ok());
        config
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// File (if given) with environment overrides on top
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| env::var(key).ok());
        Ok(config)
    }

    /// Overlay values from `lookup` (normally the process environment)
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = parsed(&get, "SHORT_WINDOW_SECONDS") {
            self.quota.short_window_seconds = v;
        }
        if let Some(v) = parsed(&get, "SHORT_WINDOW_LIMIT") {
            self.quota.short_window_limit = v;
        }
        if let Some(v) = parsed(&get, "DAILY_LIMIT") {
            self.quota.daily_limit = v;
        }
        if let Some(v) = parsed(&get, "SUGGESTION_COUNT") {
            self.suggestion_count = v;
        }
        if let Some(v) = parsed(&get, "MAX_FIELD_CHARS") {
            self.max_field_chars = v;
        }

        if let Some(api_key) = get("GEMINI_API_KEY") {
            let gemini = self
                .gemini
                .get_or_insert_with(|| GeminiConfig::new(api_key.clone()));
            gemini.api_key = api_key;
        }
        if let Some(gemini) = self.gemini.as_mut() {
            if let Some(model) = get("GEMINI_MODEL") {
                gemini.model = model;
            }
            if let Some(base) = get("GEMINI_API_BASE") {
                gemini.api_base = base;
            }
            if let Some(v) = parsed(&get, "MODEL_TIMEOUT_SECS") {
                gemini.timeout_secs = v;
            }
        }

        if let Some(fallback) = get("FALLBACK_IDENTITY") {
            self.identity.fallback_identity = fallback;
        }
        let key = get("JWT_PUBLIC_KEY_PEM")
            // PEM keys pasted into env files usually carry literal "\n"
            .map(|pem| JwtKey::RsaPublicKeyPem {
                pem: pem.replace("\\n", "\n"),
            })
            .or_else(|| get("JWT_SECRET").map(|secret| JwtKey::Secret { secret }));
        if let Some(key) = key {
            let jwt = self.identity.jwt.get_or_insert_with(|| JwtSettings {
                key: key.clone(),
                issuer: None,
                audience: None,
            });
            jwt.key = key;
        }
        if let Some(jwt) = self.identity.jwt.as_mut() {
            if let Some(issuer) = get("JWT_ISSUER") {
                jwt.issuer = Some(issuer);
            }
            if let Some(audience) = get("JWT_AUDIENCE") {
                jwt.audience = Some(audience);
            }
        }

        if let Some(path) = get("STORE_PATH") {
            self.store_path = Some(PathBuf::from(path));
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quota.short_window_seconds == 0 {
            return Err(invalid("short window must be at least one second"));
        }
        if self.quota.short_window_seconds > MAX_SHORT_WINDOW_SECONDS {
            return Err(invalid(&format!(
                "short window must be at most {} seconds",
                MAX_SHORT_WINDOW_SECONDS
            )));
        }
        if self.quota.short_window_limit == 0 {
            return Err(invalid("short window limit must be greater than 0"));
        }
        if self.quota.daily_limit == 0 {
            return Err(invalid("daily limit must be greater than 0"));
        }
        if !(1..=10).contains(&self.suggestion_count) {
            return Err(invalid("suggestion count must be between 1 and 10"));
        }
        if self.max_field_chars == 0 {
            return Err(invalid("max field length must be greater than 0"));
        }
        if self.identity.fallback_identity.trim().is_empty() {
            return Err(invalid("fallback identity must not be empty"));
        }
        if let Some(gemini) = &self.gemini {
            if gemini.api_key.trim().is_empty() {
                return Err(invalid("Gemini API key must not be empty"));
            }
            if gemini.timeout_secs == 0 {
                return Err(invalid("model timeout must be greater than 0"));
            }
        }
        Ok(())
    }
}

fn parsed<T, G>(get: &G, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    let raw = get(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("Ignoring unparseable {}={}", key, raw);
            None
        }
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Invalid(message.to_string())
}
