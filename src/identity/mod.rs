// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Caller identity resolution
//!
//! Verification is best effort: a missing, malformed, or unverifiable token
//! never fails the request, it resolves to the fallback identity instead.

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Identity used when no token verifies
pub const DEFAULT_FALLBACK_IDENTITY: &str = "web-user";

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid JWT key material: {0}")]
    InvalidKey(String),
}

/// Resolves a bearer credential to the key quota bookkeeping is done under
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Never fails; unverifiable input yields the fallback identity
    async fn resolve(&self, token: Option<&str>) -> String;

    fn fallback_identity(&self) -> &str;
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    header
        .and_then(|value| value.trim_start().strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolver for deployments without token verification
#[derive(Debug, Clone)]
pub struct FallbackIdentityResolver {
    fallback: String,
}

impl FallbackIdentityResolver {
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            fallback: fallback.into(),
        }
    }
}

impl Default for FallbackIdentityResolver {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK_IDENTITY)
    }
}

#[async_trait]
impl IdentityResolver for FallbackIdentityResolver {
    async fn resolve(&self, _token: Option<&str>) -> String {
        self.fallback.clone()
    }

    fn fallback_identity(&self) -> &str {
        &self.fallback
    }
}

/// Key material for JWT verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JwtKey {
    /// HS256 shared secret
    Secret { secret: String },
    /// RS256 public key in PEM form
    RsaPublicKeyPem { pem: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtSettings {
    pub key: JwtKey,
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub audience: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdentityClaims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
}

/// Verifies bearer JWTs locally and uses `user_id` (or `sub`) as the identity
pub struct JwtIdentityResolver {
    key: DecodingKey,
    validation: Validation,
    fallback: String,
}

impl JwtIdentityResolver {
    pub fn new(settings: &JwtSettings, fallback: impl Into<String>) -> Result<Self, IdentityError> {
        let (key, algorithm) = match &settings.key {
            JwtKey::Secret { secret } => {
                if secret.is_empty() {
                    return Err(IdentityError::InvalidKey("empty JWT secret".to_string()));
                }
                (DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256)
            }
            JwtKey::RsaPublicKeyPem { pem } => (
                DecodingKey::from_rsa_pem(pem.as_bytes())
                    .map_err(|e| IdentityError::InvalidKey(e.to_string()))?,
                Algorithm::RS256,
            ),
        };

        let mut validation = Validation::new(algorithm);
        if let Some(issuer) = &settings.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &settings.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Ok(Self {
            key,
            validation,
            fallback: fallback.into(),
        })
    }

    fn verify(&self, token: &str) -> Result<String, String> {
        let data = decode::<IdentityClaims>(token, &self.key, &self.validation)
            .map_err(|e| e.to_string())?;
        data.claims
            .user_id
            .or(data.claims.sub)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| "token carries no subject".to_string())
    }
}

#[async_trait]
impl IdentityResolver for JwtIdentityResolver {
    async fn resolve(&self, token: Option<&str>) -> String {
        let Some(token) = token else {
            debug!("No bearer token, using fallback identity");
            return self.fallback.clone();
        };

        match self.verify(token) {
            Ok(identity) => identity,
            Err(reason) => {
                info!("Invalid token ({}), using fallback identity", reason);
                self.fallback.clone()
            }
        }
    }

    fn fallback_identity(&self) -> &str {
        &self.fallback
    }
}
