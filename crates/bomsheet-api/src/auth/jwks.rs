//! RS256/ES256 key resolution with JWKS key rotation
//!
//! Keys are fetched from the configured JWKS endpoint and cached per `kid`.

use bomsheet_core::AppError;
use chrono::{DateTime, Utc};
use jsonwebtoken::DecodingKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// JWKS (JSON Web Key Set) structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

/// JSON Web Key structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwk {
    #[serde(rename = "kty")]
    pub key_type: String,
    #[serde(rename = "kid")]
    pub key_id: Option<String>,
    #[serde(rename = "alg")]
    pub algorithm: Option<String>,
    #[serde(rename = "n")]
    pub modulus: Option<String>, // For RSA
    #[serde(rename = "e")]
    pub exponent: Option<String>, // For RSA
    #[serde(rename = "x")]
    pub x_coordinate: Option<String>, // For EC
    #[serde(rename = "y")]
    pub y_coordinate: Option<String>, // For EC
    #[serde(rename = "crv")]
    pub curve: Option<String>, // For EC
}

#[derive(Clone)]
struct CachedKey {
    key: DecodingKey,
    expires_at: DateTime<Utc>,
}

pub struct JwksKeyCache {
    jwks_url: String,
    http: reqwest::Client,
    cache: Arc<RwLock<HashMap<String, CachedKey>>>,
    cache_ttl_seconds: i64,
}

impl JwksKeyCache {
    /// * `jwks_url` - e.g. "https://cognito-idp.us-east-1.amazonaws.com/{pool}/.well-known/jwks.json"
    /// * `cache_ttl_seconds` - how long to cache keys (default: 3600)
    pub fn new(jwks_url: String, cache_ttl_seconds: Option<i64>) -> Self {
        Self {
            jwks_url,
            http: reqwest::Client::new(),
            cache: Arc::new(RwLock::new(HashMap::new())),
            cache_ttl_seconds: cache_ttl_seconds.unwrap_or(3600),
        }
    }

    async fn fetch_jwks(&self) -> Result<Jwks, AppError> {
        let response = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AppError::Unauthenticated(format!("Failed to fetch JWKS: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Unauthenticated(format!(
                "JWKS endpoint returned error: {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Unauthenticated(format!("Failed to parse JWKS: {}", e)))
    }

    fn jwk_to_decoding_key(jwk: &Jwk) -> Result<DecodingKey, AppError> {
        match jwk.key_type.as_str() {
            "RSA" => {
                let n = jwk.modulus.as_ref().ok_or_else(|| {
                    AppError::Unauthenticated("RSA key missing modulus".to_string())
                })?;
                let e = jwk.exponent.as_ref().ok_or_else(|| {
                    AppError::Unauthenticated("RSA key missing exponent".to_string())
                })?;

                DecodingKey::from_rsa_components(n, e).map_err(|e| {
                    AppError::Unauthenticated(format!("Failed to create RSA key: {}", e))
                })
            }
            "EC" => {
                let x = jwk.x_coordinate.as_ref().ok_or_else(|| {
                    AppError::Unauthenticated("EC key missing x coordinate".to_string())
                })?;
                let y = jwk.y_coordinate.as_ref().ok_or_else(|| {
                    AppError::Unauthenticated("EC key missing y coordinate".to_string())
                })?;
                let curve = jwk.curve.as_deref().unwrap_or_default();
                if curve != "P-256" {
                    return Err(AppError::Unauthenticated(format!(
                        "Unsupported EC curve: {} (only P-256 is supported)",
                        curve
                    )));
                }

                DecodingKey::from_ec_components(x, y).map_err(|e| {
                    AppError::Unauthenticated(format!("Failed to create EC key: {}", e))
                })
            }
            other => Err(AppError::Unauthenticated(format!(
                "Unsupported key type: {}",
                other
            ))),
        }
    }

    /// Decoding key for `kid`, or the first published key when the token has none.
    pub async fn decoding_key(&self, kid: Option<&str>) -> Result<DecodingKey, AppError> {
        let cache_key = kid.unwrap_or("default").to_string();

        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(&cache_key) {
                if cached.expires_at > Utc::now() {
                    return Ok(cached.key.clone());
                }
            }
        }

        let jwks = self.fetch_jwks().await?;

        let jwk = match kid {
            Some(kid) => jwks
                .keys
                .iter()
                .find(|k| k.key_id.as_deref() == Some(kid))
                .ok_or_else(|| {
                    AppError::Unauthenticated(format!("Key ID {} not found in JWKS", kid))
                })?,
            None => jwks
                .keys
                .first()
                .ok_or_else(|| AppError::Unauthenticated("No keys found in JWKS".to_string()))?,
        };

        let decoding_key = Self::jwk_to_decoding_key(jwk)?;

        self.cache.write().await.insert(
            cache_key,
            CachedKey {
                key: decoding_key.clone(),
                expires_at: Utc::now() + chrono::Duration::seconds(self.cache_ttl_seconds),
            },
        );

        Ok(decoding_key)
    }
}
