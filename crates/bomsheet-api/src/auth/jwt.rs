//! Bearer token verification.
//!
//! Tokens are verified for signature, expiry, not-before and (when configured) issuer
//! before the identity claim is trusted. HS256 uses a shared secret; RS256/ES256 keys come
//! from a JWKS endpoint.

use std::collections::HashMap;

use bomsheet_core::{AppError, Config};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde_json::Value;

use super::jwks::JwksKeyCache;
use super::models::OwnerContext;

enum KeySource {
    Secret(DecodingKey),
    Jwks(JwksKeyCache),
}

pub struct JwtVerifier {
    keys: KeySource,
    issuer: Option<String>,
    owner_claim: String,
}

impl JwtVerifier {
    pub fn with_secret(secret: &[u8], issuer: Option<String>, owner_claim: &str) -> Self {
        Self {
            keys: KeySource::Secret(DecodingKey::from_secret(secret)),
            issuer,
            owner_claim: owner_claim.to_string(),
        }
    }

    pub fn with_jwks(jwks_url: String, issuer: Option<String>, owner_claim: &str) -> Self {
        Self {
            keys: KeySource::Jwks(JwksKeyCache::new(jwks_url, None)),
            issuer,
            owner_claim: owner_claim.to_string(),
        }
    }

    /// A shared secret takes precedence over a JWKS endpoint.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let issuer = config.jwt_issuer().map(String::from);
        let owner_claim = config.jwt_owner_claim();

        if let Some(secret) = config.jwt_secret() {
            return Ok(Self::with_secret(secret.as_bytes(), issuer, owner_claim));
        }
        if let Some(url) = config.jwt_jwks_url() {
            return Ok(Self::with_jwks(url.to_string(), issuer, owner_claim));
        }
        Err(AppError::Internal(
            "neither JWT_SECRET nor JWT_JWKS_URL is configured".to_string(),
        ))
    }

    fn validation(&self, algorithms: Vec<Algorithm>) -> Validation {
        let mut validation = Validation::new(algorithms[0]);
        validation.algorithms = algorithms;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = 0;
        match &self.issuer {
            Some(issuer) => {
                validation.set_issuer(&[issuer]);
                validation.set_required_spec_claims(&["exp", "iss"]);
            }
            None => validation.set_required_spec_claims(&["exp"]),
        }
        validation
    }

    /// Verify `token` and return the caller's identity.
    pub async fn verify(&self, token: &str) -> Result<OwnerContext, AppError> {
        let header = decode_header(token)
            .map_err(|e| AppError::Unauthenticated(format!("Invalid token header: {}", e)))?;

        let (key, algorithms) = match &self.keys {
            KeySource::Secret(key) => (key.clone(), vec![Algorithm::HS256]),
            KeySource::Jwks(cache) => (
                cache.decoding_key(header.kid.as_deref()).await?,
                vec![Algorithm::RS256, Algorithm::ES256],
            ),
        };

        if !algorithms.contains(&header.alg) {
            return Err(AppError::Unauthenticated(format!(
                "Unsupported algorithm: {:?}",
                header.alg
            )));
        }

        let claims = decode::<HashMap<String, Value>>(token, &key, &self.validation(algorithms))
            .map_err(|e| {
                tracing::debug!(error = %e, "JWT validation failed");
                AppError::Unauthenticated(
                    match e.kind() {
                        ErrorKind::ExpiredSignature => "Token has expired",
                        ErrorKind::ImmatureSignature => "Token is not yet valid (nbf)",
                        ErrorKind::InvalidIssuer => "Invalid token issuer",
                        ErrorKind::InvalidSignature => "Invalid token signature",
                        _ => "Invalid token",
                    }
                    .to_string(),
                )
            })?
            .claims;

        let owner_id = claims
            .get(&self.owner_claim)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                AppError::Unauthenticated(format!("Token has no '{}' claim", self.owner_claim))
            })?;

        Ok(OwnerContext {
            owner_id: owner_id.to_string(),
        })
    }
}
