use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-at-least-32-characters-long";
pub const TEST_ISSUER: &str = "https://auth.bomsheet.test";

/// Mint an HS256 token for `email`, valid for an hour.
pub fn token_for(email: &str) -> String {
    let now = Utc::now();
    let claims = json!({
        "email": email,
        "iss": TEST_ISSUER,
        "iat": now.timestamp(),
        "exp": (now + Duration::hours(1)).timestamp(),
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("Failed to encode test token")
}

/// A token that expired a minute ago.
pub fn expired_token_for(email: &str) -> String {
    let now = Utc::now();
    let claims = json!({
        "email": email,
        "iss": TEST_ISSUER,
        "exp": (now - Duration::minutes(1)).timestamp(),
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("Failed to encode test token")
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
