use crate::error::HttpAppError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use bomsheet_core::AppError;

/// Verified caller identity, inserted into request extensions by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerContext {
    /// Value of the configured identity claim (the caller's email by default).
    pub owner_id: String,
}

// Extension cannot be combined with a body-consuming extractor, so read the context
// directly from request parts.
impl<S> FromRequestParts<S> for OwnerContext
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<OwnerContext>()
            .cloned()
            .ok_or_else(|| {
                HttpAppError(AppError::Unauthenticated(
                    "missing owner context".to_string(),
                ))
            })
    }
}
