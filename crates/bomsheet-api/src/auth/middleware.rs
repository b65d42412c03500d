use crate::auth::jwt::JwtVerifier;
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use bomsheet_core::AppError;
use std::sync::Arc;

/// Verify the bearer token and attach an [`OwnerContext`](crate::auth::OwnerContext).
pub async fn auth_middleware(
    State(verifier): State<Arc<JwtVerifier>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
    {
        Some(header) => match header.strip_prefix("Bearer ") {
            Some(token) if !token.trim().is_empty() => token.trim().to_string(),
            _ => {
                return HttpAppError(AppError::Unauthenticated(
                    "Invalid authorization header format".to_string(),
                ))
                .into_response();
            }
        },
        None => {
            return HttpAppError(AppError::Unauthenticated(
                "Missing authorization header".to_string(),
            ))
            .into_response();
        }
    };

    match verifier.verify(&token).await {
        Ok(owner) => {
            tracing::debug!(owner_id = %owner.owner_id, "Authenticated request");
            request.extensions_mut().insert(owner);
            next.run(request).await
        }
        Err(e) => HttpAppError(e).into_response(),
    }
}
