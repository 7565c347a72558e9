//! # Authentication
//!
//! This module provides bearer authentication for protected API endpoints.
//! Tokens are verified by the configured [`IdentityProvider`]; the resulting
//! identity is stored in request extensions as a [`Caller`].

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use metrics::counter;
use uuid::Uuid;

use crate::error::{ApiError, unauthorized};
use crate::identity::IdentityProvider;
use crate::models::Role;
use crate::server::AppState;

/// Authenticated user attached to the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub email: Option<String>,
}

/// Role of the caller, present once the authorization gate has looked it up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerRole(pub Role);

/// Authentication middleware that validates bearer tokens
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let caller = verify_request(request.headers(), state.identity.as_ref()).await?;
    tracing::debug!(user_id = %caller.user_id, "Authenticated request");

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

async fn verify_request(
    headers: &HeaderMap,
    identity: &dyn IdentityProvider,
) -> Result<Caller, ApiError> {
    let Some(token) = extract_bearer(headers) else {
        record_authentication_failure("missing_token");
        return Err(unauthorized(None));
    };

    match identity.verify_token(token).await {
        Ok(verified) => Ok(Caller {
            user_id: verified.user_id,
            email: verified.email,
        }),
        Err(err) => {
            record_authentication_failure("rejected_token");
            Err(err.into())
        }
    }
}

/// Returns the token of a well-formed `Authorization: Bearer <token>` header
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

fn record_authentication_failure(reason: &'static str) {
    tracing::info!(reason, "Authentication failed");
    counter!("api_authentication_failures_total", "reason" => reason).increment(1);
}

impl<S> FromRequestParts<S> for Caller
where
    S: Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Caller>()
            .cloned()
            .ok_or_else(|| unauthorized(None))
    }
}
