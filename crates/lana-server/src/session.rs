//! Request sessions.
//!
//! The caller's `Authorization: Bearer` token is resolved against the
//! hosted auth endpoint once per request and the result is passed as an
//! explicit value to whatever needs it; there is no ambient session
//! state.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use uuid::Uuid;

use crate::error::ApiError;
use crate::server::AppState;

/// An authenticated caller.
#[derive(Clone, Debug)]
pub struct SessionContext {
    /// User id, applied as `usuario_id` on owned rows.
    pub user_id: Uuid,
    /// Account email (import's `registrado_por` fallback).
    pub email: Option<String>,
    /// The raw access token, forwarded as the store bearer.
    pub access_token: String,
}

impl SessionContext {
    /// The access token as a store-call parameter.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        Some(&self.access_token)
    }
}

/// Extract the bearer token from request headers, if any.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToOwned::to_owned)
}

/// Resolve a session or fail with 401.
pub async fn require_session(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<SessionContext, ApiError> {
    let token = bearer_token(headers).ok_or(ApiError::Unauthorized)?;
    let user = state
        .store
        .fetch_user(&token)
        .await
        .map_err(|_| ApiError::Unauthorized)?;
    Ok(SessionContext {
        user_id: user.id,
        email: user.email,
        access_token: token,
    })
}
