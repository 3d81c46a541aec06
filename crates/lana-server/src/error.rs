//! API error responses.
//!
//! Every non-2xx body is `{"error": "..."}` (plus `"details"` for the
//! chat endpoint's outer failure), with the Spanish user-facing strings
//! the frontend expects.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use lana_store::StoreError;
use serde_json::json;

/// Errors surfaced as HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No usable bearer token (401 `{"error":"No autenticado"}`).
    #[error("no autenticado")]
    Unauthorized,

    /// Client-side problem with the request (400).
    #[error("{0}")]
    BadRequest(String),

    /// Downstream or internal failure (500).
    #[error("{0}")]
    Internal(String),

    /// Internal failure with a `details` field (chat endpoint shape).
    #[error("{error}: {details}")]
    InternalWithDetails {
        /// User-facing error string.
        error: String,
        /// Underlying cause.
        details: String,
    },
}

impl ApiError {
    /// 400 with the given message.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Rejected { message, .. } => Self::Internal(message),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({"error": "No autenticado"}),
            ),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, json!({"error": message})),
            Self::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, json!({"error": message}))
            }
            Self::InternalWithDetails { error, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"error": error, "details": details}),
            ),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 10_000)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn unauthorized_uses_spanish_string() {
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_of(response).await["error"], "No autenticado");
    }

    #[tokio::test]
    async fn bad_request_carries_message() {
        let response = ApiError::bad_request("ID requerido").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_of(response).await["error"], "ID requerido");
    }

    #[tokio::test]
    async fn details_shape() {
        let response = ApiError::InternalWithDetails {
            error: "Error al procesar tu mensaje".into(),
            details: "timeout".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_of(response).await;
        assert_eq!(body["error"], "Error al procesar tu mensaje");
        assert_eq!(body["details"], "timeout");
    }

    #[test]
    fn store_rejection_maps_to_its_message() {
        let err: ApiError = StoreError::Rejected {
            status: 403,
            message: "permission denied".into(),
        }
        .into();
        assert!(matches!(err, ApiError::Internal(m) if m == "permission denied"));
    }
}
