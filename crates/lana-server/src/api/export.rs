//! GET /api/export — full-account backup download.

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde_json::json;
use tracing::instrument;

use crate::error::ApiError;
use crate::server::AppState;
use crate::session::require_session;

/// GET /api/export
///
/// Everything the user owns (transactions oldest first, goals in creation
/// order) plus the household's recurring charges, wrapped in the versioned
/// envelope [`crate::api::import`] accepts back.
#[instrument(skip_all)]
pub async fn export(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let session = require_session(&state, &headers).await?;

    let transactions = state
        .store
        .list_all_user_transactions(session.user_id, session.token())
        .await?;
    let goals = state
        .store
        .list_goals(session.user_id, session.token())
        .await?;
    let charges = state
        .store
        .list_recurring_charges_by_creation(session.token())
        .await?;

    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let envelope = json!({
        "exported_at": now,
        "version": "1.0",
        "data": {
            "transacciones": transactions,
            "objetivos": goals,
            "gastos_recurrentes": charges
        }
    });

    Ok((
        StatusCode::OK,
        [(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"backup-{now}.json\""),
        )],
        Json(envelope),
    )
        .into_response())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
