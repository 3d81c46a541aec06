//! POST /api/reset — wipe the account's data.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde_json::json;
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::server::AppState;
use crate::session::require_session;

/// POST /api/reset
///
/// Deletes the user's transactions (including the ownerless rows written
/// by sessionless inserts), the user's goals, and every recurring charge.
#[instrument(skip_all)]
pub async fn reset(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let session = require_session(&state, &headers).await?;

    state
        .store
        .delete_user_transactions(session.user_id, session.token())
        .await?;
    state
        .store
        .delete_user_goals(session.user_id, session.token())
        .await?;
    state
        .store
        .delete_all_recurring_charges(session.token())
        .await?;

    info!(user_id = %session.user_id, "account data reset");
    Ok(Json(json!({"success": true})))
}
