//! /api/objetivos — savings-goal CRUD and goal movements.
//!
//! Goal balances are never stored. A movement is a plain transaction in
//! the `Ahorro/inversión` category linked through `objetivo_id`: aportes
//! are `gasto` rows (money leaving the budget into the goal), retiros are
//! `ingreso` rows, and the balance is their signed sum.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use lana_core::categories::SAVINGS_CATEGORY;
use lana_core::{
    NewSavingsGoal, NewTransaction, PaymentMethod, TransactionKind, DEFAULT_GOAL_COLOR,
};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::server::AppState;
use crate::session::require_session;

const MISSING_ID: &str = "ID requerido";

/// GET /api/objetivos
#[instrument(skip_all)]
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let session = require_session(&state, &headers).await?;
    let goals = state
        .store
        .list_goals(session.user_id, session.token())
        .await?;
    Ok(Json(json!({"data": goals})))
}

/// A goal to create.
#[derive(Debug, Deserialize)]
pub struct GoalInput {
    /// Goal name; required non-empty.
    #[serde(default)]
    pub nombre: String,
    /// Optional target amount.
    #[serde(default)]
    pub meta: Option<f64>,
    /// Optional description.
    #[serde(default)]
    pub descripcion: Option<String>,
    /// Display color; defaults to the standard accent.
    #[serde(default)]
    pub color: Option<String>,
    /// Optional icon name.
    #[serde(default)]
    pub icono: Option<String>,
}

/// POST /api/objetivos
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<GoalInput>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let session = require_session(&state, &headers).await?;
    if input.nombre.trim().is_empty() {
        return Err(ApiError::bad_request("El nombre es requerido"));
    }

    let goal = NewSavingsGoal {
        id: None,
        nombre: input.nombre,
        meta: input.meta,
        descripcion: input.descripcion,
        color: input.color.unwrap_or_else(|| DEFAULT_GOAL_COLOR.into()),
        icono: input.icono,
        usuario_id: Some(session.user_id),
    };
    let created = state.store.insert_goal(&goal, session.token()).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({"data": created.into_iter().next()})),
    ))
}

/// PUT /api/objetivos — patch by body `id`. Ownership and bookkeeping
/// columns are stripped from the patch before it reaches the store.
#[instrument(skip_all)]
pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(mut body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let session = require_session(&state, &headers).await?;

    let id: Uuid = body
        .get("id")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ApiError::bad_request(MISSING_ID))?;

    if let Some(patch) = body.as_object_mut() {
        patch.remove("id");
        patch.remove("usuario_id");
        patch.remove("created_at");
    }
    state
        .store
        .update_goal(id, session.user_id, &body, session.token())
        .await?;
    Ok(Json(json!({"success": true})))
}

/// DELETE query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteParams {
    /// Goal id.
    #[serde(default)]
    pub id: Option<Uuid>,
}

/// DELETE /api/objetivos?id=
#[instrument(skip_all)]
pub async fn delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<DeleteParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let session = require_session(&state, &headers).await?;
    let id = params
        .id
        .ok_or_else(|| ApiError::bad_request(MISSING_ID))?;
    state
        .store
        .delete_goal(id, session.user_id, session.token())
        .await?;
    Ok(Json(json!({"success": true})))
}

// ── Movements ────────────────────────────────────────────────────────────────

/// GET query parameters for movements.
#[derive(Debug, Default, Deserialize)]
pub struct MovementParams {
    /// Restrict to one goal.
    #[serde(default)]
    pub objetivo_id: Option<Uuid>,
}

/// GET /api/objetivos/movimientos
#[instrument(skip_all)]
pub async fn list_movements(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<MovementParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let session = require_session(&state, &headers).await?;

    let mut movements = state
        .store
        .list_savings_movements(session.user_id, session.token())
        .await?;
    if let Some(goal_id) = params.objetivo_id {
        movements.retain(|m| m.objetivo_id == Some(goal_id));
    }

    let mut saldos: HashMap<Uuid, f64> = HashMap::new();
    for movement in &movements {
        let Some(goal_id) = movement.objetivo_id else {
            continue;
        };
        let signed = match movement.tipo {
            TransactionKind::Gasto => movement.monto,
            TransactionKind::Ingreso => -movement.monto,
        };
        *saldos.entry(goal_id).or_insert(0.0) += signed;
    }

    Ok(Json(json!({"data": movements, "saldos": saldos})))
}

/// An aporte or retiro against a goal.
#[derive(Debug, Deserialize)]
pub struct MovementInput {
    /// Target goal.
    pub objetivo_id: Uuid,
    /// `aporte` or `retiro`.
    pub tipo: String,
    /// Positive amount in MXN.
    pub monto: f64,
    /// Optional note.
    #[serde(default)]
    pub descripcion: Option<String>,
}

/// POST /api/objetivos/movimientos
#[instrument(skip_all)]
pub async fn create_movement(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<MovementInput>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let session = require_session(&state, &headers).await?;

    if input.monto <= 0.0 {
        return Err(ApiError::bad_request("El monto debe ser mayor a 0"));
    }
    let (kind, label) = match input.tipo.as_str() {
        "aporte" => (TransactionKind::Gasto, "Aporte"),
        "retiro" => (TransactionKind::Ingreso, "Retiro"),
        _ => return Err(ApiError::bad_request("Tipo de movimiento inválido")),
    };

    let goals = state
        .store
        .list_goals(session.user_id, session.token())
        .await?;
    let goal = goals
        .into_iter()
        .find(|g| g.id == input.objetivo_id)
        .ok_or_else(|| ApiError::bad_request("Objetivo no encontrado"))?;

    let row = NewTransaction {
        tipo: kind,
        monto: input.monto,
        categoria: SAVINGS_CATEGORY.into(),
        fecha: Some(Utc::now()),
        fecha_hora: None,
        concepto: Some(format!("{label} · {}", goal.nombre)),
        descripcion: input.descripcion,
        metodo_pago: PaymentMethod::Transferencia,
        registrado_por: session.email.clone().unwrap_or_else(|| "Usuario".into()),
        foto_url: None,
        objetivo_id: Some(goal.id),
        usuario_id: Some(session.user_id),
        cargo_id: None,
        fecha_cargo: None,
    };
    let created = state
        .store
        .insert_transactions(&[row], session.token())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({"data": created.into_iter().next()})),
    ))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
