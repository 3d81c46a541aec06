//! /api/transacciones — dashboard reads and manual inserts.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use lana_core::{NewTransaction, PaymentMethod, TransactionKind};
use lana_store::{window_for, Vista};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::server::AppState;
use crate::session::require_session;

/// GET query parameters. Dates arrive as `YYYY-MM-DD`; anything that
/// fails to parse is treated as absent, like the `vista` fallback.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// `diaria`, `semanal`, `mensual`, or `personalizada`.
    #[serde(default)]
    pub vista: Option<String>,
    /// Custom range start.
    #[serde(default)]
    pub fecha_inicio: Option<String>,
    /// Custom range end.
    #[serde(default)]
    pub fecha_fin: Option<String>,
}

fn parse_date(param: Option<&str>) -> Option<NaiveDate> {
    param.and_then(|s| s.parse().ok())
}

/// GET /api/transacciones
#[instrument(skip_all)]
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let session = require_session(&state, &headers).await?;

    let vista = Vista::parse(params.vista.as_deref());
    let window = window_for(
        vista,
        Utc::now(),
        parse_date(params.fecha_inicio.as_deref()),
        parse_date(params.fecha_fin.as_deref()),
    );
    let rows = state
        .store
        .list_transactions(session.user_id, window, session.token())
        .await?;
    Ok(Json(json!({"data": rows, "vista": vista.as_str()})))
}

/// A manually entered transaction.
#[derive(Clone, Debug, Deserialize)]
pub struct TransactionInput {
    /// Expense (default) or income.
    #[serde(default)]
    pub tipo: TransactionKind,
    /// Positive amount in MXN.
    pub monto: f64,
    /// Category; required non-empty.
    #[serde(default)]
    pub categoria: String,
    /// Timestamp; defaults to now.
    #[serde(default)]
    pub fecha: Option<DateTime<Utc>>,
    /// Short concept line.
    #[serde(default)]
    pub concepto: Option<String>,
    /// Free-text note.
    #[serde(default)]
    pub descripcion: Option<String>,
    /// Payment method; defaults to cash.
    #[serde(default)]
    pub metodo_pago: Option<PaymentMethod>,
    /// Who recorded it; defaults to `Usuario`.
    #[serde(default)]
    pub registrado_por: Option<String>,
    /// Receipt image URL.
    #[serde(default)]
    pub foto_url: Option<String>,
    /// Linked savings goal.
    #[serde(default)]
    pub objetivo_id: Option<Uuid>,
}

/// One row or a batch (the daily-cut flow posts an array).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CreateBody {
    /// A single row.
    One(TransactionInput),
    /// A batch of rows.
    Many(Vec<TransactionInput>),
}

impl CreateBody {
    fn into_inputs(self) -> Vec<TransactionInput> {
        match self {
            Self::One(input) => vec![input],
            Self::Many(inputs) => inputs,
        }
    }
}

fn to_row(input: TransactionInput, user_id: Uuid, now: DateTime<Utc>) -> NewTransaction {
    NewTransaction {
        tipo: input.tipo,
        monto: input.monto,
        categoria: input.categoria,
        fecha: Some(input.fecha.unwrap_or(now)),
        fecha_hora: None,
        concepto: input.concepto,
        descripcion: input.descripcion,
        metodo_pago: input.metodo_pago.unwrap_or_default(),
        registrado_por: input.registrado_por.unwrap_or_else(|| "Usuario".into()),
        foto_url: input.foto_url,
        objetivo_id: input.objetivo_id,
        usuario_id: Some(user_id),
        cargo_id: None,
        fecha_cargo: None,
    }
}

/// POST /api/transacciones
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateBody>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let session = require_session(&state, &headers).await?;

    let inputs = body.into_inputs();
    if inputs.is_empty() {
        return Err(ApiError::bad_request("Sin transacciones que registrar"));
    }
    for input in &inputs {
        if input.monto <= 0.0 {
            return Err(ApiError::bad_request("El monto debe ser mayor a 0"));
        }
        if input.categoria.trim().is_empty() {
            return Err(ApiError::bad_request("La categoría es requerida"));
        }
    }

    let now = Utc::now();
    let rows: Vec<NewTransaction> = inputs
        .into_iter()
        .map(|input| to_row(input, session.user_id, now))
        .collect();
    let created = state
        .store
        .insert_transactions(&rows, session.token())
        .await?;
    Ok((StatusCode::CREATED, Json(json!({"data": created}))))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
