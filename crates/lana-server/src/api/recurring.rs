//! /api/gastos-recurrentes — household recurring charges plus the
//! materializer endpoint.
//!
//! These routes run without a session: charges are household-level rows
//! and the materializer is meant to be hit by a scheduler.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Datelike, Utc};
use lana_core::{
    clamp_charge_day, NewRecurringCharge, NewTransaction, PaymentMethod, RecurringCharge,
    RecurringChargeView, TransactionKind,
};
use lana_core::categories::RECURRING_CATEGORY;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::server::AppState;

const MISSING_ID: &str = "ID requerido";

fn views(rows: Vec<RecurringCharge>) -> Vec<RecurringChargeView> {
    rows.into_iter().map(RecurringChargeView::from).collect()
}

/// GET /api/gastos-recurrentes
#[instrument(skip_all)]
pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let rows = state.store.list_recurring_charges(None).await?;
    Ok(Json(json!({"data": views(rows)})))
}

/// A charge in the frontend shape.
#[derive(Debug, Deserialize)]
pub struct ChargeInput {
    /// App/vendor name.
    #[serde(default)]
    pub nombre: String,
    /// Day of month; clamped to 1–31.
    #[serde(default = "default_day")]
    pub dia_cobro: i64,
    /// Charge amount.
    #[serde(default)]
    pub monto: f64,
    /// Active flag; defaults true.
    #[serde(default)]
    pub activo: Option<bool>,
    /// Optional account label.
    #[serde(default)]
    pub cuenta: Option<String>,
}

fn default_day() -> i64 {
    1
}

/// POST /api/gastos-recurrentes
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<ChargeInput>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    if input.nombre.trim().is_empty() {
        return Err(ApiError::bad_request("El nombre es requerido"));
    }

    let charge = NewRecurringCharge {
        nombre_app: input.nombre,
        dia_de_cobro: clamp_charge_day(input.dia_cobro),
        monto: input.monto,
        activo: input.activo.unwrap_or(true),
        cuenta: input.cuenta,
    };
    let created = state.store.insert_recurring_charge(&charge, None).await?;
    Ok((StatusCode::CREATED, Json(json!({"data": views(created)}))))
}

/// PUT body: frontend shape plus the row id.
#[derive(Debug, Deserialize)]
pub struct ChargeUpdate {
    /// Row id.
    #[serde(default)]
    pub id: Option<Uuid>,
    /// App/vendor name.
    #[serde(default)]
    pub nombre: Option<String>,
    /// Day of month.
    #[serde(default)]
    pub dia_cobro: Option<i64>,
    /// Charge amount.
    #[serde(default)]
    pub monto: Option<f64>,
    /// Active flag.
    #[serde(default)]
    pub activo: Option<bool>,
    /// Optional account label.
    #[serde(default)]
    pub cuenta: Option<String>,
}

/// PUT /api/gastos-recurrentes
#[instrument(skip_all)]
pub async fn update(
    State(state): State<AppState>,
    Json(input): Json<ChargeUpdate>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = input.id.ok_or_else(|| ApiError::bad_request(MISSING_ID))?;

    let mut patch = serde_json::Map::new();
    if let Some(nombre) = input.nombre {
        let _ = patch.insert("nombre_app".into(), json!(nombre));
    }
    if let Some(day) = input.dia_cobro {
        let _ = patch.insert("dia_de_cobro".into(), json!(clamp_charge_day(day)));
    }
    if let Some(monto) = input.monto {
        let _ = patch.insert("monto".into(), json!(monto));
    }
    if let Some(activo) = input.activo {
        let _ = patch.insert("activo".into(), json!(activo));
    }
    if let Some(cuenta) = input.cuenta {
        let _ = patch.insert("cuenta".into(), json!(cuenta));
    }
    let _ = patch.insert("updated_at".into(), json!(Utc::now()));

    state
        .store
        .update_recurring_charge(id, &serde_json::Value::Object(patch), None)
        .await?;
    Ok(Json(json!({"success": true})))
}

/// DELETE query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteParams {
    /// Charge id.
    #[serde(default)]
    pub id: Option<Uuid>,
}

/// DELETE /api/gastos-recurrentes?id=
#[instrument(skip_all)]
pub async fn delete(
    State(state): State<AppState>,
    Query(params): Query<DeleteParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = params.id.ok_or_else(|| ApiError::bad_request(MISSING_ID))?;
    state.store.delete_recurring_charge(id, None).await?;
    Ok(Json(json!({"success": true})))
}

// ── Materializer ─────────────────────────────────────────────────────────────

/// GET /api/gastos-recurrentes/procesar — scheduler probe.
pub async fn process_probe() -> Json<serde_json::Value> {
    Json(json!({"status": "ready"}))
}

fn materialized_row(charge: &RecurringCharge, now: chrono::DateTime<Utc>) -> NewTransaction {
    NewTransaction {
        tipo: TransactionKind::Gasto,
        monto: charge.monto,
        categoria: RECURRING_CATEGORY.into(),
        fecha: Some(now),
        fecha_hora: None,
        concepto: Some(format!("{} (Recurrente)", charge.nombre_app)),
        descripcion: Some(format!("Gasto recurrente automático: {}", charge.nombre_app)),
        metodo_pago: PaymentMethod::Tarjeta,
        registrado_por: "Sistema Automático".into(),
        foto_url: None,
        objetivo_id: None,
        usuario_id: None,
        cargo_id: Some(charge.id),
        fecha_cargo: Some(now.date_naive()),
    }
}

/// POST /api/gastos-recurrentes/procesar
///
/// Materialize every active charge due today into a transaction. Each row
/// carries its source `cargo_id` and `fecha_cargo`, and the insert ignores
/// duplicates on that pair, so re-running the endpoint the same day
/// creates nothing.
#[instrument(skip_all)]
pub async fn process(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let now = Utc::now();
    let day = u8::try_from(now.day()).unwrap_or(31);
    let due = state.store.list_due_recurring_charges(day, None).await?;
    if due.is_empty() {
        return Ok(Json(json!({
            "message": "No hay gastos recurrentes para procesar hoy",
            "procesados": 0
        })));
    }

    let rows: Vec<NewTransaction> = due.iter().map(|c| materialized_row(c, now)).collect();
    let created = state.store.insert_materialized_charges(&rows, None).await?;

    // Only newly created rows come back; map them to their source charges.
    let names: Vec<&str> = due
        .iter()
        .filter(|charge| {
            let concepto = format!("{} (Recurrente)", charge.nombre_app);
            created.iter().any(|t| t.concepto.as_deref() == Some(concepto.as_str()))
        })
        .map(|charge| charge.nombre_app.as_str())
        .collect();
    info!(procesados = created.len(), "recurring charges materialized");

    Ok(Json(json!({
        "success": true,
        "message": format!("Procesados {} gastos recurrentes", created.len()),
        "procesados": created.len(),
        "gastos": names,
        "transacciones": created
    })))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
