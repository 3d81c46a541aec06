//! POST /api/import — restore a backup envelope.
//!
//! The payload is taken as loose JSON and sanitized field by field: a
//! backup may come from an older export, a different account, or a hand
//! edited file, so every row is rebuilt with defaults instead of being
//! trusted. Goals upsert on their id so a re-import never duplicates
//! them; transactions and recurring charges are plain inserts.

use std::collections::HashSet;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use lana_core::categories::IMPORT_FALLBACK_CATEGORY;
use lana_core::{
    clamp_charge_day, NewRecurringCharge, NewSavingsGoal, NewTransaction, PaymentMethod,
    TransactionKind, DEFAULT_GOAL_COLOR,
};
use serde_json::{json, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::server::AppState;
use crate::session::{require_session, SessionContext};

fn str_of(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(ToOwned::to_owned)
}

fn f64_of(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(Value::as_f64)
}

fn sanitize_goal(raw: &Value, user_id: Uuid, valid_ids: &mut HashSet<Uuid>) -> NewSavingsGoal {
    let id: Option<Uuid> = str_of(raw, "id").and_then(|s| s.parse().ok());
    if let Some(id) = id {
        let _ = valid_ids.insert(id);
    }
    NewSavingsGoal {
        id,
        nombre: str_of(raw, "nombre").unwrap_or_default(),
        meta: f64_of(raw, "meta"),
        descripcion: str_of(raw, "descripcion"),
        color: str_of(raw, "color").unwrap_or_else(|| DEFAULT_GOAL_COLOR.into()),
        icono: str_of(raw, "icono"),
        usuario_id: Some(user_id),
    }
}

fn sanitize_transaction(
    raw: &Value,
    session: &SessionContext,
    valid_goal_ids: &HashSet<Uuid>,
    now: DateTime<Utc>,
) -> NewTransaction {
    let fecha = str_of(raw, "fecha")
        .or_else(|| str_of(raw, "fecha_hora"))
        .and_then(|s| s.parse().ok())
        .unwrap_or(now);
    let tipo = match str_of(raw, "tipo").as_deref() {
        Some("ingreso") => TransactionKind::Ingreso,
        _ => TransactionKind::Gasto,
    };
    let metodo_pago = raw
        .get("metodo_pago")
        .and_then(|v| serde_json::from_value::<PaymentMethod>(v.clone()).ok())
        .unwrap_or_default();
    let objetivo_id = str_of(raw, "objetivo_id")
        .and_then(|s| s.parse().ok())
        .filter(|id| valid_goal_ids.contains(id));

    NewTransaction {
        tipo,
        monto: f64_of(raw, "monto").unwrap_or(0.0),
        categoria: str_of(raw, "categoria")
            .unwrap_or_else(|| IMPORT_FALLBACK_CATEGORY.into()),
        fecha: Some(fecha),
        fecha_hora: None,
        concepto: str_of(raw, "concepto"),
        descripcion: str_of(raw, "descripcion"),
        metodo_pago,
        registrado_por: str_of(raw, "registrado_por")
            .or_else(|| session.email.clone())
            .unwrap_or_else(|| "Importado".into()),
        foto_url: str_of(raw, "foto_url"),
        objetivo_id,
        usuario_id: Some(session.user_id),
        cargo_id: None,
        fecha_cargo: None,
    }
}

fn sanitize_charge(raw: &Value) -> NewRecurringCharge {
    let day = raw
        .get("dia_de_cobro")
        .or_else(|| raw.get("dia_cobro"))
        .and_then(Value::as_i64)
        .unwrap_or(1);
    NewRecurringCharge {
        nombre_app: str_of(raw, "nombre_app")
            .or_else(|| str_of(raw, "nombre"))
            .unwrap_or_else(|| "Recurrente".into()),
        dia_de_cobro: clamp_charge_day(day),
        monto: f64_of(raw, "monto").unwrap_or(0.0),
        activo: raw.get("activo").and_then(Value::as_bool).unwrap_or(true),
        cuenta: str_of(raw, "cuenta"),
    }
}

fn rows_of<'a>(data: &'a Value, key: &str) -> &'a [Value] {
    data.get(key).and_then(Value::as_array).map_or(&[], Vec::as_slice)
}

/// POST /api/import
#[instrument(skip_all)]
pub async fn import(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let session = require_session(&state, &headers).await?;

    let data = payload
        .get("data")
        .filter(|d| d.is_object())
        .ok_or_else(|| ApiError::bad_request("Formato de archivo inválido"))?;

    let mut summary = (0usize, 0usize, 0usize);
    let mut valid_goal_ids = HashSet::new();

    let goals: Vec<NewSavingsGoal> = rows_of(data, "objetivos")
        .iter()
        .map(|raw| sanitize_goal(raw, session.user_id, &mut valid_goal_ids))
        .collect();
    if !goals.is_empty() {
        let _ = state.store.upsert_goals(&goals, session.token()).await?;
        summary.1 = goals.len();
    }

    // A backup without goals can still link transactions to goals the
    // account already has.
    if valid_goal_ids.is_empty() {
        let existing = state
            .store
            .list_goals(session.user_id, session.token())
            .await?;
        valid_goal_ids.extend(existing.into_iter().map(|g| g.id));
    }

    let now = Utc::now();
    let transactions: Vec<NewTransaction> = rows_of(data, "transacciones")
        .iter()
        .map(|raw| sanitize_transaction(raw, &session, &valid_goal_ids, now))
        .collect();
    if !transactions.is_empty() {
        let _ = state
            .store
            .insert_transactions(&transactions, session.token())
            .await?;
        summary.0 = transactions.len();
    }

    let charges: Vec<NewRecurringCharge> = rows_of(data, "gastos_recurrentes")
        .iter()
        .map(sanitize_charge)
        .collect();
    if !charges.is_empty() {
        let _ = state
            .store
            .insert_recurring_charges(&charges, session.token())
            .await?;
        summary.2 = charges.len();
    }

    info!(
        transacciones = summary.0,
        objetivos = summary.1,
        gastos_recurrentes = summary.2,
        "import finished"
    );
    Ok(Json(json!({
        "success": true,
        "summary": {
            "transacciones": summary.0,
            "objetivos": summary.1,
            "gastos_recurrentes": summary.2
        }
    })))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::server::{router, test_support};

    const USER_ID: &str = "5a8d2f1e-3c4b-4a5d-9e6f-7a8b9c0d1e2f";
    const GOAL_ID: &str = "7f3a0c52-4d8e-4b1a-8d55-2f8c9b0a6e21";

    async fn mount_session(store: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"{{"id":"{USER_ID}","email":"mon@example.com"}}"#
            )))
            .mount(store)
            .await;
    }

    async fn post_import(store: &MockServer, payload: Value) -> (StatusCode, Value) {
        let app = router(test_support::state_for(&store.uri(), "http://llm.invalid"));
        let req = Request::builder()
            .method("POST")
            .uri("/api/import")
            .header(header::AUTHORIZATION, "Bearer tok")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 100_000).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    // ── Sanitizers ───────────────────────────────────────────────────────

    #[test]
    fn transaction_defaults_fill_gaps() {
        let session = SessionContext {
            user_id: USER_ID.parse().unwrap(),
            email: Some("mon@example.com".into()),
            access_token: "tok".into(),
        };
        let now = Utc::now();
        let row = sanitize_transaction(
            &json!({"monto": 120.0, "tipo": "gasto"}),
            &session,
            &HashSet::new(),
            now,
        );
        assert_eq!(row.categoria, "Otros");
        assert_eq!(row.metodo_pago, PaymentMethod::Efectivo);
        assert_eq!(row.registrado_por, "mon@example.com");
        assert_eq!(row.fecha, Some(now));
        assert_eq!(row.usuario_id, Some(session.user_id));
    }

    #[test]
    fn transaction_legacy_fecha_hora_is_honored() {
        let session = SessionContext {
            user_id: Uuid::nil(),
            email: None,
            access_token: "tok".into(),
        };
        let row = sanitize_transaction(
            &json!({"monto": 10.0, "fecha_hora": "2025-12-24T18:00:00Z"}),
            &session,
            &HashSet::new(),
            Utc::now(),
        );
        assert_eq!(row.fecha.unwrap().to_rfc3339(), "2025-12-24T18:00:00+00:00");
        assert_eq!(row.registrado_por, "Importado");
    }

    #[test]
    fn foreign_goal_links_are_dropped() {
        let session = SessionContext {
            user_id: Uuid::nil(),
            email: None,
            access_token: "tok".into(),
        };
        let known: HashSet<Uuid> = [GOAL_ID.parse().unwrap()].into();
        let kept = sanitize_transaction(
            &json!({"monto": 1.0, "objetivo_id": GOAL_ID}),
            &session,
            &known,
            Utc::now(),
        );
        assert!(kept.objetivo_id.is_some());
        let dropped = sanitize_transaction(
            &json!({"monto": 1.0, "objetivo_id": "99999999-8888-7777-6666-555555555555"}),
            &session,
            &known,
            Utc::now(),
        );
        assert!(dropped.objetivo_id.is_none());
    }

    #[test]
    fn charge_accepts_both_day_spellings() {
        assert_eq!(sanitize_charge(&json!({"dia_de_cobro": 12})).dia_de_cobro, 12);
        assert_eq!(sanitize_charge(&json!({"dia_cobro": 45})).dia_de_cobro, 31);
        let bare = sanitize_charge(&json!({}));
        assert_eq!(bare.nombre_app, "Recurrente");
        assert_eq!(bare.dia_de_cobro, 1);
        assert!(bare.activo);
    }

    // ── Endpoint ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn missing_data_is_400() {
        let store = MockServer::start().await;
        mount_session(&store).await;

        let (status, body) = post_import(&store, json!({"version": "1.0"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Formato de archivo inválido");
    }

    #[tokio::test]
    async fn full_envelope_restores_and_summarizes() {
        let store = MockServer::start().await;
        mount_session(&store).await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/objetivos_ahorro"))
            .and(query_param("on_conflict", "id"))
            .and(body_partial_json(json!([{
                "id": GOAL_ID,
                "nombre": "Vacaciones",
                "usuario_id": USER_ID
            }])))
            .respond_with(ResponseTemplate::new(201).set_body_string("[]"))
            .expect(1)
            .mount(&store)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/transacciones"))
            .and(body_partial_json(json!([{
                "monto": 100.0,
                "categoria": "Otros",
                "objetivo_id": GOAL_ID,
                "usuario_id": USER_ID
            }])))
            .respond_with(ResponseTemplate::new(201).set_body_string("[]"))
            .expect(1)
            .mount(&store)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/gastos_mensuales"))
            .and(body_partial_json(json!([{
                "nombre_app": "Netflix",
                "dia_de_cobro": 15
            }])))
            .respond_with(ResponseTemplate::new(201).set_body_string("[]"))
            .expect(1)
            .mount(&store)
            .await;

        let (status, body) = post_import(
            &store,
            json!({
                "data": {
                    "objetivos": [{"id": GOAL_ID, "nombre": "Vacaciones"}],
                    "transacciones": [{"monto": 100, "objetivo_id": GOAL_ID, "id": "should-be-dropped"}],
                    "gastos_recurrentes": [{"nombre": "Netflix", "dia_cobro": 15}]
                }
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["summary"]["transacciones"], 1);
        assert_eq!(body["summary"]["objetivos"], 1);
        assert_eq!(body["summary"]["gastos_recurrentes"], 1);
    }

    #[tokio::test]
    async fn goalless_backup_falls_back_to_existing_goals() {
        let store = MockServer::start().await;
        mount_session(&store).await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/objetivos_ahorro"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"[{{"id":"{GOAL_ID}","nombre":"Vacaciones"}}]"#
            )))
            .expect(1)
            .mount(&store)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/transacciones"))
            .and(body_partial_json(json!([{"objetivo_id": GOAL_ID}])))
            .respond_with(ResponseTemplate::new(201).set_body_string("[]"))
            .expect(1)
            .mount(&store)
            .await;

        let (status, body) = post_import(
            &store,
            json!({
                "data": {
                    "transacciones": [{"monto": 100, "objetivo_id": GOAL_ID}]
                }
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"]["objetivos"], 0);
        assert_eq!(body["summary"]["transacciones"], 1);
    }
}
