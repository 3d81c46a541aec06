//! Recurring charge rows (`gastos_mensuales`) and the frontend shape.
//!
//! The database row uses `nombre_app`/`dia_de_cobro`; the HTTP surface
//! exposes `nombre`/`dia_cobro` plus constant category/method columns the
//! UI expects. [`RecurringChargeView`] is that mapping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Clamp a day-of-month trigger into `1..=31`.
#[must_use]
pub fn clamp_charge_day(day: i64) -> u8 {
    day.clamp(1, 31) as u8
}

/// A persisted recurring charge.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecurringCharge {
    /// Row id (store-assigned).
    pub id: Uuid,
    /// App/vendor name.
    pub nombre_app: String,
    /// Day of month the charge fires (1–31).
    pub dia_de_cobro: u8,
    /// Charge amount in MXN.
    pub monto: f64,
    /// Whether the charge is processed by the materializer.
    pub activo: bool,
    /// Optional account label.
    #[serde(default)]
    pub cuenta: Option<String>,
    /// Row creation time (store-assigned).
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A recurring charge to insert.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NewRecurringCharge {
    /// App/vendor name.
    pub nombre_app: String,
    /// Day of month the charge fires (clamped to 1–31).
    pub dia_de_cobro: u8,
    /// Charge amount in MXN.
    pub monto: f64,
    /// Whether the charge is active (defaults true).
    pub activo: bool,
    /// Optional account label.
    pub cuenta: Option<String>,
}

/// The shape the frontend consumes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecurringChargeView {
    /// Row id.
    pub id: Uuid,
    /// App/vendor name (db `nombre_app`).
    pub nombre: String,
    /// Day of month (db `dia_de_cobro`).
    pub dia_cobro: u8,
    /// Charge amount.
    pub monto: f64,
    /// Active flag.
    pub activo: bool,
    /// Always `"Suscripciones"`.
    pub categoria: String,
    /// Always `"Tarjeta"`.
    pub metodo_pago: String,
    /// Optional account label.
    pub cuenta: Option<String>,
    /// Not tracked in the db; always null.
    pub ultima_ejecucion: Option<DateTime<Utc>>,
    /// Row creation time.
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<RecurringCharge> for RecurringChargeView {
    fn from(row: RecurringCharge) -> Self {
        Self {
            id: row.id,
            nombre: row.nombre_app,
            dia_cobro: row.dia_de_cobro,
            monto: row.monto,
            activo: row.activo,
            categoria: crate::categories::RECURRING_CATEGORY.into(),
            metodo_pago: "Tarjeta".into(),
            cuenta: row.cuenta,
            ultima_ejecucion: None,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
