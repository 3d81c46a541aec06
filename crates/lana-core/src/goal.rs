//! Savings goal rows (`objetivos_ahorro`).
//!
//! A goal's balance is derived, never stored: the sum of linked aportes
//! (tipo `gasto`) minus linked retiros (tipo `ingreso`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default display color for new goals.
pub const DEFAULT_GOAL_COLOR: &str = "#0ea5e9";

/// A persisted savings goal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SavingsGoal {
    /// Row id (store-assigned).
    pub id: Uuid,
    /// Goal name.
    pub nombre: String,
    /// Optional target amount.
    #[serde(default)]
    pub meta: Option<f64>,
    /// Optional description.
    #[serde(default)]
    pub descripcion: Option<String>,
    /// Display color (hex).
    #[serde(default)]
    pub color: Option<String>,
    /// Optional icon name.
    #[serde(default)]
    pub icono: Option<String>,
    /// Owning user.
    #[serde(default)]
    pub usuario_id: Option<Uuid>,
    /// Row creation time (store-assigned).
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A savings goal to insert or upsert.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NewSavingsGoal {
    /// Existing id when upserting (import path); omitted for plain inserts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    /// Goal name.
    pub nombre: String,
    /// Optional target amount.
    pub meta: Option<f64>,
    /// Optional description.
    pub descripcion: Option<String>,
    /// Display color (hex), defaults to [`DEFAULT_GOAL_COLOR`].
    pub color: String,
    /// Optional icon name.
    pub icono: Option<String>,
    /// Owning user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usuario_id: Option<Uuid>,
}

impl NewSavingsGoal {
    /// Create a goal with the default color and nothing else set.
    #[must_use]
    pub fn named(nombre: impl Into<String>) -> Self {
        Self {
            nombre: nombre.into(),
            color: DEFAULT_GOAL_COLOR.into(),
            ..Self::default()
        }
    }
}
